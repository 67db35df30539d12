// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use plexus_config::model::StorageConfig;
use plexus_core::types::{
    Comment, Connection, ConnectionStatus, ContentItem, ContentKind, DirectMessage, FeedQuery,
    Mention, Notification, NotificationType, Page, ReadReceipt, SubjectType, User, now_timestamp,
};
use plexus_core::{AdapterType, HealthStatus, PlexusError, PluginAdapter, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: StorageAdapter::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, PlexusError> {
        self.db.get().ok_or_else(|| PlexusError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PlexusError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PlexusError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), PlexusError> {
        let path = self.config.database_path.clone();
        let db = Database::open_with_options(&path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| PlexusError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), PlexusError> {
        self.db()?.close().await
    }

    // --- Users ---

    async fn insert_user(&self, user: &User) -> Result<(), PlexusError> {
        queries::users::insert_user(self.db()?, user).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, PlexusError> {
        queries::users::get_user(self.db()?, id).await
    }

    async fn find_verified_users_matching(&self, token: &str) -> Result<Vec<User>, PlexusError> {
        queries::users::find_verified_users_matching(self.db()?, token).await
    }

    async fn list_verified_user_ids_except(
        &self,
        exclude_id: &str,
    ) -> Result<Vec<String>, PlexusError> {
        queries::users::list_verified_user_ids_except(self.db()?, exclude_id).await
    }

    // --- Connections ---

    async fn insert_connection(&self, connection: &Connection) -> Result<(), PlexusError> {
        queries::connections::insert_connection(self.db()?, connection).await
    }

    async fn get_connection(&self, id: &str) -> Result<Option<Connection>, PlexusError> {
        queries::connections::get_connection(self.db()?, id).await
    }

    async fn find_connection_between(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<Connection>, PlexusError> {
        queries::connections::find_connection_between(self.db()?, a, b).await
    }

    async fn count_connections_between(&self, a: &str, b: &str) -> Result<i64, PlexusError> {
        queries::connections::count_connections_between(self.db()?, a, b).await
    }

    async fn transition_connection(
        &self,
        id: &str,
        from: ConnectionStatus,
        to: ConnectionStatus,
    ) -> Result<bool, PlexusError> {
        queries::connections::transition_connection(self.db()?, id, from, to, &now_timestamp())
            .await
    }

    async fn accepted_peer_ids(&self, user_id: &str) -> Result<Vec<String>, PlexusError> {
        queries::connections::accepted_peer_ids(self.db()?, user_id).await
    }

    async fn pending_incoming(&self, user_id: &str) -> Result<Vec<Connection>, PlexusError> {
        queries::connections::pending_incoming(self.db()?, user_id).await
    }

    // --- Content ---

    async fn insert_content(&self, item: &ContentItem) -> Result<(), PlexusError> {
        queries::content::insert_content(self.db()?, item).await
    }

    async fn get_content(&self, id: &str) -> Result<Option<ContentItem>, PlexusError> {
        queries::content::get_content(self.db()?, id).await
    }

    async fn update_content_body(
        &self,
        id: &str,
        body: &str,
        updated_at: &str,
    ) -> Result<(), PlexusError> {
        queries::content::update_content_body(self.db()?, id, body, updated_at).await
    }

    async fn publish_content(&self, id: &str, published_at: &str) -> Result<bool, PlexusError> {
        queries::content::publish_content(self.db()?, id, published_at).await
    }

    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<ContentItem>, PlexusError> {
        queries::content::list_feed(self.db()?, query).await
    }

    // --- Comments ---

    async fn insert_comment(&self, comment: &Comment) -> Result<(), PlexusError> {
        queries::engagement::insert_comment(self.db()?, comment).await
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>, PlexusError> {
        queries::engagement::get_comment(self.db()?, id).await
    }

    // --- Likes ---

    async fn insert_like(
        &self,
        content_id: &str,
        user_id: &str,
        created_at: &str,
    ) -> Result<(), PlexusError> {
        queries::engagement::insert_like(self.db()?, content_id, user_id, created_at).await
    }

    async fn delete_like(&self, content_id: &str, user_id: &str) -> Result<bool, PlexusError> {
        queries::engagement::delete_like(self.db()?, content_id, user_id).await
    }

    async fn count_likes(&self, content_id: &str) -> Result<i64, PlexusError> {
        queries::engagement::count_likes(self.db()?, content_id).await
    }

    // --- Mentions ---

    async fn insert_mention(&self, mention: &Mention) -> Result<(), PlexusError> {
        queries::engagement::insert_mention(self.db()?, mention, &now_timestamp()).await
    }

    async fn delete_mentions(&self, content_id: &str) -> Result<usize, PlexusError> {
        queries::engagement::delete_mentions(self.db()?, content_id).await
    }

    async fn list_mentions(&self, content_id: &str) -> Result<Vec<Mention>, PlexusError> {
        queries::engagement::list_mentions(self.db()?, content_id).await
    }

    // --- Direct messages ---

    async fn insert_direct_message(&self, message: &DirectMessage) -> Result<(), PlexusError> {
        queries::engagement::insert_direct_message(self.db()?, message).await
    }

    // --- Notifications ---

    async fn insert_notification(&self, notification: &Notification) -> Result<(), PlexusError> {
        queries::notifications::insert_notification(self.db()?, notification).await
    }

    async fn insert_notifications(&self, batch: &[Notification]) -> Result<(), PlexusError> {
        queries::notifications::insert_notifications(self.db()?, batch).await
    }

    async fn notification_exists(
        &self,
        recipient_id: &str,
        triggered_by: Option<&str>,
        kind: NotificationType,
        related_id: Option<&str>,
    ) -> Result<bool, PlexusError> {
        queries::notifications::notification_exists(
            self.db()?,
            recipient_id,
            triggered_by,
            kind,
            related_id,
        )
        .await
    }

    async fn get_notification(&self, id: &str) -> Result<Option<Notification>, PlexusError> {
        queries::notifications::get_notification(self.db()?, id).await
    }

    async fn list_notifications(
        &self,
        recipient_id: &str,
        unread_only: bool,
        page: Page,
    ) -> Result<Vec<Notification>, PlexusError> {
        queries::notifications::list_notifications(self.db()?, recipient_id, unread_only, page)
            .await
    }

    async fn mark_notification_read(&self, id: &str) -> Result<bool, PlexusError> {
        queries::notifications::mark_notification_read(self.db()?, id).await
    }

    async fn mark_all_notifications_read(&self, recipient_id: &str) -> Result<usize, PlexusError> {
        queries::notifications::mark_all_notifications_read(self.db()?, recipient_id).await
    }

    async fn count_unread_notifications(&self, recipient_id: &str) -> Result<i64, PlexusError> {
        queries::notifications::count_unread_notifications(self.db()?, recipient_id).await
    }

    // --- Read receipts ---

    async fn insert_read_receipt(&self, receipt: &ReadReceipt) -> Result<(), PlexusError> {
        queries::receipts::insert_read_receipt(self.db()?, receipt).await
    }

    async fn read_receipt_exists(
        &self,
        subject_id: &str,
        subject_type: SubjectType,
        user_id: &str,
    ) -> Result<bool, PlexusError> {
        queries::receipts::read_receipt_exists(self.db()?, subject_id, subject_type, user_id).await
    }

    async fn count_read_receipts(
        &self,
        subject_id: &str,
        subject_type: SubjectType,
    ) -> Result<i64, PlexusError> {
        queries::receipts::count_read_receipts(self.db()?, subject_id, subject_type).await
    }

    async fn count_unread_broadcasts(
        &self,
        user_id: &str,
        kind: ContentKind,
        since: &str,
    ) -> Result<i64, PlexusError> {
        queries::receipts::count_unread_broadcasts(self.db()?, user_id, kind, since).await
    }
}
