// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::PlexusError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Comment, Connection, ConnectionStatus, ContentItem, ContentKind, DirectMessage, FeedQuery,
    Mention, Notification, NotificationType, Page, ReadReceipt, SubjectType, User,
};

/// Adapter for the structured persistent store.
///
/// Inserts into uniqueness-constrained tables return
/// [`PlexusError::AlreadyExists`] on a constraint violation; callers decide
/// whether that is benign.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), PlexusError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), PlexusError>;

    // --- Users ---

    async fn insert_user(&self, user: &User) -> Result<(), PlexusError>;

    async fn get_user(&self, id: &str) -> Result<Option<User>, PlexusError>;

    /// Verified users whose display name, email, or institution id contains
    /// `token`, case-insensitively.
    async fn find_verified_users_matching(&self, token: &str) -> Result<Vec<User>, PlexusError>;

    /// Ids of all verified users except `exclude_id`.
    async fn list_verified_user_ids_except(
        &self,
        exclude_id: &str,
    ) -> Result<Vec<String>, PlexusError>;

    // --- Connections ---

    async fn insert_connection(&self, connection: &Connection) -> Result<(), PlexusError>;

    async fn get_connection(&self, id: &str) -> Result<Option<Connection>, PlexusError>;

    /// The connection record for the unordered pair `{a, b}`, if any.
    async fn find_connection_between(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<Connection>, PlexusError>;

    /// Number of records for the unordered pair `{a, b}`.
    async fn count_connections_between(&self, a: &str, b: &str) -> Result<i64, PlexusError>;

    /// Move a connection from `from` to `to`. Returns false when the record
    /// was not in state `from` (already processed by someone else).
    async fn transition_connection(
        &self,
        id: &str,
        from: ConnectionStatus,
        to: ConnectionStatus,
    ) -> Result<bool, PlexusError>;

    /// The other party of every ACCEPTED record involving `user_id`.
    async fn accepted_peer_ids(&self, user_id: &str) -> Result<Vec<String>, PlexusError>;

    /// PENDING records addressed to `user_id`, newest first.
    async fn pending_incoming(&self, user_id: &str) -> Result<Vec<Connection>, PlexusError>;

    // --- Content ---

    async fn insert_content(&self, item: &ContentItem) -> Result<(), PlexusError>;

    async fn get_content(&self, id: &str) -> Result<Option<ContentItem>, PlexusError>;

    async fn update_content_body(
        &self,
        id: &str,
        body: &str,
        updated_at: &str,
    ) -> Result<(), PlexusError>;

    /// Mark an unpublished item as published. Returns false if it already was.
    async fn publish_content(&self, id: &str, published_at: &str) -> Result<bool, PlexusError>;

    /// Posts admitted by the feed predicate, newest first.
    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<ContentItem>, PlexusError>;

    // --- Comments ---

    async fn insert_comment(&self, comment: &Comment) -> Result<(), PlexusError>;

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>, PlexusError>;

    // --- Likes ---

    async fn insert_like(
        &self,
        content_id: &str,
        user_id: &str,
        created_at: &str,
    ) -> Result<(), PlexusError>;

    /// Returns false if there was no like to remove.
    async fn delete_like(&self, content_id: &str, user_id: &str) -> Result<bool, PlexusError>;

    async fn count_likes(&self, content_id: &str) -> Result<i64, PlexusError>;

    // --- Mentions ---

    async fn insert_mention(&self, mention: &Mention) -> Result<(), PlexusError>;

    /// Delete every mention of `content_id`; returns how many were removed.
    async fn delete_mentions(&self, content_id: &str) -> Result<usize, PlexusError>;

    async fn list_mentions(&self, content_id: &str) -> Result<Vec<Mention>, PlexusError>;

    // --- Direct messages ---

    async fn insert_direct_message(&self, message: &DirectMessage) -> Result<(), PlexusError>;

    // --- Notifications ---

    async fn insert_notification(&self, notification: &Notification) -> Result<(), PlexusError>;

    /// Insert all rows atomically in one transaction.
    async fn insert_notifications(&self, batch: &[Notification]) -> Result<(), PlexusError>;

    /// Whether a row matching `(recipient, triggered_by, kind, related_id)` exists.
    async fn notification_exists(
        &self,
        recipient_id: &str,
        triggered_by: Option<&str>,
        kind: NotificationType,
        related_id: Option<&str>,
    ) -> Result<bool, PlexusError>;

    async fn get_notification(&self, id: &str) -> Result<Option<Notification>, PlexusError>;

    /// Notifications for `recipient_id`, newest first.
    async fn list_notifications(
        &self,
        recipient_id: &str,
        unread_only: bool,
        page: Page,
    ) -> Result<Vec<Notification>, PlexusError>;

    async fn mark_notification_read(&self, id: &str) -> Result<bool, PlexusError>;

    async fn mark_all_notifications_read(&self, recipient_id: &str) -> Result<usize, PlexusError>;

    async fn count_unread_notifications(&self, recipient_id: &str) -> Result<i64, PlexusError>;

    // --- Read receipts ---

    async fn insert_read_receipt(&self, receipt: &ReadReceipt) -> Result<(), PlexusError>;

    async fn read_receipt_exists(
        &self,
        subject_id: &str,
        subject_type: SubjectType,
        user_id: &str,
    ) -> Result<bool, PlexusError>;

    async fn count_read_receipts(
        &self,
        subject_id: &str,
        subject_type: SubjectType,
    ) -> Result<i64, PlexusError>;

    /// Published items of `kind` created at or after `since` with no read
    /// receipt for `user_id`.
    async fn count_unread_broadcasts(
        &self,
        user_id: &str,
        kind: ContentKind,
        since: &str,
    ) -> Result<i64, PlexusError>;
}
