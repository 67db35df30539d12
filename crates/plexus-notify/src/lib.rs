// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification dispatch and inbox for the Plexus engine.
//!
//! The [`NotificationDispatcher`] persists notification rows and then pushes
//! them through an injected [`ChannelPublisher`](plexus_core::ChannelPublisher).
//! The [`NotificationInbox`] serves recipients their own notifications.

pub mod dispatcher;
pub mod inbox;
pub mod recording;

pub use dispatcher::{NotificationDispatcher, notification_payload};
pub use inbox::NotificationInbox;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use plexus_config::model::StorageConfig;
    use plexus_core::types::{Role, User};
    use plexus_core::StorageAdapter;
    use plexus_storage::SqliteStorage;

    pub async fn storage_with_users(
        dir: &tempfile::TempDir,
        ids: &[&str],
    ) -> Arc<dyn StorageAdapter> {
        let storage = SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("notify.db").to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();
        for id in ids {
            storage
                .insert_user(&User {
                    id: id.to_string(),
                    display_name: id.to_string(),
                    email: format!("{id}@campus.example"),
                    institution_id: None,
                    role: Role::Member,
                    verified: true,
                    created_at: "2026-01-01T00:00:00.000Z".to_string(),
                })
                .await
                .unwrap();
        }
        Arc::new(storage)
    }
}
