// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A recipient's view of their own notifications.

use std::sync::Arc;

use plexus_core::types::{Notification, Page};
use plexus_core::{PlexusError, StorageAdapter};

/// Lists and flips read state on notifications.
pub struct NotificationInbox {
    storage: Arc<dyn StorageAdapter>,
}

impl NotificationInbox {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Newest first.
    pub async fn list(
        &self,
        recipient_id: &str,
        unread_only: bool,
        page: Page,
    ) -> Result<Vec<Notification>, PlexusError> {
        self.storage
            .list_notifications(recipient_id, unread_only, page)
            .await
    }

    /// Mark one notification read on behalf of `acting_user_id`.
    ///
    /// Only the recipient may flip it. Marking an already-read notification
    /// succeeds.
    pub async fn mark_read(
        &self,
        notification_id: &str,
        acting_user_id: &str,
    ) -> Result<(), PlexusError> {
        let notification = self
            .storage
            .get_notification(notification_id)
            .await?
            .ok_or_else(|| PlexusError::not_found("notification", notification_id))?;
        if notification.recipient_id != acting_user_id {
            return Err(PlexusError::Authorization(
                "notification belongs to another user".to_string(),
            ));
        }
        if !notification.read {
            self.storage.mark_notification_read(notification_id).await?;
        }
        Ok(())
    }

    /// Returns how many notifications were flipped.
    pub async fn mark_all_read(&self, recipient_id: &str) -> Result<usize, PlexusError> {
        self.storage.mark_all_notifications_read(recipient_id).await
    }

    pub async fn unread_count(&self, recipient_id: &str) -> Result<i64, PlexusError> {
        self.storage.count_unread_notifications(recipient_id).await
    }
}
