// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persist-then-push notification dispatch.
//!
//! Every notification is written to the store before any push is attempted.
//! Pushes go through the injected [`ChannelPublisher`]; their failures are
//! logged, counted, and discarded.

use std::sync::Arc;

use plexus_core::traits::channel::NOTIFICATION_EVENT;
use plexus_core::types::{Notification, NotificationDraft, NotificationType, now_timestamp};
use plexus_core::{BestEffort, ChannelPublisher, PlexusError, StorageAdapter};
use serde_json::json;
use tracing::{debug, warn};

use crate::recording;

/// Creates notifications and fans them out to live sessions.
pub struct NotificationDispatcher {
    storage: Arc<dyn StorageAdapter>,
    publisher: Arc<dyn ChannelPublisher>,
    realtime_enabled: bool,
}

impl NotificationDispatcher {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        publisher: Arc<dyn ChannelPublisher>,
        realtime_enabled: bool,
    ) -> Self {
        Self {
            storage,
            publisher,
            realtime_enabled,
        }
    }

    /// Notify one recipient.
    ///
    /// Returns `None` when nothing was written: the recipient triggered the
    /// event themselves, or an identical LIKE notification already exists.
    pub async fn notify(
        &self,
        recipient_id: &str,
        draft: &NotificationDraft,
    ) -> Result<Option<Notification>, PlexusError> {
        if draft.triggered_by.as_deref() == Some(recipient_id) {
            return Ok(None);
        }

        if draft.kind == NotificationType::Like
            && self
                .storage
                .notification_exists(
                    recipient_id,
                    draft.triggered_by.as_deref(),
                    NotificationType::Like,
                    draft.related_id.as_deref(),
                )
                .await?
        {
            debug!(recipient_id, related_id = ?draft.related_id, "duplicate like notification skipped");
            recording::record_deduped(draft.kind);
            return Ok(None);
        }

        let notification = draft.addressed_to(recipient_id, &now_timestamp());
        match self.storage.insert_notification(&notification).await {
            Ok(()) => {}
            // A concurrent like got past the existence check first.
            Err(PlexusError::AlreadyExists { .. }) if draft.kind == NotificationType::Like => {
                debug!(recipient_id, related_id = ?draft.related_id, "concurrent like notification absorbed");
                recording::record_deduped(draft.kind);
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
        recording::record_created(notification.kind, 1);

        self.push(&notification).await;
        Ok(Some(notification))
    }

    /// Notify many recipients with one atomic insert.
    ///
    /// No dedup or self-filtering is applied; callers exclude the author.
    /// Returns the number of rows written.
    pub async fn notify_bulk(
        &self,
        recipient_ids: &[String],
        draft: &NotificationDraft,
    ) -> Result<usize, PlexusError> {
        if recipient_ids.is_empty() {
            return Ok(0);
        }

        let created_at = now_timestamp();
        let batch: Vec<Notification> = recipient_ids
            .iter()
            .map(|recipient| draft.addressed_to(recipient, &created_at))
            .collect();
        self.storage.insert_notifications(&batch).await?;
        recording::record_created(draft.kind, batch.len());
        debug!(kind = %draft.kind, recipients = batch.len(), "bulk notifications persisted");

        for notification in &batch {
            self.push(notification).await;
        }
        Ok(batch.len())
    }

    /// Display name used in notification messages, `"Someone"` if the actor
    /// cannot be looked up.
    pub async fn actor_name(&self, user_id: &str) -> String {
        self.storage
            .get_user(user_id)
            .await
            .best_effort("look up notification actor")
            .flatten()
            .map(|user| user.display_name)
            .unwrap_or_else(|| "Someone".to_string())
    }

    async fn push(&self, notification: &Notification) {
        if !self.realtime_enabled {
            return;
        }
        let payload = notification_payload(notification);
        match self
            .publisher
            .publish(&notification.recipient_id, NOTIFICATION_EVENT, payload)
            .await
        {
            Ok(()) => recording::record_pushed(),
            Err(e) => {
                recording::record_push_failure();
                warn!(
                    error = %e,
                    user_id = %notification.recipient_id,
                    notification_id = %notification.id,
                    "real-time push failed"
                );
            }
        }
    }
}

/// The `data` half of the pushed event envelope.
pub fn notification_payload(notification: &Notification) -> serde_json::Value {
    json!({
        "id": notification.id,
        "type": notification.kind,
        "message": notification.message,
        "relatedId": notification.related_id,
        "relatedType": notification.related_type,
        "createdAt": notification.created_at,
        "triggeredBy": notification.triggered_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::storage_with_users;
    use plexus_test_utils::RecordingPublisher;
    use plexus_core::types::{Page, RelatedType};
    use tracing_test::traced_test;

    fn like(actor: &str, post: &str) -> NotificationDraft {
        NotificationDraft::new(NotificationType::Like, format!("{actor} liked your post"))
            .triggered_by(actor)
            .related(post, RelatedType::Post)
    }

    async fn setup(
        failing: Option<&str>,
        realtime: bool,
    ) -> (NotificationDispatcher, Arc<dyn StorageAdapter>, Arc<RecordingPublisher>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_with_users(&dir, &["owner", "fan", "u1", "u2", "u3"]).await;
        let publisher = Arc::new(RecordingPublisher::new());
        if let Some(user_id) = failing {
            publisher.fail_for(user_id).await;
        }
        let dispatcher = NotificationDispatcher::new(storage.clone(), publisher.clone(), realtime);
        (dispatcher, storage, publisher, dir)
    }

    #[tokio::test]
    async fn self_notification_is_a_noop() {
        let (dispatcher, storage, publisher, _dir) = setup(None, true).await;
        let result = dispatcher.notify("fan", &like("fan", "p1")).await.unwrap();
        assert!(result.is_none());
        assert_eq!(storage.count_unread_notifications("fan").await.unwrap(), 0);
        assert_eq!(publisher.attempts_for("fan").await, 0);
    }

    #[tokio::test]
    async fn like_is_deduped_but_comment_is_not() {
        let (dispatcher, storage, _publisher, _dir) = setup(None, true).await;

        assert!(dispatcher.notify("owner", &like("fan", "p1")).await.unwrap().is_some());
        assert!(dispatcher.notify("owner", &like("fan", "p1")).await.unwrap().is_none());
        assert!(dispatcher.notify("owner", &like("fan", "p2")).await.unwrap().is_some());

        let comment = NotificationDraft::new(NotificationType::Comment, "fan commented")
            .triggered_by("fan")
            .related("p1", RelatedType::Post);
        dispatcher.notify("owner", &comment).await.unwrap();
        dispatcher.notify("owner", &comment).await.unwrap();

        assert_eq!(storage.count_unread_notifications("owner").await.unwrap(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_likes_write_one_notification() {
        let (dispatcher, storage, publisher, _dir) = setup(None, true).await;
        let dispatcher = Arc::new(dispatcher);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { dispatcher.notify("owner", &like("fan", "p1")).await })
            })
            .collect();
        let mut written = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                written += 1;
            }
        }

        assert_eq!(written, 1);
        let rows = storage
            .list_notifications("owner", false, Page::first(20))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(publisher.attempts_for("owner").await, 1);
    }

    #[tokio::test]
    async fn push_carries_the_notification_payload() {
        let (dispatcher, _storage, publisher, _dir) = setup(None, true).await;
        let created = dispatcher
            .notify("owner", &like("fan", "p1"))
            .await
            .unwrap()
            .unwrap();

        let pushes = publisher.pushes().await;
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].user_id, "owner");
        assert_eq!(pushes[0].event, NOTIFICATION_EVENT);
        let payload = &pushes[0].payload;
        assert_eq!(payload["id"], created.id);
        assert_eq!(payload["type"], "LIKE");
        assert_eq!(payload["relatedId"], "p1");
        assert_eq!(payload["relatedType"], "POST");
        assert_eq!(payload["triggeredBy"], "fan");
        assert_eq!(payload["createdAt"], created.created_at);
    }

    #[tokio::test]
    async fn actor_name_falls_back_for_unknown_users() {
        let (dispatcher, _storage, _publisher, _dir) = setup(None, true).await;
        assert_eq!(dispatcher.actor_name("fan").await, "fan");
        assert_eq!(dispatcher.actor_name("ghost").await, "Someone");
    }

    #[tokio::test]
    async fn bulk_with_no_recipients_writes_nothing() {
        let (dispatcher, storage, publisher, _dir) = setup(None, true).await;
        let draft = NotificationDraft::new(NotificationType::Announcement, "New announcement");
        assert_eq!(dispatcher.notify_bulk(&[], &draft).await.unwrap(), 0);
        assert_eq!(storage.count_unread_notifications("u1").await.unwrap(), 0);
        assert!(publisher.pushes().await.is_empty());
    }

    #[traced_test]
    #[tokio::test]
    async fn bulk_push_failure_does_not_stop_others() {
        let (dispatcher, storage, publisher, _dir) =
            setup(Some("u2"), true).await;
        let draft = NotificationDraft::new(NotificationType::Event, "New event")
            .triggered_by("owner")
            .related("e1", RelatedType::Event);
        let recipients: Vec<String> = ["u1", "u2", "u3"].iter().map(|s| s.to_string()).collect();

        assert_eq!(dispatcher.notify_bulk(&recipients, &draft).await.unwrap(), 3);
        for user in ["u1", "u2", "u3"] {
            assert_eq!(storage.count_unread_notifications(user).await.unwrap(), 1);
            assert_eq!(publisher.attempts_for(user).await, 1);
        }
        assert!(logs_contain("real-time push failed"));
    }

    #[tokio::test]
    async fn disabled_realtime_still_persists() {
        let (dispatcher, storage, publisher, _dir) = setup(None, false).await;
        dispatcher.notify("owner", &like("fan", "p1")).await.unwrap();
        let inbox = storage
            .list_notifications("owner", false, Page::first(10))
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert!(publisher.pushes().await.is_empty());
    }
}
