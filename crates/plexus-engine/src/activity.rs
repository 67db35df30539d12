// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content activity: the operations that drive visibility checks, mention
//! resolution, and notification dispatch.
//!
//! Notification and mention side effects run through [`BestEffort`] and never
//! fail or roll back the primary write.

use std::sync::Arc;

use plexus_config::model::{ContentConfig, FeedConfig};
use plexus_core::types::{
    Comment, ContentItem, ContentKind, DirectMessage, NotificationDraft, NotificationType, Page,
    Principal, RelatedType, Visibility, new_id, now_timestamp,
};
use plexus_core::{BestEffort, PlexusError, StorageAdapter};
use plexus_graph::{ConnectionService, MentionResolver, MentionSource, VisibilityResolver};
use plexus_notify::NotificationDispatcher;
use tracing::{debug, info};

const EXCERPT_CHARS: usize = 80;

/// Posts, comments, likes, broadcasts, and direct messages.
pub struct ActivityService {
    storage: Arc<dyn StorageAdapter>,
    dispatcher: Arc<NotificationDispatcher>,
    connections: Arc<ConnectionService>,
    visibility: Arc<VisibilityResolver>,
    mentions: Arc<MentionResolver>,
    content: ContentConfig,
    feed: FeedConfig,
}

impl ActivityService {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        dispatcher: Arc<NotificationDispatcher>,
        connections: Arc<ConnectionService>,
        visibility: Arc<VisibilityResolver>,
        mentions: Arc<MentionResolver>,
        content: ContentConfig,
        feed: FeedConfig,
    ) -> Self {
        Self {
            storage,
            dispatcher,
            connections,
            visibility,
            mentions,
            content,
            feed,
        }
    }

    // --- Posts ---

    pub async fn create_post(
        &self,
        principal: &Principal,
        body: &str,
        visibility: Visibility,
        mention_ids: &[String],
    ) -> Result<ContentItem, PlexusError> {
        self.validate_body(body)?;
        let now = now_timestamp();
        let item = ContentItem {
            id: new_id(),
            owner_id: principal.user_id.clone(),
            kind: ContentKind::Post,
            visibility,
            body: body.to_string(),
            published: true,
            created_at: now.clone(),
            updated_at: now,
        };
        self.storage.insert_content(&item).await?;
        info!(post_id = %item.id, owner_id = %item.owner_id, visibility = %visibility, "post created");

        self.mentions
            .resolve(MentionSource {
                content_id: &item.id,
                related_type: RelatedType::Post,
                text: &item.body,
                explicit_ids: mention_ids,
                author_id: &item.owner_id,
            })
            .await
            .best_effort("resolve post mentions");
        Ok(item)
    }

    /// Replace a post's body. Mentions are regenerated only when the text changes.
    pub async fn edit_post(
        &self,
        principal: &Principal,
        post_id: &str,
        body: &str,
        mention_ids: &[String],
    ) -> Result<ContentItem, PlexusError> {
        let mut item = self
            .storage
            .get_content(post_id)
            .await?
            .filter(|item| item.kind == ContentKind::Post)
            .ok_or_else(|| PlexusError::not_found("post", post_id))?;
        if item.owner_id != principal.user_id {
            return Err(PlexusError::Authorization(
                "only the author may edit a post".to_string(),
            ));
        }
        self.validate_body(body)?;
        if item.body == body {
            return Ok(item);
        }

        let now = now_timestamp();
        self.storage.update_content_body(post_id, body, &now).await?;
        item.body = body.to_string();
        item.updated_at = now;

        self.mentions
            .regenerate(MentionSource {
                content_id: &item.id,
                related_type: RelatedType::Post,
                text: &item.body,
                explicit_ids: mention_ids,
                author_id: &item.owner_id,
            })
            .await
            .best_effort("regenerate post mentions");
        Ok(item)
    }

    pub async fn get_post(
        &self,
        viewer_id: Option<&str>,
        post_id: &str,
    ) -> Result<ContentItem, PlexusError> {
        let item = self.get_item(viewer_id, post_id).await?;
        if item.kind != ContentKind::Post {
            return Err(PlexusError::not_found("post", post_id));
        }
        Ok(item)
    }

    /// Any content item the viewer may see. Invisible items are NotFound.
    pub async fn get_item(
        &self,
        viewer_id: Option<&str>,
        content_id: &str,
    ) -> Result<ContentItem, PlexusError> {
        let item = self
            .storage
            .get_content(content_id)
            .await?
            .ok_or_else(|| PlexusError::not_found("content item", content_id))?;
        if !self.visibility.can_view(viewer_id, &item).await? {
            return Err(PlexusError::not_found("content item", content_id));
        }
        Ok(item)
    }

    /// Visible posts, newest first. The page size is clamped to the feed limits.
    pub async fn feed(
        &self,
        viewer_id: Option<&str>,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Vec<ContentItem>, PlexusError> {
        let page = Page::new(self.feed.page_size(limit), offset);
        let peers = self.visibility.peer_set(viewer_id).await?;
        debug!(viewer_id = ?viewer_id, peers = peers.len(), limit = page.limit, offset, "building feed");
        self.storage.list_feed(&peers.feed_query(page)).await
    }

    // --- Likes ---

    /// Like a visible item. Liking twice is absorbed.
    pub async fn like(&self, principal: &Principal, content_id: &str) -> Result<(), PlexusError> {
        let item = self.get_item(Some(&principal.user_id), content_id).await?;
        match self
            .storage
            .insert_like(&item.id, &principal.user_id, &now_timestamp())
            .await
        {
            Ok(()) => {}
            Err(PlexusError::AlreadyExists { .. }) => {
                debug!(user_id = %principal.user_id, content_id = %item.id, "like already recorded");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let name = self.dispatcher.actor_name(&principal.user_id).await;
        let draft = NotificationDraft::new(
            NotificationType::Like,
            format!("{name} liked your {}", noun(item.kind)),
        )
        .triggered_by(&principal.user_id)
        .related(&item.id, RelatedType::from(item.kind));
        self.dispatcher
            .notify(&item.owner_id, &draft)
            .await
            .best_effort("notify like");
        Ok(())
    }

    /// Remove a like. Returns false if there was none. Notifications are untouched.
    pub async fn unlike(&self, principal: &Principal, content_id: &str) -> Result<bool, PlexusError> {
        let item = self.get_item(Some(&principal.user_id), content_id).await?;
        self.storage.delete_like(&item.id, &principal.user_id).await
    }

    pub async fn like_count(
        &self,
        viewer_id: Option<&str>,
        content_id: &str,
    ) -> Result<i64, PlexusError> {
        let item = self.get_item(viewer_id, content_id).await?;
        self.storage.count_likes(&item.id).await
    }

    // --- Comments ---

    /// Comment on a visible item, optionally replying to one of its comments.
    ///
    /// The parent author gets REPLY; the item owner gets COMMENT unless they
    /// are the parent author.
    pub async fn comment(
        &self,
        principal: &Principal,
        content_id: &str,
        body: &str,
        parent_id: Option<&str>,
        mention_ids: &[String],
    ) -> Result<Comment, PlexusError> {
        let item = self.get_item(Some(&principal.user_id), content_id).await?;
        self.validate_body(body)?;

        let parent = match parent_id {
            None => None,
            Some(pid) => {
                let parent = self
                    .storage
                    .get_comment(pid)
                    .await?
                    .ok_or_else(|| PlexusError::Validation(format!("unknown parent comment {pid}")))?;
                if parent.content_id != item.id {
                    return Err(PlexusError::Validation(
                        "parent comment belongs to different content".to_string(),
                    ));
                }
                Some(parent)
            }
        };

        let comment = Comment {
            id: new_id(),
            content_id: item.id.clone(),
            author_id: principal.user_id.clone(),
            parent_id: parent.as_ref().map(|p| p.id.clone()),
            body: body.to_string(),
            created_at: now_timestamp(),
        };
        self.storage.insert_comment(&comment).await?;
        debug!(comment_id = %comment.id, content_id = %item.id, "comment created");

        let name = self.dispatcher.actor_name(&principal.user_id).await;
        let related_type = RelatedType::from(item.kind);
        if let Some(parent) = &parent {
            let reply = NotificationDraft::new(
                NotificationType::Reply,
                format!("{name} replied to your comment"),
            )
            .triggered_by(&principal.user_id)
            .related(&item.id, related_type);
            self.dispatcher
                .notify(&parent.author_id, &reply)
                .await
                .best_effort("notify reply");
        }
        if parent.as_ref().map(|p| p.author_id.as_str()) != Some(item.owner_id.as_str()) {
            let commented = NotificationDraft::new(
                NotificationType::Comment,
                format!("{name} commented on your {}", noun(item.kind)),
            )
            .triggered_by(&principal.user_id)
            .related(&item.id, related_type);
            self.dispatcher
                .notify(&item.owner_id, &commented)
                .await
                .best_effort("notify comment");
        }

        self.mentions
            .resolve(MentionSource {
                content_id: &comment.id,
                related_type: RelatedType::Comment,
                text: &comment.body,
                explicit_ids: mention_ids,
                author_id: &comment.author_id,
            })
            .await
            .best_effort("resolve comment mentions");
        Ok(comment)
    }

    // --- Broadcasts ---

    /// Create an announcement or event. Admins only.
    pub async fn create_broadcast(
        &self,
        principal: &Principal,
        kind: ContentKind,
        body: &str,
        publish_now: bool,
    ) -> Result<ContentItem, PlexusError> {
        if !principal.is_admin() {
            return Err(PlexusError::Authorization(
                "only administrators may create announcements and events".to_string(),
            ));
        }
        if !kind.is_broadcast() {
            return Err(PlexusError::Validation(format!(
                "{kind} is not a broadcast kind"
            )));
        }
        self.validate_body(body)?;

        let now = now_timestamp();
        let item = ContentItem {
            id: new_id(),
            owner_id: principal.user_id.clone(),
            kind,
            visibility: Visibility::Public,
            body: body.to_string(),
            published: false,
            created_at: now.clone(),
            updated_at: now,
        };
        self.storage.insert_content(&item).await?;
        info!(content_id = %item.id, kind = %kind, "broadcast created");

        if publish_now {
            return self.publish(principal, &item.id).await;
        }
        Ok(item)
    }

    /// Publish a broadcast and fan it out to every other verified user.
    pub async fn publish(
        &self,
        principal: &Principal,
        content_id: &str,
    ) -> Result<ContentItem, PlexusError> {
        let mut item = self
            .storage
            .get_content(content_id)
            .await?
            .ok_or_else(|| PlexusError::not_found("content item", content_id))?;
        if item.owner_id != principal.user_id {
            return Err(PlexusError::Authorization(
                "only the author may publish this item".to_string(),
            ));
        }
        if item.published {
            return Err(PlexusError::Conflict("already published".to_string()));
        }

        let now = now_timestamp();
        if !self.storage.publish_content(content_id, &now).await? {
            return Err(PlexusError::Conflict("already published".to_string()));
        }
        item.published = true;
        item.updated_at = now;
        info!(content_id, kind = %item.kind, "broadcast published");

        let recipients = self
            .storage
            .list_verified_user_ids_except(&item.owner_id)
            .await
            .best_effort("list broadcast recipients")
            .unwrap_or_default();
        let (kind, label) = match item.kind {
            ContentKind::Event => (NotificationType::Event, "New event"),
            _ => (NotificationType::Announcement, "New announcement"),
        };
        let draft = NotificationDraft::new(kind, format!("{label}: {}", excerpt(&item.body)))
            .triggered_by(&item.owner_id)
            .related(&item.id, RelatedType::from(item.kind));
        self.dispatcher
            .notify_bulk(&recipients, &draft)
            .await
            .best_effort("fan out broadcast");
        Ok(item)
    }

    // --- Direct messages ---

    /// Message an ACCEPTED connection.
    pub async fn send_message(
        &self,
        principal: &Principal,
        recipient_id: &str,
        body: &str,
    ) -> Result<DirectMessage, PlexusError> {
        if recipient_id == principal.user_id {
            return Err(PlexusError::Validation(
                "cannot send a message to yourself".to_string(),
            ));
        }
        self.storage
            .get_user(recipient_id)
            .await?
            .ok_or_else(|| PlexusError::not_found("user", recipient_id))?;
        if !self
            .connections
            .are_connected(&principal.user_id, recipient_id)
            .await?
        {
            return Err(PlexusError::Authorization(
                "messages are limited to accepted connections".to_string(),
            ));
        }
        self.validate_body(body)?;

        let message = DirectMessage {
            id: new_id(),
            sender_id: principal.user_id.clone(),
            recipient_id: recipient_id.to_string(),
            body: body.to_string(),
            created_at: now_timestamp(),
        };
        self.storage.insert_direct_message(&message).await?;

        let name = self.dispatcher.actor_name(&principal.user_id).await;
        let draft = NotificationDraft::new(
            NotificationType::Message,
            format!("{name} sent you a message"),
        )
        .triggered_by(&principal.user_id)
        .related(&message.id, RelatedType::Message);
        self.dispatcher
            .notify(recipient_id, &draft)
            .await
            .best_effort("notify message");
        Ok(message)
    }

    fn validate_body(&self, body: &str) -> Result<(), PlexusError> {
        if body.trim().is_empty() {
            return Err(PlexusError::Validation("body must not be empty".to_string()));
        }
        if body.chars().count() > self.content.max_body_len {
            return Err(PlexusError::Validation(format!(
                "body exceeds {} characters",
                self.content.max_body_len
            )));
        }
        Ok(())
    }
}

fn noun(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Post => "post",
        ContentKind::Announcement => "announcement",
        ContentKind::Event => "event",
    }
}

fn excerpt(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
