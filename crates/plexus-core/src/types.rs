// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and engine components.
//!
//! Enumerations are stored as SCREAMING_SNAKE_CASE text both in SQLite and
//! on the wire, so `Display`/`FromStr` and serde agree on the spelling.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Current UTC time in the canonical storage format.
///
/// Millisecond precision, `Z` suffix; values sort lexically.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Fresh UUID v4 identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Channel,
}

// --- Identity ---

/// Platform role of a user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Member,
    Admin,
}

/// A registered user.
///
/// `institution_id` is optional; an absent value never matches a mention token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub institution_id: Option<String>,
    pub role: Role,
    pub verified: bool,
    pub created_at: String,
}

/// The acting user as supplied by the identity layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
    pub verified: bool,
}

impl Principal {
    pub fn member(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Member,
            verified: true,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Admin,
            verified: true,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
            verified: user.verified,
        }
    }
}

// --- Connections ---

/// Lifecycle state of a connection. ACCEPTED and REJECTED are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ConnectionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A bidirectional relationship record between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub requester_id: String,
    pub target_id: String,
    pub status: ConnectionStatus,
    pub message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Connection {
    /// The party on the other side of `user_id`, if `user_id` is a party at all.
    pub fn other_party(&self, user_id: &str) -> Option<&str> {
        if self.requester_id == user_id {
            Some(&self.target_id)
        } else if self.target_id == user_id {
            Some(&self.requester_id)
        } else {
            None
        }
    }
}

/// Connection state between two users, seen from the first user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairStatus {
    pub status: ConnectionStatus,
    pub is_requester: bool,
}

// --- Content ---

/// Kind of content item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentKind {
    Post,
    Announcement,
    Event,
}

impl ContentKind {
    /// Announcements and events are broadcast to every member on publish.
    pub fn is_broadcast(self) -> bool {
        matches!(self, Self::Announcement | Self::Event)
    }
}

/// Who may see a content item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Public,
    Connections,
}

/// A post, announcement, or event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub owner_id: String,
    pub kind: ContentKind,
    pub visibility: Visibility,
    pub body: String,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A comment on a content item, optionally replying to another comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content_id: String,
    pub author_id: String,
    pub parent_id: Option<String>,
    pub body: String,
    pub created_at: String,
}

/// A direct message between two connected users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
    pub created_at: String,
}

/// A user tagged inside a post or comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    pub content_id: String,
    pub user_id: String,
}

// --- Notifications ---

/// Trigger that produced a notification. Only `Like` is deduplicated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Like,
    Comment,
    Reply,
    Mention,
    ConnectionRequest,
    ConnectionAccepted,
    Announcement,
    Event,
    Message,
}

/// Kind of entity a notification points at.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelatedType {
    Post,
    Comment,
    Connection,
    Announcement,
    Event,
    Message,
}

impl From<ContentKind> for RelatedType {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Post => Self::Post,
            ContentKind::Announcement => Self::Announcement,
            ContentKind::Event => Self::Event,
        }
    }
}

/// A durable, recipient-addressed record of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub triggered_by: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    pub related_id: Option<String>,
    pub related_type: Option<RelatedType>,
    pub read: bool,
    pub created_at: String,
}

/// Everything about a notification except its recipient.
///
/// One draft is addressed to one or many recipients by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub triggered_by: Option<String>,
    pub kind: NotificationType,
    pub message: String,
    pub related_id: Option<String>,
    pub related_type: Option<RelatedType>,
}

impl NotificationDraft {
    pub fn new(kind: NotificationType, message: impl Into<String>) -> Self {
        Self {
            triggered_by: None,
            kind,
            message: message.into(),
            related_id: None,
            related_type: None,
        }
    }

    pub fn triggered_by(mut self, user_id: impl Into<String>) -> Self {
        self.triggered_by = Some(user_id.into());
        self
    }

    pub fn related(mut self, id: impl Into<String>, related_type: RelatedType) -> Self {
        self.related_id = Some(id.into());
        self.related_type = Some(related_type);
        self
    }

    /// Materialize the draft for one recipient.
    pub fn addressed_to(&self, recipient_id: &str, created_at: &str) -> Notification {
        Notification {
            id: new_id(),
            recipient_id: recipient_id.to_string(),
            triggered_by: self.triggered_by.clone(),
            kind: self.kind,
            message: self.message.clone(),
            related_id: self.related_id.clone(),
            related_type: self.related_type,
            read: false,
            created_at: created_at.to_string(),
        }
    }
}

// --- Read receipts ---

/// Broadcast content types tracked by read receipts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectType {
    Announcement,
    Event,
}

impl SubjectType {
    pub const ALL: [SubjectType; 2] = [SubjectType::Announcement, SubjectType::Event];

    pub fn content_kind(self) -> ContentKind {
        match self {
            Self::Announcement => ContentKind::Announcement,
            Self::Event => ContentKind::Event,
        }
    }
}

/// Per-user "has seen this broadcast" mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub subject_id: String,
    pub subject_type: SubjectType,
    pub user_id: String,
    pub created_at: String,
}

// --- Listing ---

/// Offset pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }
}

/// Store-level feed filter.
///
/// `peer_ids` is the viewer's accepted-peer set, computed once per request.
/// The store applies `visibility = PUBLIC OR (visibility = CONNECTIONS AND
/// owner IN peer_ids) OR owner = viewer_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub viewer_id: Option<String>,
    pub peer_ids: Vec<String>,
    pub page: Page,
}
