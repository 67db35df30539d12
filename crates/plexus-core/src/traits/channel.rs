// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time publishing capability injected into the notification dispatcher.

use async_trait::async_trait;

use crate::error::PlexusError;
use crate::traits::adapter::PluginAdapter;

/// Event name used for pushed notifications.
pub const NOTIFICATION_EVENT: &str = "notification";

/// Best-effort, at-most-once push to a user's live sessions.
///
/// A user with no live session is not an error: the event is dropped and the
/// durable notification row remains the source of truth.
#[async_trait]
pub trait ChannelPublisher: PluginAdapter {
    /// Push `payload` under `event` to every live session of `user_id`.
    async fn publish(
        &self,
        user_id: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), PlexusError>;
}
