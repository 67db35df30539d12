// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composition root for the Plexus engine.
//!
//! [`Engine::new`] wires every component exactly once, in dependency order:
//! store -> publisher -> dispatcher -> connections -> visibility and mention
//! resolvers -> read tracker -> activity. Components hold `Arc`s to their
//! collaborators; nothing is looked up lazily.

pub mod activity;
pub mod receipts;

use std::sync::Arc;

use plexus_config::PlexusConfig;
use plexus_core::{ChannelPublisher, StorageAdapter};
use plexus_graph::{ConnectionService, MentionResolver, VisibilityResolver};
use plexus_notify::{NotificationDispatcher, NotificationInbox};
use tracing::info;

pub use activity::ActivityService;
pub use receipts::{ReadTracker, UnreadCounts};

/// Every engine component, constructed once.
pub struct Engine {
    storage: Arc<dyn StorageAdapter>,
    dispatcher: Arc<NotificationDispatcher>,
    inbox: Arc<NotificationInbox>,
    connections: Arc<ConnectionService>,
    visibility: Arc<VisibilityResolver>,
    mentions: Arc<MentionResolver>,
    receipts: Arc<ReadTracker>,
    activity: Arc<ActivityService>,
}

impl Engine {
    /// Wire the engine over an initialized store and a delivery channel.
    pub fn new(
        config: &PlexusConfig,
        storage: Arc<dyn StorageAdapter>,
        publisher: Arc<dyn ChannelPublisher>,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            storage.clone(),
            publisher,
            config.notifications.realtime_enabled,
        ));
        let inbox = Arc::new(NotificationInbox::new(storage.clone()));
        let connections = Arc::new(ConnectionService::new(
            storage.clone(),
            dispatcher.clone(),
            config.content.max_connection_message_len,
        ));
        let visibility = Arc::new(VisibilityResolver::new(connections.clone()));
        let mentions = Arc::new(MentionResolver::new(
            storage.clone(),
            connections.clone(),
            dispatcher.clone(),
        ));
        let receipts = Arc::new(ReadTracker::new(storage.clone()));
        let activity = Arc::new(ActivityService::new(
            storage.clone(),
            dispatcher.clone(),
            connections.clone(),
            visibility.clone(),
            mentions.clone(),
            config.content.clone(),
            config.feed.clone(),
        ));

        info!(
            realtime = config.notifications.realtime_enabled,
            "engine components wired"
        );
        Self {
            storage,
            dispatcher,
            inbox,
            connections,
            visibility,
            mentions,
            receipts,
            activity,
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }

    pub fn inbox(&self) -> &Arc<NotificationInbox> {
        &self.inbox
    }

    pub fn connections(&self) -> &Arc<ConnectionService> {
        &self.connections
    }

    pub fn visibility(&self) -> &Arc<VisibilityResolver> {
        &self.visibility
    }

    pub fn mentions(&self) -> &Arc<MentionResolver> {
        &self.mentions
    }

    pub fn receipts(&self) -> &Arc<ReadTracker> {
        &self.receipts
    }

    pub fn activity(&self) -> &Arc<ActivityService> {
        &self.activity
    }
}
