// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-viewer visibility of content.
//!
//! Single-item checks consult the connection graph at most once. Listings
//! compute the viewer's [`PeerSet`] once per request and push the same
//! predicate into the store query so pagination only counts visible rows.

use std::collections::HashSet;
use std::sync::Arc;

use plexus_core::PlexusError;
use plexus_core::types::{ContentItem, FeedQuery, Page, Visibility};

use crate::connections::ConnectionService;

/// The decision rule shared by single checks and listings.
///
/// `is_peer` is only consulted for CONNECTIONS-scoped items owned by
/// someone else.
pub fn admits(
    viewer_id: Option<&str>,
    owner_id: &str,
    visibility: Visibility,
    is_peer: impl FnOnce() -> bool,
) -> bool {
    match viewer_id {
        None => visibility == Visibility::Public,
        Some(viewer) if viewer == owner_id => true,
        Some(_) => match visibility {
            Visibility::Public => true,
            Visibility::Connections => is_peer(),
        },
    }
}

/// A viewer's accepted peers, computed once per request.
#[derive(Debug, Clone, Default)]
pub struct PeerSet {
    viewer_id: Option<String>,
    peers: HashSet<String>,
}

impl PeerSet {
    /// The empty set of an anonymous viewer.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(viewer_id: impl Into<String>, peers: HashSet<String>) -> Self {
        Self {
            viewer_id: Some(viewer_id.into()),
            peers,
        }
    }

    pub fn viewer_id(&self) -> Option<&str> {
        self.viewer_id.as_deref()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.peers.contains(user_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Whether an item with this owner and scope is visible to the viewer.
    pub fn admits(&self, owner_id: &str, visibility: Visibility) -> bool {
        admits(self.viewer_id(), owner_id, visibility, || self.contains(owner_id))
    }

    /// The store-level feed filter for this viewer.
    pub fn feed_query(&self, page: Page) -> FeedQuery {
        let mut peer_ids: Vec<String> = self.peers.iter().cloned().collect();
        peer_ids.sort();
        FeedQuery {
            viewer_id: self.viewer_id.clone(),
            peer_ids,
            page,
        }
    }
}

/// Decides what a viewer may see.
pub struct VisibilityResolver {
    connections: Arc<ConnectionService>,
}

impl VisibilityResolver {
    pub fn new(connections: Arc<ConnectionService>) -> Self {
        Self { connections }
    }

    /// Visibility of an item with `owner_id` and `visibility` to `viewer_id`.
    ///
    /// The graph is only queried for CONNECTIONS-scoped items viewed by
    /// someone other than the owner.
    pub async fn is_visible(
        &self,
        viewer_id: Option<&str>,
        owner_id: &str,
        visibility: Visibility,
    ) -> Result<bool, PlexusError> {
        let needs_graph = matches!(viewer_id, Some(v) if v != owner_id)
            && visibility == Visibility::Connections;
        let connected = match (needs_graph, viewer_id) {
            (true, Some(viewer)) => self.connections.are_connected(viewer, owner_id).await?,
            _ => false,
        };
        Ok(admits(viewer_id, owner_id, visibility, || connected))
    }

    /// Visibility of a concrete item, including the publication rule for
    /// broadcasts: unpublished items are visible to their owner only.
    pub async fn can_view(
        &self,
        viewer_id: Option<&str>,
        item: &ContentItem,
    ) -> Result<bool, PlexusError> {
        if !item.published {
            return Ok(viewer_id == Some(item.owner_id.as_str()));
        }
        self.is_visible(viewer_id, &item.owner_id, item.visibility)
            .await
    }

    /// The viewer's peer set; anonymous viewers get an empty one.
    pub async fn peer_set(&self, viewer_id: Option<&str>) -> Result<PeerSet, PlexusError> {
        match viewer_id {
            None => Ok(PeerSet::anonymous()),
            Some(viewer) => Ok(PeerSet::new(
                viewer,
                self.connections.accepted_peers_of(viewer).await?,
            )),
        }
    }
}
