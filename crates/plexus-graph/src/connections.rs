// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection lifecycle: absent -> PENDING -> {ACCEPTED, REJECTED}.
//!
//! At most one record exists per unordered pair. The service checks both
//! directions before inserting and the store's pair index catches the
//! concurrent case; both surface as `Conflict`. ACCEPTED and REJECTED are
//! terminal and records are never deleted.

use std::collections::HashSet;
use std::sync::Arc;

use plexus_core::types::{
    Connection, ConnectionStatus, NotificationDraft, NotificationType, PairStatus, RelatedType,
    new_id, now_timestamp,
};
use plexus_core::{BestEffort, PlexusError, StorageAdapter};
use plexus_notify::NotificationDispatcher;
use tracing::{debug, info};

/// Owns the connection state machine.
pub struct ConnectionService {
    storage: Arc<dyn StorageAdapter>,
    dispatcher: Arc<NotificationDispatcher>,
    max_message_len: usize,
}

impl ConnectionService {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        dispatcher: Arc<NotificationDispatcher>,
        max_message_len: usize,
    ) -> Self {
        Self {
            storage,
            dispatcher,
            max_message_len,
        }
    }

    /// Ask `target_id` to connect.
    ///
    /// Any existing record for the pair, in either direction and in any
    /// state, is a `Conflict`.
    pub async fn request(
        &self,
        requester_id: &str,
        target_id: &str,
        message: Option<String>,
    ) -> Result<Connection, PlexusError> {
        if requester_id == target_id {
            return Err(PlexusError::Validation(
                "cannot send a connection request to yourself".to_string(),
            ));
        }
        if let Some(text) = &message
            && text.chars().count() > self.max_message_len
        {
            return Err(PlexusError::Validation(format!(
                "connection message exceeds {} characters",
                self.max_message_len
            )));
        }

        let target = self
            .storage
            .get_user(target_id)
            .await?
            .ok_or_else(|| PlexusError::not_found("user", target_id))?;
        if !target.verified {
            return Err(PlexusError::Validation(
                "target user is not verified".to_string(),
            ));
        }

        if self
            .storage
            .find_connection_between(requester_id, target_id)
            .await?
            .is_some()
        {
            return Err(PlexusError::Conflict(
                "a connection request already exists between these users".to_string(),
            ));
        }

        let now = now_timestamp();
        let connection = Connection {
            id: new_id(),
            requester_id: requester_id.to_string(),
            target_id: target_id.to_string(),
            status: ConnectionStatus::Pending,
            message,
            created_at: now.clone(),
            updated_at: now,
        };
        match self.storage.insert_connection(&connection).await {
            Ok(()) => {}
            Err(PlexusError::AlreadyExists { .. }) => {
                return Err(PlexusError::Conflict("connection already requested".to_string()));
            }
            Err(e) => return Err(e),
        }
        info!(connection_id = %connection.id, requester_id, target_id, "connection requested");

        let name = self.dispatcher.actor_name(requester_id).await;
        let draft = NotificationDraft::new(
            NotificationType::ConnectionRequest,
            format!("{name} sent you a connection request"),
        )
        .triggered_by(requester_id)
        .related(&connection.id, RelatedType::Connection);
        self.dispatcher
            .notify(target_id, &draft)
            .await
            .best_effort("notify connection request");

        Ok(connection)
    }

    /// Accept a PENDING request. Only the target may accept.
    pub async fn accept(
        &self,
        connection_id: &str,
        acting_user_id: &str,
    ) -> Result<Connection, PlexusError> {
        let connection = self
            .resolve(connection_id, acting_user_id, ConnectionStatus::Accepted)
            .await?;

        let name = self.dispatcher.actor_name(acting_user_id).await;
        let draft = NotificationDraft::new(
            NotificationType::ConnectionAccepted,
            format!("{name} accepted your connection request"),
        )
        .triggered_by(acting_user_id)
        .related(&connection.id, RelatedType::Connection);
        self.dispatcher
            .notify(&connection.requester_id, &draft)
            .await
            .best_effort("notify connection accepted");

        Ok(connection)
    }

    /// Reject a PENDING request. Only the target may reject; nobody is notified.
    pub async fn reject(
        &self,
        connection_id: &str,
        acting_user_id: &str,
    ) -> Result<Connection, PlexusError> {
        self.resolve(connection_id, acting_user_id, ConnectionStatus::Rejected)
            .await
    }

    async fn resolve(
        &self,
        connection_id: &str,
        acting_user_id: &str,
        to: ConnectionStatus,
    ) -> Result<Connection, PlexusError> {
        let connection = self
            .storage
            .get_connection(connection_id)
            .await?
            .ok_or_else(|| PlexusError::not_found("connection", connection_id))?;
        if connection.target_id != acting_user_id {
            return Err(PlexusError::Authorization(
                "only the recipient of a connection request may respond to it".to_string(),
            ));
        }
        if connection.status.is_terminal() {
            return Err(PlexusError::Conflict(
                "connection request already processed".to_string(),
            ));
        }

        let moved = self
            .storage
            .transition_connection(connection_id, ConnectionStatus::Pending, to)
            .await?;
        if !moved {
            debug!(connection_id, "lost race on connection transition");
            return Err(PlexusError::Conflict(
                "connection request already processed".to_string(),
            ));
        }
        info!(connection_id, status = %to, "connection resolved");

        self.storage
            .get_connection(connection_id)
            .await?
            .ok_or_else(|| PlexusError::not_found("connection", connection_id))
    }

    /// Pair status from `a`'s perspective.
    pub async fn status_between(&self, a: &str, b: &str) -> Result<Option<PairStatus>, PlexusError> {
        Ok(self
            .storage
            .find_connection_between(a, b)
            .await?
            .map(|c| PairStatus {
                status: c.status,
                is_requester: c.requester_id == a,
            }))
    }

    /// Whether `a` and `b` hold an ACCEPTED record.
    pub async fn are_connected(&self, a: &str, b: &str) -> Result<bool, PlexusError> {
        Ok(matches!(
            self.status_between(a, b).await?,
            Some(PairStatus {
                status: ConnectionStatus::Accepted,
                ..
            })
        ))
    }

    /// Every user with an ACCEPTED record with `user_id`, on either side.
    pub async fn accepted_peers_of(&self, user_id: &str) -> Result<HashSet<String>, PlexusError> {
        Ok(self
            .storage
            .accepted_peer_ids(user_id)
            .await?
            .into_iter()
            .collect())
    }

    /// PENDING requests addressed to `user_id`, newest first.
    pub async fn pending_incoming(&self, user_id: &str) -> Result<Vec<Connection>, PlexusError> {
        self.storage.pending_incoming(user_id).await
    }
}
