// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live session registry and the real-time [`ChannelPublisher`].
//!
//! Each connected socket owns a bounded queue of serialized frames. A push
//! never waits: a full or closed queue is reported as a transient delivery
//! failure and the dispatcher logs it.

use async_trait::async_trait;
use dashmap::DashMap;
use plexus_core::{AdapterType, ChannelPublisher, HealthStatus, PlexusError, PluginAdapter};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

struct Session {
    id: String,
    tx: mpsc::Sender<String>,
}

/// Sessions grouped by user. One user may hold several sockets.
pub struct SessionRegistry {
    sessions: DashMap<String, Vec<Session>>,
    buffer: usize,
}

impl SessionRegistry {
    /// `buffer` is the per-session queue depth.
    pub fn new(buffer: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            buffer: buffer.max(1),
        }
    }

    /// Open a session for `user_id` and return its id and frame receiver.
    pub fn open_session(&self, user_id: &str) -> (String, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        (self.join(user_id, tx), rx)
    }

    /// Register an existing sender as a session of `user_id`.
    pub fn join(&self, user_id: &str, tx: mpsc::Sender<String>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.sessions
            .entry(user_id.to_string())
            .or_default()
            .push(Session { id: id.clone(), tx });
        metrics::gauge!("plexus_gateway_sessions").increment(1.0);
        debug!(user_id, session_id = %id, "session joined");
        id
    }

    /// Remove a session. Unknown ids are ignored.
    pub fn leave(&self, user_id: &str, session_id: &str) {
        let mut removed = false;
        if let Some(mut sessions) = self.sessions.get_mut(user_id) {
            let before = sessions.len();
            sessions.retain(|s| s.id != session_id);
            removed = sessions.len() < before;
        }
        self.sessions.remove_if(user_id, |_, sessions| sessions.is_empty());
        if removed {
            metrics::gauge!("plexus_gateway_sessions").decrement(1.0);
            debug!(user_id, session_id, "session left");
        }
    }

    pub fn session_count(&self, user_id: &str) -> usize {
        self.sessions.get(user_id).map(|s| s.len()).unwrap_or(0)
    }

    pub fn connected_users(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl PluginAdapter for SessionRegistry {
    fn name(&self) -> &str {
        "websocket"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, PlexusError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PlexusError> {
        // Dropping the senders ends every socket's forwarding task.
        let mut cleared = 0usize;
        self.sessions.retain(|_, sessions| {
            cleared += sessions.len();
            false
        });
        metrics::gauge!("plexus_gateway_sessions").decrement(cleared as f64);
        debug!(cleared, "session registry cleared");
        Ok(())
    }
}

#[async_trait]
impl ChannelPublisher for SessionRegistry {
    async fn publish(
        &self,
        user_id: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), PlexusError> {
        let frame = json!({ "event": event, "data": payload }).to_string();

        let mut failed = 0usize;
        let mut closed = Vec::new();
        let total = match self.sessions.get(user_id) {
            None => return Ok(()),
            Some(sessions) => {
                for session in sessions.iter() {
                    match session.tx.try_send(frame.clone()) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => failed += 1,
                        Err(TrySendError::Closed(_)) => {
                            failed += 1;
                            closed.push(session.id.clone());
                        }
                    }
                }
                sessions.len()
            }
        };

        for session_id in &closed {
            self.leave(user_id, session_id);
        }
        if failed > 0 {
            return Err(PlexusError::TransientDelivery {
                message: format!("{failed} of {total} sessions unavailable for {user_id}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

    fn session_gauge(handle: &PrometheusHandle) -> f64 {
        handle
            .render()
            .lines()
            .find_map(|line| line.strip_prefix("plexus_gateway_sessions "))
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or_default()
    }

    #[test]
    fn session_gauge_returns_to_zero_after_shutdown() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let registry = SessionRegistry::new(4);
            let (first, _rx1) = registry.open_session("u1");
            let (_second, _rx2) = registry.open_session("u1");
            let (_third, _rx3) = registry.open_session("u2");
            assert_eq!(session_gauge(&handle), 3.0);

            registry.leave("u1", &first);
            assert_eq!(session_gauge(&handle), 2.0);

            futures::executor::block_on(registry.shutdown()).unwrap();
            assert_eq!(registry.connected_users(), 0);
            assert_eq!(session_gauge(&handle), 0.0);
        });
    }

    #[tokio::test]
    async fn publish_wraps_payload_in_envelope() {
        let registry = SessionRegistry::new(4);
        let (_id, mut rx) = registry.open_session("u1");

        registry
            .publish("u1", "notification", json!({ "id": "n1" }))
            .await
            .unwrap();

        let frame: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["event"], "notification");
        assert_eq!(frame["data"]["id"], "n1");
    }

    #[tokio::test]
    async fn user_without_sessions_is_a_silent_drop() {
        let registry = SessionRegistry::new(4);
        assert!(registry.publish("nobody", "notification", json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn every_session_of_a_user_receives_the_frame() {
        let registry = SessionRegistry::new(4);
        let (_a, mut rx_a) = registry.open_session("u1");
        let (_b, mut rx_b) = registry.open_session("u1");
        assert_eq!(registry.session_count("u1"), 2);

        registry.publish("u1", "notification", json!(1)).await.unwrap();
        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn full_buffer_is_a_transient_failure() {
        let registry = SessionRegistry::new(1);
        let (_id, _rx) = registry.open_session("u1");

        registry.publish("u1", "notification", json!(1)).await.unwrap();
        let err = registry
            .publish("u1", "notification", json!(2))
            .await
            .unwrap_err();
        assert!(matches!(err, PlexusError::TransientDelivery { .. }));
        assert_eq!(registry.session_count("u1"), 1);
    }

    #[tokio::test]
    async fn closed_session_fails_once_then_is_pruned() {
        let registry = SessionRegistry::new(4);
        let (_id, rx) = registry.open_session("u1");
        drop(rx);

        assert!(registry.publish("u1", "notification", json!(1)).await.is_err());
        assert_eq!(registry.session_count("u1"), 0);
        assert_eq!(registry.connected_users(), 0);
        assert!(registry.publish("u1", "notification", json!(1)).await.is_ok());
    }

    #[test]
    fn leave_removes_only_the_named_session() {
        let registry = SessionRegistry::new(4);
        let (a, _rx_a) = registry.open_session("u1");
        let (_b, _rx_b) = registry.open_session("u1");

        registry.leave("u1", &a);
        assert_eq!(registry.session_count("u1"), 1);
        registry.leave("u1", "not-a-session");
        assert_eq!(registry.session_count("u1"), 1);
    }
}
