// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording channel publisher for deterministic testing.
//!
//! Every publish attempt is captured, including attempts that were made to
//! fail, so tests can assert that fan-out continued past a failure.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use plexus_core::traits::adapter::PluginAdapter;
use plexus_core::traits::channel::ChannelPublisher;
use plexus_core::types::{AdapterType, HealthStatus};
use plexus_core::PlexusError;

/// One captured publish attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PushRecord {
    pub user_id: String,
    pub event: String,
    pub payload: serde_json::Value,
    /// Whether the attempt was made to fail.
    pub failed: bool,
}

/// A [`ChannelPublisher`] that records instead of delivering.
#[derive(Default)]
pub struct RecordingPublisher {
    pushes: Arc<Mutex<Vec<PushRecord>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent push to `user_id` fail with a transient error.
    pub async fn fail_for(&self, user_id: &str) {
        self.failing.lock().await.insert(user_id.to_string());
    }

    pub async fn pushes(&self) -> Vec<PushRecord> {
        self.pushes.lock().await.clone()
    }

    /// Attempts addressed to `user_id`, failed ones included.
    pub async fn attempts_for(&self, user_id: &str) -> usize {
        self.pushes
            .lock()
            .await
            .iter()
            .filter(|p| p.user_id == user_id)
            .count()
    }

    pub async fn delivered_to(&self, user_id: &str) -> Vec<serde_json::Value> {
        self.pushes
            .lock()
            .await
            .iter()
            .filter(|p| p.user_id == user_id && !p.failed)
            .map(|p| p.payload.clone())
            .collect()
    }

    pub async fn clear(&self) {
        self.pushes.lock().await.clear();
    }
}

#[async_trait]
impl PluginAdapter for RecordingPublisher {
    fn name(&self) -> &str {
        "recording"
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
        Ok(())
    }
}

#[async_trait]
impl ChannelPublisher for RecordingPublisher {
    async fn publish(
        &self,
        user_id: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), PlexusError> {
        let failed = self.failing.lock().await.contains(user_id);
        self.pushes.lock().await.push(PushRecord {
            user_id: user_id.to_string(),
            event: event.to_string(),
            payload,
            failed,
        });
        if failed {
            return Err(PlexusError::TransientDelivery {
                message: format!("recording publisher told to fail for {user_id}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn records_every_attempt() {
        let publisher = RecordingPublisher::new();
        publisher.fail_for("u2").await;

        publisher.publish("u1", "notification", json!(1)).await.unwrap();
        assert!(publisher.publish("u2", "notification", json!(2)).await.is_err());

        let pushes = publisher.pushes().await;
        assert_eq!(pushes.len(), 2);
        assert!(!pushes[0].failed);
        assert!(pushes[1].failed);
        assert_eq!(publisher.attempts_for("u2").await, 1);
        assert!(publisher.delivered_to("u2").await.is_empty());
        assert_eq!(publisher.delivered_to("u1").await, vec![json!(1)]);
    }

    #[tokio::test]
    async fn clear_drops_history() {
        let publisher = RecordingPublisher::new();
        publisher.publish("u1", "notification", json!(1)).await.unwrap();
        publisher.clear().await;
        assert!(publisher.pushes().await.is_empty());
    }
}
