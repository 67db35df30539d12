// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The connection graph and everything gated by it.
//!
//! - [`connections`]: request/accept/reject lifecycle with pair uniqueness.
//! - [`visibility`]: per-viewer visibility checks and feed predicates.
//! - [`mentions`]: graph-constrained mention resolution.

pub mod connections;
pub mod mentions;
pub mod visibility;

pub use connections::ConnectionService;
pub use mentions::{MentionResolver, MentionSource};
pub use visibility::{PeerSet, VisibilityResolver};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use plexus_config::model::StorageConfig;
    use plexus_core::types::{Role, User};
    use plexus_core::StorageAdapter;
    use plexus_notify::NotificationDispatcher;
    use plexus_storage::SqliteStorage;
    use plexus_test_utils::RecordingPublisher;

    use crate::connections::ConnectionService;

    pub struct Graph {
        pub storage: Arc<dyn StorageAdapter>,
        pub dispatcher: Arc<NotificationDispatcher>,
        pub connections: Arc<ConnectionService>,
        _dir: tempfile::TempDir,
    }

    pub fn user(id: &str, display_name: &str) -> User {
        User {
            id: id.to_string(),
            display_name: display_name.to_string(),
            email: format!("{id}@campus.example"),
            institution_id: None,
            role: Role::Member,
            verified: true,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    pub async fn graph_with(users: &[User]) -> Graph {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("graph.db").to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();
        for u in users {
            storage.insert_user(u).await.unwrap();
        }
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);
        let dispatcher = Arc::new(NotificationDispatcher::new(
            storage.clone(),
            Arc::new(RecordingPublisher::new()),
            true,
        ));
        let connections = Arc::new(ConnectionService::new(
            storage.clone(),
            dispatcher.clone(),
            500,
        ));
        Graph {
            storage,
            dispatcher,
            connections,
            _dir: dir,
        }
    }

    pub async fn graph_of(ids: &[&str]) -> Graph {
        let users: Vec<User> = ids.iter().map(|id| user(id, id)).collect();
        graph_with(&users).await
    }

    impl Graph {
        /// Request and accept a connection from `a` to `b`.
        pub async fn connect(&self, a: &str, b: &str) {
            let c = self.connections.request(a, b, None).await.unwrap();
            self.connections.accept(&c.id, b).await.unwrap();
        }
    }
}
