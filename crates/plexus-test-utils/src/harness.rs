// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine tests.
//!
//! `TestHarness` assembles the full engine over a temp SQLite database and a
//! [`RecordingPublisher`], with users seeded up front.

use std::sync::Arc;

use plexus_config::PlexusConfig;
use plexus_core::types::{Connection, Principal, Role, User};
use plexus_core::{PlexusError, StorageAdapter};
use plexus_engine::Engine;
use plexus_storage::SqliteStorage;

use crate::recording_publisher::RecordingPublisher;

/// Registration time given to seeded users unless overridden.
pub const SEED_CREATED_AT: &str = "2026-01-01T00:00:00.000Z";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    users: Vec<User>,
    config: PlexusConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            users: Vec::new(),
            config: PlexusConfig::default(),
        }
    }

    /// Seed a verified member whose display name is the id.
    pub fn with_member(self, id: &str) -> Self {
        self.with_user(seed_user(id, Role::Member))
    }

    /// Seed a verified administrator.
    pub fn with_admin(self, id: &str) -> Self {
        self.with_user(seed_user(id, Role::Admin))
    }

    pub fn with_members(mut self, ids: &[&str]) -> Self {
        for id in ids {
            self = self.with_member(id);
        }
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    /// Adjust the engine configuration. The database path is always replaced.
    pub fn with_config(mut self, edit: impl FnOnce(&mut PlexusConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Build the harness, creating the store and wiring the engine.
    pub async fn build(self) -> Result<TestHarness, PlexusError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| PlexusError::Storage { source: e.into() })?;
        let mut config = self.config;
        config.storage.database_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .into_owned();

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);
        for user in &self.users {
            storage.insert_user(user).await?;
        }

        let publisher = Arc::new(RecordingPublisher::new());
        let engine = Arc::new(Engine::new(&config, storage.clone(), publisher.clone()));
        tracing::debug!(users = self.users.len(), "test harness ready");

        Ok(TestHarness {
            engine,
            storage,
            publisher,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete engine over temp storage.
pub struct TestHarness {
    pub engine: Arc<Engine>,
    /// SQLite store (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    pub publisher: Arc<RecordingPublisher>,
    pub config: PlexusConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The principal of a seeded user.
    pub async fn principal(&self, id: &str) -> Result<Principal, PlexusError> {
        let user = self
            .storage
            .get_user(id)
            .await?
            .ok_or_else(|| PlexusError::not_found("user", id))?;
        Ok(Principal::from(&user))
    }

    /// Register a verified member after build, at `created_at`.
    pub async fn add_member(&self, id: &str, created_at: &str) -> Result<(), PlexusError> {
        let mut user = seed_user(id, Role::Member);
        user.created_at = created_at.to_string();
        self.storage.insert_user(&user).await
    }

    /// Request and accept a connection from `a` to `b`.
    pub async fn connect(&self, a: &str, b: &str) -> Result<Connection, PlexusError> {
        let connections = self.engine.connections();
        let pending = connections.request(a, b, None).await?;
        connections.accept(&pending.id, b).await
    }
}

fn seed_user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        display_name: id.to_string(),
        email: format!("{id}@campus.example"),
        institution_id: None,
        role,
        verified: true,
        created_at: SEED_CREATED_AT.to_string(),
    }
}
