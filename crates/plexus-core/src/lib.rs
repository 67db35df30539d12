// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Plexus engine.
//!
//! This crate provides the error taxonomy, domain types, and adapter traits
//! shared by the storage, graph, notification, and gateway crates.

pub mod best_effort;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use best_effort::BestEffort;
pub use error::PlexusError;
pub use types::{AdapterType, HealthStatus};

pub use traits::{ChannelPublisher, PluginAdapter, StorageAdapter};
