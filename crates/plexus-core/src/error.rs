// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Plexus engine.

use thiserror::Error;

/// The primary error type used across all Plexus adapter traits and engine operations.
#[derive(Debug, Error)]
pub enum PlexusError {
    /// Malformed or missing input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist (or is not visible to the caller).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Duplicate connection request or an already-resolved connection.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The actor is not allowed to perform the operation.
    #[error("not authorized: {0}")]
    Authorization(String),

    /// A store uniqueness constraint rejected an insert.
    ///
    /// Callers convert this into the benign outcome for their operation;
    /// it is never returned raw from an engine operation.
    #[error("{entity} already exists")]
    AlreadyExists { entity: &'static str },

    /// Real-time push failure. Logged and discarded by the dispatcher.
    #[error("delivery failed: {message}")]
    TransientDelivery { message: String },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PlexusError {
    /// Shorthand for a [`PlexusError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Returns true for errors the caller caused (4xx-style).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound { .. }
                | Self::Conflict(_)
                | Self::Authorization(_)
                | Self::AlreadyExists { .. }
        )
    }
}
