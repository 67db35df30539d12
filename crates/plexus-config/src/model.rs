// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Plexus engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Plexus configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlexusConfig {
    /// Process-level settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP/WebSocket gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Feed pagination settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Notification dispatch settings.
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Content size limits.
    #[serde(default)]
    pub content: ContentConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("plexus").join("plexus.db"))
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "plexus.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Gateway (HTTP + WebSocket) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Outbound buffer per live WebSocket session. A full buffer drops pushes.
    #[serde(default = "default_session_buffer")]
    pub session_buffer: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_buffer: default_session_buffer(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3100
}

fn default_session_buffer() -> usize {
    64
}

/// Feed pagination configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    /// Page size when the caller does not ask for one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper bound on caller-requested page sizes.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl FeedConfig {
    /// Clamp a requested page size into `1..=max_page_size`.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    100
}

/// Notification dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    /// Push dispatched notifications to live sessions. Rows are always persisted.
    #[serde(default = "default_realtime_enabled")]
    pub realtime_enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            realtime_enabled: default_realtime_enabled(),
        }
    }
}

fn default_realtime_enabled() -> bool {
    true
}

/// Content size limits (in characters).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContentConfig {
    /// Maximum length of a post, comment, or message body.
    #[serde(default = "default_max_body_len")]
    pub max_body_len: usize,

    /// Maximum length of the optional note attached to a connection request.
    #[serde(default = "default_max_connection_message_len")]
    pub max_connection_message_len: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_body_len: default_max_body_len(),
            max_connection_message_len: default_max_connection_message_len(),
        }
    }
}

fn default_max_body_len() -> usize {
    5000
}

fn default_max_connection_message_len() -> usize {
    500
}
