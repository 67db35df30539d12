// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express:
//! non-empty paths and hosts, non-zero ports and buffers, coherent page sizes.

use crate::diagnostic::ConfigError;
use crate::model::PlexusConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PlexusConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        fail(format!(
            "server.log_level `{}` must be one of {}",
            config.server.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.gateway.port == 0 {
        fail("gateway.port must not be 0".to_string());
    }

    if config.gateway.session_buffer == 0 {
        fail("gateway.session_buffer must be at least 1".to_string());
    }

    if config.feed.max_page_size == 0 {
        fail("feed.max_page_size must be at least 1".to_string());
    }

    if config.feed.default_page_size == 0
        || config.feed.default_page_size > config.feed.max_page_size
    {
        fail(format!(
            "feed.default_page_size must be between 1 and feed.max_page_size ({}), got {}",
            config.feed.max_page_size, config.feed.default_page_size
        ));
    }

    if config.content.max_body_len == 0 {
        fail("content.max_body_len must be at least 1".to_string());
    }

    if config.content.max_connection_message_len == 0 {
        fail("content.max_connection_message_len must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
