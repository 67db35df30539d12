// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./plexus.toml` > `~/.config/plexus/plexus.toml` > `/etc/plexus/plexus.toml`
//! with environment variable overrides via `PLEXUS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PlexusConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/plexus/plexus.toml` (system-wide)
/// 3. `~/.config/plexus/plexus.toml` (user XDG config)
/// 4. `./plexus.toml` (local directory)
/// 5. `PLEXUS_*` environment variables
pub fn load_config() -> Result<PlexusConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PlexusConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlexusConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PlexusConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlexusConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PlexusConfig::default()))
        .merge(Toml::file("/etc/plexus/plexus.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("plexus/plexus.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("plexus.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `PLEXUS_STORAGE_DATABASE_PATH`
/// must map to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("PLEXUS_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config key.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 6] = [
        "server",
        "storage",
        "gateway",
        "feed",
        "notifications",
        "content",
    ];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
