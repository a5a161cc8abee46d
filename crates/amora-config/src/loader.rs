// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./amora.toml` > `~/.config/amora/amora.toml` > `/etc/amora/amora.toml`
//! with environment variable overrides via `AMORA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AmoraConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/amora/amora.toml` (system-wide)
/// 3. `~/.config/amora/amora.toml` (user XDG config)
/// 4. `./amora.toml` (local directory)
/// 5. `AMORA_*` environment variables
pub fn load_config() -> Result<AmoraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AmoraConfig::default()))
        .merge(Toml::file("/etc/amora/amora.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("amora/amora.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("amora.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<AmoraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AmoraConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AmoraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AmoraConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `AMORA_MATCHING_MAX_DAILY_LIKES`
/// must map to `matching.max_daily_likes`, not `matching.max.daily.likes`.
fn env_provider() -> Env {
    Env::prefixed("AMORA_").map(|key| {
        // `key` arrives in the env var's original case with the prefix
        // stripped: AMORA_MATCHING_MAX_DAILY_LIKES -> "MATCHING_MAX_DAILY_LIKES".
        let mapped = key
            .as_str()
            .to_ascii_lowercase()
            .replacen("service_", "service.", 1)
            .replacen("matching_", "matching.", 1)
            .replacen("lock_", "lock.", 1)
            .replacen("rate_limit_", "rate_limit.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}
