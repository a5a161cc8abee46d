// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Amora matching backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Amora configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AmoraConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Matching engine budgets and cache TTLs.
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Distributed pair-lock timeouts.
    #[serde(default)]
    pub lock: LockConfig,

    /// Per-user request rate limits.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "amora".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Matching engine configuration: daily budget and cache TTLs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    /// Maximum likes (including super-likes) a user may send per day.
    #[serde(default = "default_max_daily_likes")]
    pub max_daily_likes: u32,

    /// Offset of the local day boundary from UTC, in hours. The daily
    /// like budget resets at local midnight.
    #[serde(default)]
    pub day_offset_hours: i32,

    /// TTL for cached "swipe exists" facts, in days. Generous because the
    /// underlying fact is permanent.
    #[serde(default = "default_swipe_cache_ttl_days")]
    pub swipe_cache_ttl_days: u64,

    /// TTL for cached "like exists" facts, in days.
    #[serde(default = "default_like_cache_ttl_days")]
    pub like_cache_ttl_days: u64,

    /// TTL for the cached per-user statistics aggregate, in seconds.
    #[serde(default = "default_stats_cache_ttl_secs")]
    pub stats_cache_ttl_secs: u64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_daily_likes: default_max_daily_likes(),
            day_offset_hours: 0,
            swipe_cache_ttl_days: default_swipe_cache_ttl_days(),
            like_cache_ttl_days: default_like_cache_ttl_days(),
            stats_cache_ttl_secs: default_stats_cache_ttl_secs(),
        }
    }
}

fn default_max_daily_likes() -> u32 {
    100
}

fn default_swipe_cache_ttl_days() -> u64 {
    7
}

fn default_like_cache_ttl_days() -> u64 {
    30
}

fn default_stats_cache_ttl_secs() -> u64 {
    300 // 5 minutes
}

/// Distributed pair-lock configuration.
///
/// `hold_timeout_secs` must be comfortably longer than the expected
/// critical-section duration; a crashed holder is evicted by TTL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LockConfig {
    /// Lock self-expiry, in seconds.
    #[serde(default = "default_hold_timeout_secs")]
    pub hold_timeout_secs: u64,

    /// Maximum time to wait for a contended lock, in seconds.
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Interval between acquisition attempts, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            hold_timeout_secs: default_hold_timeout_secs(),
            wait_timeout_secs: default_wait_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_hold_timeout_secs() -> u64 {
    10
}

fn default_wait_timeout_secs() -> u64 {
    5
}

fn default_poll_interval_ms() -> u64 {
    50
}

/// Per-user request rate limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Requests allowed per window per user.
    #[serde(default = "default_requests_per_window")]
    pub requests_per_window: u32,

    /// Window length in seconds. The budget refills in full at each
    /// window boundary.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Violation count at which abuse is reported. Report-only; crossing
    /// the threshold does not block matching logic.
    #[serde(default = "default_ban_threshold")]
    pub ban_threshold: u32,

    /// TTL of the per-user violation counter, in hours.
    #[serde(default = "default_violation_ttl_hours")]
    pub violation_ttl_hours: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: default_requests_per_window(),
            window_secs: default_window_secs(),
            ban_threshold: default_ban_threshold(),
            violation_ttl_hours: default_violation_ttl_hours(),
        }
    }
}

fn default_requests_per_window() -> u32 {
    30
}

fn default_window_secs() -> u64 {
    60
}

fn default_ban_threshold() -> u32 {
    1000
}

fn default_violation_ttl_hours() -> u64 {
    24
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
        .map(|p| p.join("amora").join("amora.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("amora.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}
