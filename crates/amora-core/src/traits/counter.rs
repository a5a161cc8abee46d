// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared counter/cache store abstraction.
//!
//! A Redis-shaped key/value surface with TTLs: the distributed lock
//! manager needs the atomic set-if-absent and compare-and-delete
//! primitives, the rate limiter and daily budget need `increment` +
//! `expire`, and the engine uses plain get/set for its fast-path caches.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AmoraError;

/// Shared key/value store with TTL support.
///
/// Values are strings; counters are stored as their decimal rendering.
/// A `false` answer from `exists` or a `None` from `get` may be stale
/// (an expired or evicted entry) and is always safe to treat as a cache
/// miss; implementations must never report an entry that was not written.
#[async_trait]
pub trait CounterStore: Send + Sync + 'static {
    /// Get the live value under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, AmoraError>;

    /// Set `key` to `value`, optionally with a time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>)
        -> Result<(), AmoraError>;

    /// Atomically set `key` to `value` with `ttl` only if no live entry
    /// exists. Returns `true` if the write happened.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, AmoraError>;

    /// Delete `key`. Returns `true` if a live entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, AmoraError>;

    /// Atomically delete `key` only if its live value equals `expected`.
    /// Returns `true` if the entry was removed.
    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool, AmoraError>;

    /// Atomically increment the integer counter under `key`, creating it
    /// at 1 (with no TTL) if absent. Returns the new value.
    async fn increment(&self, key: &str) -> Result<i64, AmoraError>;

    /// Set or replace the TTL of an existing entry. Returns `false` if
    /// there is no live entry under `key`.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, AmoraError>;

    /// Whether a live entry exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, AmoraError>;
}
