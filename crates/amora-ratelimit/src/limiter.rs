// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user request budget.
//!
//! Token-bucket semantics with batch refill: each user gets
//! `requests_per_window` tokens, refilled in full at each window
//! boundary. The counter lives in the shared store keyed by the window
//! start, so the budget is exact across instances; the key's TTL retires
//! old windows.
//!
//! Rejections feed a per-user violation counter (24h TTL). Crossing the
//! ban threshold is reported in the log; enforcement is a policy decision
//! made by the caller, not by this crate.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};

use amora_cache::keys;
use amora_config::RateLimitConfig;
use amora_core::{AmoraError, CounterStore, UserId};

/// Per-user request budget over a shared counter store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    /// Consume one token from the user's bucket for the current window.
    ///
    /// Returns `false` when the window's budget is exhausted, recording a
    /// violation as a side effect.
    pub async fn allow_action(&self, user_id: UserId) -> Result<bool, AmoraError> {
        let key = keys::request_window_key(user_id, self.current_window_start());
        let count = self.store.increment(&key).await?;
        if count == 1 {
            // Fresh window: retire the counter once the window has passed.
            self.store
                .expire(&key, Duration::from_secs(self.config.window_secs))
                .await?;
        }

        if count > i64::from(self.config.requests_per_window) {
            warn!(user_id, count, "rate limit exceeded");
            self.record_violation(user_id).await?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Number of rate-limit violations recorded for `user_id` in the last
    /// 24 hours.
    pub async fn violation_count(&self, user_id: UserId) -> Result<i64, AmoraError> {
        let value = self.store.get(&keys::violations_key(user_id)).await?;
        match value {
            Some(raw) => raw.parse().map_err(|_| AmoraError::Cache {
                message: format!("violation counter for user {user_id} holds {raw:?}"),
            }),
            None => Ok(0),
        }
    }

    /// Clear the violation counter for `user_id`.
    pub async fn reset_violations(&self, user_id: UserId) -> Result<(), AmoraError> {
        self.store.delete(&keys::violations_key(user_id)).await?;
        info!(user_id, "rate limit violations reset");
        Ok(())
    }

    async fn record_violation(&self, user_id: UserId) -> Result<(), AmoraError> {
        let key = keys::violations_key(user_id);
        let violations = self.store.increment(&key).await?;
        self.store
            .expire(
                &key,
                Duration::from_secs(self.config.violation_ttl_hours * 3600),
            )
            .await?;

        if violations >= i64::from(self.config.ban_threshold) {
            error!(
                user_id,
                violations, "user exceeded rate limit ban threshold"
            );
        }
        Ok(())
    }

    fn current_window_start(&self) -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        let window = self.config.window_secs as i64;
        now - now.rem_euclid(window)
    }
}
