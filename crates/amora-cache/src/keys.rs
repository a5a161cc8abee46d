// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache key builders.
//!
//! All keys used against the shared counter store are built here so the
//! namespace stays in one place. Swipe and like keys are keyed by the
//! ordered pair; statistics and budget keys by user.

use amora_core::UserId;
use chrono::NaiveDate;

/// Fast-path fact: a swipe record exists for the ordered pair.
pub fn swipe_key(from_user_id: UserId, to_user_id: UserId) -> String {
    format!("matching:swipe:{from_user_id}:{to_user_id}")
}

/// Fast-path fact: a like edge exists for the ordered pair.
pub fn like_key(from_user_id: UserId, to_user_id: UserId) -> String {
    format!("matching:like:{from_user_id}:{to_user_id}")
}

/// Cached per-user statistics aggregate (JSON).
pub fn stats_key(user_id: UserId) -> String {
    format!("matching:stats:{user_id}")
}

/// Daily like budget counter, scoped to the local calendar date.
pub fn daily_likes_key(user_id: UserId, date: NaiveDate) -> String {
    format!("matching:likes:daily:{user_id}:{date}")
}

/// Rate-limit violation counter (24h TTL).
pub fn violations_key(user_id: UserId) -> String {
    format!("rate_limit:violations:{user_id}")
}

/// Request counter for the rate-limit window starting at `window_start`
/// (unix seconds).
pub fn request_window_key(user_id: UserId, window_start: i64) -> String {
    format!("rate_limit:requests:{user_id}:{window_start}")
}
