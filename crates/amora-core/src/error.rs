// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Amora matching backend.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Amora crates.
///
/// Each user-facing variant renders a distinct, stable message so the
/// calling layer can present actionable text without matching on strings.
#[derive(Debug, Error)]
pub enum AmoraError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable store errors (database connection, query failure, constraint churn).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Shared counter/cache store errors (unreachable backend, bad value shape).
    #[error("cache error: {message}")]
    Cache { message: String },

    /// A user attempted to swipe on themselves.
    #[error("you cannot swipe on yourself")]
    SelfSwipe,

    /// Referenced user does not exist.
    #[error("user not found: {user_id}")]
    UserNotFound { user_id: i64 },

    /// The ordered pair already has a swipe record. Terminal; re-swiping is rejected.
    #[error("you already rated this person")]
    AlreadySwiped,

    /// A super-like message exceeds the allowed length.
    #[error("message too long (max {max} characters)")]
    MessageTooLong { max: usize },

    /// The daily like budget is exhausted.
    #[error("daily like limit reached ({limit} per day)")]
    DailyLimitExceeded { limit: u32 },

    /// The per-user request budget for the current window is exhausted.
    #[error("too many requests, slow down")]
    RateLimited,

    /// The pair lock could not be acquired within the wait timeout.
    #[error("could not acquire lock {key} within {wait:?}, try again shortly")]
    LockTimeout { key: String, wait: Duration },

    /// Referenced match does not exist (or is no longer mutable).
    #[error("match not found: {match_id}")]
    MatchNotFound { match_id: i64 },

    /// The requesting user is not a participant of the match.
    #[error("user {user_id} is not part of match {match_id}")]
    Forbidden { user_id: i64, match_id: i64 },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an error, matching the handling policy each
/// kind requires at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected immediately, no side effects (self-swipe, unknown user).
    Validation,
    /// Expected, user-facing, not retried (already swiped, budget exhausted).
    Policy,
    /// Transient; the caller may re-offer the action to the user.
    Contention,
    /// Store or cache unreachable, operation aborted with no partial writes.
    Infrastructure,
}

impl AmoraError {
    /// Classify this error per the engine's handling taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AmoraError::SelfSwipe
            | AmoraError::UserNotFound { .. }
            | AmoraError::MessageTooLong { .. } => ErrorKind::Validation,
            AmoraError::AlreadySwiped
            | AmoraError::DailyLimitExceeded { .. }
            | AmoraError::RateLimited
            | AmoraError::MatchNotFound { .. }
            | AmoraError::Forbidden { .. } => ErrorKind::Policy,
            AmoraError::LockTimeout { .. } => ErrorKind::Contention,
            AmoraError::Config(_)
            | AmoraError::Storage { .. }
            | AmoraError::Cache { .. }
            | AmoraError::Internal(_) => ErrorKind::Infrastructure,
        }
    }
}
