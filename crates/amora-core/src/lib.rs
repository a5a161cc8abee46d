// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Amora matching backend.
//!
//! This crate provides the error type, domain types, and the collaborator
//! traits (shared counter store, notification dispatcher) used throughout
//! the Amora workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{AmoraError, ErrorKind};
pub use traits::{CounterStore, NotificationSink, NullNotificationSink};
pub use types::{
    LikeEdge, Match, MatchId, MatchStatus, MatchingStatistics, SwipeDecision, SwipeRecord,
    SwipeResult, User, UserId, UserPair,
};
