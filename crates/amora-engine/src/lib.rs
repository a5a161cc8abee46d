// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Matching engine orchestration.
//!
//! Ties the swipe ledger, like store, match store, pair locks, caches and
//! rate limits together into the public operations: submit a swipe, read
//! statistics, unmatch. All writes for a user pair are serialized through
//! the pair lock; the durable store's uniqueness constraints remain the
//! last-resort backstop when a lock self-expires mid-operation.

pub mod engine;

pub use engine::MatchingEngine;
