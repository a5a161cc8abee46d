// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `amora-core::types` for use across
//! crate boundaries. This module re-exports them for convenience within
//! the storage crate.

pub use amora_core::types::{LikeEdge, Match, MatchStatus, SwipeDecision, SwipeRecord, User};
