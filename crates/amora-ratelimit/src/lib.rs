// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate limiting for the Amora matching backend.
//!
//! Per-user request budgets with batch refill at window boundaries, plus
//! a persistent violation counter for abuse detection.

pub mod limiter;

pub use limiter::RateLimiter;
