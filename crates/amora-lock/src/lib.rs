// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Distributed lock manager for the Amora matching backend.
//!
//! Mutual exclusion on a named resource across processes, with bounded
//! wait, self-expiry, and token-proven release. The matching engine uses
//! it to serialize the two directions of a user pair.

pub mod manager;

pub use manager::{LockManager, LockToken};
