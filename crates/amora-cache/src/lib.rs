// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared counter/cache store for the Amora matching backend.
//!
//! Provides the in-process [`MemoryStore`] implementation of
//! [`amora_core::CounterStore`] and the cache key builders used by the
//! engine, lock manager, and rate limiter.

pub mod keys;
pub mod memory;

pub use memory::MemoryStore;
