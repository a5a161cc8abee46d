// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the Amora collaborator seams.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod counter;
pub mod notify;

pub use counter::CounterStore;
pub use notify::{NotificationSink, NullNotificationSink};
