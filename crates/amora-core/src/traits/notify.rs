// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification dispatcher seam.
//!
//! Delivery is best-effort and fire-and-forget: the engine logs failures
//! and never propagates them into a swipe result.

use async_trait::async_trait;

use crate::error::AmoraError;
use crate::types::{MatchId, UserId};

/// Outbound notification dispatcher (bot/push layer).
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    /// Tell `user_id` they matched with `other_user_id`.
    async fn notify_match(
        &self,
        user_id: UserId,
        other_user_id: UserId,
        match_id: MatchId,
    ) -> Result<(), AmoraError>;

    /// Tell `user_id` that `from_user_id` liked them.
    async fn notify_like(&self, user_id: UserId, from_user_id: UserId)
        -> Result<(), AmoraError>;

    /// Tell `user_id` that `from_user_id` super-liked them.
    async fn notify_super_like(
        &self,
        user_id: UserId,
        from_user_id: UserId,
    ) -> Result<(), AmoraError>;
}

/// Sink that drops every notification. Used by operational tooling and
/// deployments without a delivery channel configured.
pub struct NullNotificationSink;

#[async_trait]
impl NotificationSink for NullNotificationSink {
    async fn notify_match(
        &self,
        _user_id: UserId,
        _other_user_id: UserId,
        _match_id: MatchId,
    ) -> Result<(), AmoraError> {
        Ok(())
    }

    async fn notify_like(
        &self,
        _user_id: UserId,
        _from_user_id: UserId,
    ) -> Result<(), AmoraError> {
        Ok(())
    }

    async fn notify_super_like(
        &self,
        _user_id: UserId,
        _from_user_id: UserId,
    ) -> Result<(), AmoraError> {
        Ok(())
    }
}
