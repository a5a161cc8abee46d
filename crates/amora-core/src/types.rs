// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Amora workspace.
//!
//! Timestamps are stored and passed around as RFC 3339 strings
//! (`strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` in SQLite); only the daily
//! budget window ever needs calendar arithmetic, and that stays inside
//! the engine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a registered user.
pub type UserId = i64;

/// Identifier of a match row.
pub type MatchId = i64;

/// A user's one-time decision about another user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SwipeDecision {
    Like,
    Dislike,
    SuperLike,
}

impl SwipeDecision {
    /// Whether this decision counts against the daily like budget and
    /// produces a like edge.
    pub fn is_like(self) -> bool {
        matches!(self, SwipeDecision::Like | SwipeDecision::SuperLike)
    }
}

/// An unordered pair of users in canonical (low, high) order.
///
/// Swipes are directional but matches and pair locks are symmetric, so
/// every pair-scoped resource is keyed through this type to make lock
/// keys and uniqueness constraints order-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserPair {
    low: UserId,
    high: UserId,
}

impl UserPair {
    /// Canonicalize two user ids. The ids must be distinct.
    pub fn new(a: UserId, b: UserId) -> Self {
        debug_assert_ne!(a, b, "a pair requires two distinct users");
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn low(&self) -> UserId {
        self.low
    }

    pub fn high(&self) -> UserId {
        self.high
    }

    /// Resource name used for the pair lock, e.g. `match:3:17`.
    pub fn lock_key(&self) -> String {
        format!("match:{}:{}", self.low, self.high)
    }
}

/// A registered user. Only the fields the matching engine needs; the
/// profile itself lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub created_at: String,
}

/// Append-once record of a swipe decision, keyed by the ordered pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeRecord {
    pub id: i64,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub decision: SwipeDecision,
    pub created_at: String,
}

/// A persisted "like" edge, the subset of swipes with a positive decision.
/// Exists iff a corresponding LIKE or SUPER_LIKE swipe record exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeEdge {
    pub id: i64,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub is_super_like: bool,
    pub message: Option<String>,
    pub created_at: String,
}

/// Lifecycle state of a match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Active,
    Unmatched,
    Reported,
}

/// A confirmed match between an unordered pair of users.
///
/// Exactly one row may exist per pair; `user_low_id < user_high_id` is
/// enforced by the store. ACTIVE transitions to UNMATCHED or REPORTED
/// and is never resurrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub user_low_id: UserId,
    pub user_high_id: UserId,
    pub status: MatchStatus,
    pub unmatched_by_user_id: Option<UserId>,
    pub unmatched_at: Option<String>,
    pub created_at: String,
}

impl Match {
    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.user_low_id == user_id || self.user_high_id == user_id
    }

    /// The other participant of the match. `user_id` must be a participant.
    pub fn other_user(&self, user_id: UserId) -> Option<UserId> {
        if self.user_low_id == user_id {
            Some(self.user_high_id)
        } else if self.user_high_id == user_id {
            Some(self.user_low_id)
        } else {
            None
        }
    }
}

/// Outcome of a successful `submit_swipe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeResult {
    pub recorded: bool,
    pub matched: bool,
    pub match_id: Option<MatchId>,
}

impl SwipeResult {
    pub fn recorded() -> Self {
        Self {
            recorded: true,
            matched: false,
            match_id: None,
        }
    }

    pub fn matched(match_id: MatchId) -> Self {
        Self {
            recorded: true,
            matched: true,
            match_id: Some(match_id),
        }
    }
}

/// Read-mostly per-user aggregate, cached with a short TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingStatistics {
    pub sent_likes: i64,
    pub received_likes: i64,
    pub active_matches: i64,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn decision_round_trips_screaming_snake() {
        for (decision, text) in [
            (SwipeDecision::Like, "LIKE"),
            (SwipeDecision::Dislike, "DISLIKE"),
            (SwipeDecision::SuperLike, "SUPER_LIKE"),
        ] {
            assert_eq!(decision.to_string(), text);
            assert_eq!(SwipeDecision::from_str(text).unwrap(), decision);
        }
    }

    #[test]
    fn only_positive_decisions_are_likes() {
        assert!(SwipeDecision::Like.is_like());
        assert!(SwipeDecision::SuperLike.is_like());
        assert!(!SwipeDecision::Dislike.is_like());
    }

    #[test]
    fn pair_canonicalizes_regardless_of_order() {
        let a = UserPair::new(17, 3);
        let b = UserPair::new(3, 17);
        assert_eq!(a, b);
        assert_eq!(a.low(), 3);
        assert_eq!(a.high(), 17);
        assert_eq!(a.lock_key(), "match:3:17");
    }

    #[test]
    fn match_participant_lookup() {
        let m = Match {
            id: 1,
            user_low_id: 3,
            user_high_id: 17,
            status: MatchStatus::Active,
            unmatched_by_user_id: None,
            unmatched_at: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        };
        assert!(m.is_participant(3));
        assert!(m.is_participant(17));
        assert!(!m.is_participant(5));
        assert_eq!(m.other_user(3), Some(17));
        assert_eq!(m.other_user(17), Some(3));
        assert_eq!(m.other_user(5), None);
    }

    #[test]
    fn statistics_serialize_as_json() {
        let stats = MatchingStatistics {
            sent_likes: 4,
            received_likes: 2,
            active_matches: 1,
        };
        let json = serde_json::to_string(&stats).unwrap();
        let parsed: MatchingStatistics = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, parsed);
    }
}
