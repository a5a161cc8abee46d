// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The matching engine.
//!
//! `submit_swipe` is the hot path. Cheap rejections (self-swipe, rate
//! limit, unknown users, exhausted daily budget, cached duplicate) run
//! before the pair lock is taken; everything that writes runs inside it.
//! Notifications are dispatched after the lock is released and are never
//! allowed to fail the swipe.

use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use tracing::{debug, info, warn};

use amora_cache::keys;
use amora_config::{AmoraConfig, MatchingConfig};
use amora_core::types::{
    LikeEdge, Match, MatchId, MatchStatus, MatchingStatistics, SwipeDecision, SwipeResult,
    UserId, UserPair,
};
use amora_core::{AmoraError, CounterStore, NotificationSink};
use amora_lock::LockManager;
use amora_ratelimit::RateLimiter;
use amora_storage::queries::swipes::SwipeWrite;
use amora_storage::queries::{likes, matches, swipes, users};
use amora_storage::Database;

/// Maximum length of a super-like message, in characters.
pub const MAX_LIKE_MESSAGE_LEN: usize = 500;

/// How long a liked profile stays out of a user's discovery feed.
const LIKE_EXCLUSION: Duration = Duration::from_secs(24 * 3600);

/// How long a disliked profile stays out of a user's discovery feed.
const DISLIKE_EXCLUSION: Duration = Duration::from_secs(4 * 24 * 3600);

/// Timestamp rendering that collates correctly against the store's
/// millisecond-precision `created_at` strings.
const TIMESTAMP_FMT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// The daily like budget's current window: local calendar date, its start
/// rendered as a UTC timestamp, and time remaining until local midnight.
struct BudgetWindow {
    date: NaiveDate,
    day_start_utc: String,
    ttl: Duration,
}

/// Orchestrates swipes, matches and statistics over the storage, cache,
/// lock and rate-limit layers.
#[derive(Clone)]
pub struct MatchingEngine {
    storage: Arc<Database>,
    cache: Arc<dyn CounterStore>,
    locks: LockManager,
    limiter: RateLimiter,
    notifier: Arc<dyn NotificationSink>,
    config: MatchingConfig,
}

impl MatchingEngine {
    pub fn new(
        storage: Arc<Database>,
        cache: Arc<dyn CounterStore>,
        locks: LockManager,
        limiter: RateLimiter,
        notifier: Arc<dyn NotificationSink>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            storage,
            cache,
            locks,
            limiter,
            notifier,
            config,
        }
    }

    /// Build an engine from a loaded configuration, with the lock manager
    /// and rate limiter sharing the given counter store.
    pub fn from_config(
        config: &AmoraConfig,
        storage: Arc<Database>,
        cache: Arc<dyn CounterStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let locks = LockManager::new(Arc::clone(&cache), config.lock.clone());
        let limiter = RateLimiter::new(Arc::clone(&cache), config.rate_limit.clone());
        Self::new(
            storage,
            cache,
            locks,
            limiter,
            notifier,
            config.matching.clone(),
        )
    }

    /// Record `from`'s decision about `to`, creating a match when the like
    /// is mutual.
    ///
    /// Exactly one swipe may ever exist per ordered pair. The pair lock
    /// serializes the two directions, so a concurrent mutual like yields
    /// exactly one match; the store's uniqueness constraints back this up
    /// if the lock self-expires mid-write.
    pub async fn submit_swipe(
        &self,
        from: UserId,
        to: UserId,
        decision: SwipeDecision,
        message: Option<String>,
    ) -> Result<SwipeResult, AmoraError> {
        if from == to {
            return Err(AmoraError::SelfSwipe);
        }
        if !self.limiter.allow_action(from).await? {
            return Err(AmoraError::RateLimited);
        }
        if let Some(msg) = &message {
            if msg.chars().count() > MAX_LIKE_MESSAGE_LEN {
                return Err(AmoraError::MessageTooLong {
                    max: MAX_LIKE_MESSAGE_LEN,
                });
            }
        }
        for user_id in [from, to] {
            if !users::user_exists(&self.storage, user_id).await? {
                return Err(AmoraError::UserNotFound { user_id });
            }
        }

        let window = self.budget_window();
        if decision.is_like() {
            let used = self.daily_likes_used(from, &window).await?;
            if used >= i64::from(self.config.max_daily_likes) {
                return Err(AmoraError::DailyLimitExceeded {
                    limit: self.config.max_daily_likes,
                });
            }
        }

        // Fast-path duplicate check; the durable ledger is re-checked
        // under the lock.
        if self.cache.exists(&keys::swipe_key(from, to)).await? {
            return Err(AmoraError::AlreadySwiped);
        }

        let pair = UserPair::new(from, to);
        let (result, newly_matched) = self
            .locks
            .with_lock(&pair.lock_key(), move || async move {
                self.swipe_locked(pair, from, to, decision, message, &window)
                    .await
            })
            .await?;

        self.dispatch_notifications(from, to, decision, &result, newly_matched)
            .await;
        Ok(result)
    }

    /// The critical section of `submit_swipe`. Runs with the pair lock held.
    async fn swipe_locked(
        &self,
        pair: UserPair,
        from: UserId,
        to: UserId,
        decision: SwipeDecision,
        message: Option<String>,
        window: &BudgetWindow,
    ) -> Result<(SwipeResult, bool), AmoraError> {
        if swipes::swipe_exists(&self.storage, from, to).await? {
            return Err(AmoraError::AlreadySwiped);
        }

        // The swipe, like edge, reciprocity check and match row all commit
        // in one storage transaction.
        let write = swipes::record_swipe(&self.storage, from, to, decision, message).await?;
        let (like, matched) = match write {
            SwipeWrite::Recorded { like, matched, .. } => (like, matched),
            // Lost a race against an expired-lock writer; the ledger won.
            SwipeWrite::Duplicate => return Err(AmoraError::AlreadySwiped),
        };

        if like.is_some() {
            let key = keys::daily_likes_key(from, window.date);
            let count = self.cache.increment(&key).await?;
            if count == 1 {
                self.cache.expire(&key, window.ttl).await?;
            }
        }

        self.populate_caches(from, to, like.as_ref()).await?;

        let mut result = SwipeResult::recorded();
        let mut newly_matched = false;
        if let Some(upsert) = matched {
            if upsert.record.status == MatchStatus::Active {
                result = SwipeResult::matched(upsert.record.id);
                newly_matched = upsert.created;
                if upsert.created {
                    info!(
                        match_id = upsert.record.id,
                        user_low = pair.low(),
                        user_high = pair.high(),
                        "match created"
                    );
                }
                // A reader may have re-cached statistics while the earlier
                // invalidation and this match landed; drop them again.
                self.invalidate_stats(pair.low(), pair.high()).await?;
            } else {
                debug!(
                    user_low = pair.low(),
                    user_high = pair.high(),
                    status = %upsert.record.status,
                    "mutual like on a closed pair, match not resurrected"
                );
            }
        }
        Ok((result, newly_matched))
    }

    /// Per-user statistics, served from cache when fresh.
    pub async fn get_statistics(&self, user_id: UserId) -> Result<MatchingStatistics, AmoraError> {
        if !users::user_exists(&self.storage, user_id).await? {
            return Err(AmoraError::UserNotFound { user_id });
        }

        let key = keys::stats_key(user_id);
        if let Some(raw) = self.cache.get(&key).await? {
            match serde_json::from_str(&raw) {
                Ok(stats) => return Ok(stats),
                Err(e) => {
                    warn!(user_id, error = %e, "discarding malformed cached statistics")
                }
            }
        }

        let stats = MatchingStatistics {
            sent_likes: likes::count_sent(&self.storage, user_id).await? as i64,
            received_likes: likes::count_received(&self.storage, user_id).await? as i64,
            active_matches: matches::count_active(&self.storage, user_id).await? as i64,
        };
        let json = serde_json::to_string(&stats)
            .map_err(|e| AmoraError::Internal(format!("statistics encoding: {e}")))?;
        self.cache
            .set(
                &key,
                &json,
                Some(Duration::from_secs(self.config.stats_cache_ttl_secs)),
            )
            .await?;
        Ok(stats)
    }

    /// Close an ACTIVE match on behalf of one of its participants.
    ///
    /// A match that does not exist, or is no longer ACTIVE, reports
    /// `MatchNotFound`; a caller who is not a participant gets `Forbidden`
    /// without learning the match's status.
    pub async fn unmatch(&self, user_id: UserId, match_id: MatchId) -> Result<(), AmoraError> {
        let record = matches::find_by_id(&self.storage, match_id)
            .await?
            .ok_or(AmoraError::MatchNotFound { match_id })?;
        if !record.is_participant(user_id) {
            return Err(AmoraError::Forbidden { user_id, match_id });
        }
        if record.status != MatchStatus::Active {
            return Err(AmoraError::MatchNotFound { match_id });
        }

        if !matches::unmatch(&self.storage, match_id, user_id).await? {
            // Someone else closed it between the read and the update.
            return Err(AmoraError::MatchNotFound { match_id });
        }

        self.invalidate_stats(record.user_low_id, record.user_high_id)
            .await?;
        info!(match_id, user_id, "match closed");
        Ok(())
    }

    /// ACTIVE matches the user participates in, newest first.
    pub async fn active_matches(
        &self,
        user_id: UserId,
        limit: Option<i64>,
    ) -> Result<Vec<Match>, AmoraError> {
        matches::active_matches(&self.storage, user_id, limit).await
    }

    /// Whether the two users currently have an ACTIVE match.
    pub async fn has_match(&self, a: UserId, b: UserId) -> Result<bool, AmoraError> {
        if a == b {
            return Ok(false);
        }
        matches::has_active(&self.storage, UserPair::new(a, b)).await
    }

    /// Like edges received by the user, optionally only those within the
    /// given lookback, newest first.
    pub async fn received_likes(
        &self,
        user_id: UserId,
        within: Option<Duration>,
    ) -> Result<Vec<LikeEdge>, AmoraError> {
        let since = within.map(cutoff);
        likes::received_since(&self.storage, user_id, since).await
    }

    /// User ids to keep out of the user's discovery feed: recent likes,
    /// recent dislikes and everyone they ever matched with.
    pub async fn excluded_user_ids(&self, user_id: UserId) -> Result<Vec<UserId>, AmoraError> {
        swipes::excluded_user_ids(
            &self.storage,
            user_id,
            cutoff(LIKE_EXCLUSION),
            cutoff(DISLIKE_EXCLUSION),
        )
        .await
    }

    /// Rate-limit violations recorded for the user in the last 24 hours.
    pub async fn rate_violations(&self, user_id: UserId) -> Result<i64, AmoraError> {
        self.limiter.violation_count(user_id).await
    }

    /// Clear the user's rate-limit violation counter.
    pub async fn reset_rate_violations(&self, user_id: UserId) -> Result<(), AmoraError> {
        self.limiter.reset_violations(user_id).await
    }

    /// Likes sent by the user in the current budget window, seeding the
    /// counter from the like store when the cache entry is gone.
    async fn daily_likes_used(
        &self,
        user_id: UserId,
        window: &BudgetWindow,
    ) -> Result<i64, AmoraError> {
        let key = keys::daily_likes_key(user_id, window.date);
        if let Some(raw) = self.cache.get(&key).await? {
            match raw.parse() {
                Ok(used) => return Ok(used),
                Err(_) => {
                    warn!(user_id, raw, "discarding malformed daily budget counter")
                }
            }
        }

        let used = likes::count_sent_since(&self.storage, user_id, window.day_start_utc.clone())
            .await? as i64;
        self.cache
            .set(&key, &used.to_string(), Some(window.ttl))
            .await?;
        Ok(used)
    }

    async fn populate_caches(
        &self,
        from: UserId,
        to: UserId,
        like: Option<&LikeEdge>,
    ) -> Result<(), AmoraError> {
        let swipe_ttl = Duration::from_secs(self.config.swipe_cache_ttl_days * 86_400);
        self.cache
            .set(&keys::swipe_key(from, to), "1", Some(swipe_ttl))
            .await?;
        if like.is_some() {
            let like_ttl = Duration::from_secs(self.config.like_cache_ttl_days * 86_400);
            self.cache
                .set(&keys::like_key(from, to), "1", Some(like_ttl))
                .await?;
        }
        self.invalidate_stats(from, to).await
    }

    async fn invalidate_stats(&self, a: UserId, b: UserId) -> Result<(), AmoraError> {
        self.cache.delete(&keys::stats_key(a)).await?;
        self.cache.delete(&keys::stats_key(b)).await?;
        Ok(())
    }

    /// Best-effort delivery; failures are logged and never surfaced.
    async fn dispatch_notifications(
        &self,
        from: UserId,
        to: UserId,
        decision: SwipeDecision,
        result: &SwipeResult,
        newly_matched: bool,
    ) {
        if newly_matched {
            if let Some(match_id) = result.match_id {
                for (user, other) in [(from, to), (to, from)] {
                    if let Err(e) = self.notifier.notify_match(user, other, match_id).await {
                        warn!(user, match_id, error = %e, "match notification failed");
                    }
                }
            }
            return;
        }
        if !result.matched && decision.is_like() {
            let sent = match decision {
                SwipeDecision::SuperLike => self.notifier.notify_super_like(to, from).await,
                _ => self.notifier.notify_like(to, from).await,
            };
            if let Err(e) = sent {
                warn!(user = to, from, error = %e, "like notification failed");
            }
        }
    }

    fn day_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.config.day_offset_hours * 3600).unwrap_or(Utc.fix())
    }

    fn budget_window(&self) -> BudgetWindow {
        let offset = self.day_offset();
        let now_local = Utc::now().with_timezone(&offset);
        let date = now_local.date_naive();

        let day_start_utc = offset
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .single()
            .map(|dt| dt.with_timezone(&Utc).format(TIMESTAMP_FMT).to_string())
            .unwrap_or_else(|| Utc::now().format(TIMESTAMP_FMT).to_string());

        let ttl = date
            .succ_opt()
            .map(|next| next.and_time(NaiveTime::MIN) - now_local.naive_local())
            .and_then(|delta| delta.to_std().ok())
            .unwrap_or(Duration::from_secs(86_400))
            .max(Duration::from_secs(1));

        BudgetWindow {
            date,
            day_start_utc,
            ttl,
        }
    }
}

/// RFC 3339 UTC timestamp `lookback` ago, for `created_at` comparisons.
fn cutoff(lookback: Duration) -> String {
    let lookback = chrono::Duration::from_std(lookback).unwrap_or(chrono::Duration::zero());
    (Utc::now() - lookback).format(TIMESTAMP_FMT).to_string()
}
