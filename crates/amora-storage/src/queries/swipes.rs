// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Swipe ledger queries.
//!
//! The ledger is append-once per ordered (from, to) pair, enforced by the
//! `uk_swipe_from_to` constraint. A positive decision also writes the like
//! edge, and a mutual like its match row, in the same transaction so the
//! ledger, like store, and match store never diverge.

use std::str::FromStr;

use amora_core::types::{LikeEdge, SwipeDecision, SwipeRecord, UserId};
use amora_core::AmoraError;

use crate::database::{is_unique_violation, map_tr_err, Database};
use crate::queries::matches::{insert_if_absent, MatchUpsert};

/// Outcome of a swipe write attempt.
#[derive(Debug)]
pub enum SwipeWrite {
    /// The swipe (and like edge, for positive decisions) was recorded.
    Recorded {
        swipe: SwipeRecord,
        like: Option<LikeEdge>,
        /// The match row for the pair when this like completed a mutual
        /// like: `created` distinguishes a fresh match from a pre-existing
        /// (possibly closed) one.
        matched: Option<MatchUpsert>,
    },
    /// An earlier swipe for this ordered pair already exists.
    Duplicate,
}

/// Record a swipe atomically. For positive decisions the like edge is
/// written in the same transaction, the reciprocal like is checked, and a
/// mutual like gets its match row before the commit, so a crash can never
/// leave a mutually-liked pair without a match. Returns
/// [`SwipeWrite::Duplicate`] when either row already exists; the
/// transaction rolls back in that case.
pub async fn record_swipe(
    db: &Database,
    from: UserId,
    to: UserId,
    decision: SwipeDecision,
    message: Option<String>,
) -> Result<SwipeWrite, AmoraError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let inserted = tx.query_row(
                "INSERT INTO swipes (from_user_id, to_user_id, decision)
                 VALUES (?1, ?2, ?3)
                 RETURNING id, created_at",
                rusqlite::params![from, to, decision.to_string()],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            );
            let (swipe_id, swipe_created_at) = match inserted {
                Ok(pair) => pair,
                Err(e) if is_unique_violation(&e) => return Ok(SwipeWrite::Duplicate),
                Err(e) => return Err(e.into()),
            };

            let like = if decision.is_like() {
                let inserted = tx.query_row(
                    "INSERT INTO likes (from_user_id, to_user_id, is_super_like, message)
                     VALUES (?1, ?2, ?3, ?4)
                     RETURNING id, created_at",
                    rusqlite::params![
                        from,
                        to,
                        decision == SwipeDecision::SuperLike,
                        message
                    ],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
                );
                match inserted {
                    Ok((like_id, like_created_at)) => Some(LikeEdge {
                        id: like_id,
                        from_user_id: from,
                        to_user_id: to,
                        is_super_like: decision == SwipeDecision::SuperLike,
                        message: message.clone(),
                        created_at: like_created_at,
                    }),
                    Err(e) if is_unique_violation(&e) => return Ok(SwipeWrite::Duplicate),
                    Err(e) => return Err(e.into()),
                }
            } else {
                None
            };

            let matched = if like.is_some() {
                let reciprocal = tx.query_row(
                    "SELECT EXISTS(
                         SELECT 1 FROM likes WHERE from_user_id = ?1 AND to_user_id = ?2
                     )",
                    [to, from],
                    |row| row.get::<_, bool>(0),
                )?;
                if reciprocal {
                    let (low, high) = if from < to { (from, to) } else { (to, from) };
                    Some(insert_if_absent(&tx, low, high)?)
                } else {
                    None
                }
            } else {
                None
            };

            tx.commit()?;
            Ok(SwipeWrite::Recorded {
                swipe: SwipeRecord {
                    id: swipe_id,
                    from_user_id: from,
                    to_user_id: to,
                    decision,
                    created_at: swipe_created_at,
                },
                like,
                matched,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Whether a swipe exists for the ordered pair.
pub async fn swipe_exists(db: &Database, from: UserId, to: UserId) -> Result<bool, AmoraError> {
    db.connection()
        .call(move |conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM swipes WHERE from_user_id = ?1 AND to_user_id = ?2
                 )",
                [from, to],
                |row| row.get::<_, bool>(0),
            )?;
            Ok(exists)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a swipe record for the ordered pair, if present.
pub async fn get_swipe(
    db: &Database,
    from: UserId,
    to: UserId,
) -> Result<Option<SwipeRecord>, AmoraError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, from_user_id, to_user_id, decision, created_at
                 FROM swipes WHERE from_user_id = ?1 AND to_user_id = ?2",
            )?;
            let record = stmt
                .query_row([from, to], row_to_swipe)
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            Ok(record)
        })
        .await
        .map_err(map_tr_err)
}

/// User ids the given user should not see again in discovery: anyone liked
/// within `like_cutoff` or disliked within `dislike_cutoff` (both RFC 3339
/// UTC timestamps), plus anyone already matched with.
pub async fn excluded_user_ids(
    db: &Database,
    from: UserId,
    like_cutoff: String,
    dislike_cutoff: String,
) -> Result<Vec<UserId>, AmoraError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT to_user_id FROM swipes
                 WHERE from_user_id = ?1
                   AND (
                     (decision IN ('LIKE', 'SUPER_LIKE') AND created_at >= ?2)
                     OR (decision = 'DISLIKE' AND created_at >= ?3)
                   )
                 UNION
                 SELECT CASE WHEN user_low_id = ?1 THEN user_high_id ELSE user_low_id END
                 FROM matches
                 WHERE (user_low_id = ?1 OR user_high_id = ?1)
                 ORDER BY 1",
            )?;
            let rows = stmt.query_map(
                rusqlite::params![from, like_cutoff, dislike_cutoff],
                |row| row.get(0),
            )?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(row?);
            }
            Ok(ids)
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_swipe(row: &rusqlite::Row<'_>) -> Result<SwipeRecord, rusqlite::Error> {
    let decision: String = row.get(3)?;
    let decision = SwipeDecision::from_str(&decision).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;
    Ok(SwipeRecord {
        id: row.get(0)?,
        from_user_id: row.get(1)?,
        to_user_id: row.get(2)?,
        decision,
        created_at: row.get(4)?,
    })
}
