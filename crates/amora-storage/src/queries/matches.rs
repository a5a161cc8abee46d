// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Match store queries.
//!
//! Matches are keyed by the canonical (low, high) pair with a uniqueness
//! constraint, so at most one match row ever exists per pair regardless of
//! which direction completed the mutual like.

use std::str::FromStr;

use tracing::debug;

use amora_core::types::{Match, MatchId, MatchStatus, UserId, UserPair};
use amora_core::AmoraError;

use crate::database::{is_unique_violation, map_tr_err, Database};

/// Outcome of [`create_if_absent`].
#[derive(Debug)]
pub struct MatchUpsert {
    pub record: Match,
    /// False when the row already existed (any status).
    pub created: bool,
}

/// Insert an ACTIVE match row for the canonical pair unless one already
/// exists, on the caller's connection (or transaction).
///
/// On a uniqueness conflict the existing row is returned as-is: a pair that
/// was unmatched stays unmatched. This runs inside the swipe transaction so
/// a mutual like and its match commit together.
pub(crate) fn insert_if_absent(
    conn: &rusqlite::Connection,
    low: UserId,
    high: UserId,
) -> Result<MatchUpsert, rusqlite::Error> {
    let inserted = conn.query_row(
        "INSERT INTO matches (user_low_id, user_high_id)
         VALUES (?1, ?2)
         RETURNING id, user_low_id, user_high_id, status,
                   unmatched_by_user_id, unmatched_at, created_at",
        [low, high],
        row_to_match,
    );
    match inserted {
        Ok(record) => Ok(MatchUpsert {
            record,
            created: true,
        }),
        Err(e) if is_unique_violation(&e) => {
            debug!(low, high, "match already exists for pair");
            let record = conn.query_row(
                "SELECT id, user_low_id, user_high_id, status,
                        unmatched_by_user_id, unmatched_at, created_at
                 FROM matches WHERE user_low_id = ?1 AND user_high_id = ?2",
                [low, high],
                row_to_match,
            )?;
            Ok(MatchUpsert {
                record,
                created: false,
            })
        }
        Err(e) => Err(e),
    }
}

/// Create an ACTIVE match for the pair unless a row for it already exists.
pub async fn create_if_absent(db: &Database, pair: UserPair) -> Result<MatchUpsert, AmoraError> {
    let (low, high) = (pair.low(), pair.high());
    db.connection()
        .call(move |conn| {
            let upsert = insert_if_absent(conn, low, high)?;
            Ok(upsert)
        })
        .await
        .map_err(map_tr_err)
}

/// Look up a match by id.
pub async fn find_by_id(db: &Database, match_id: MatchId) -> Result<Option<Match>, AmoraError> {
    db.connection()
        .call(move |conn| {
            let record = conn
                .query_row(
                    "SELECT id, user_low_id, user_high_id, status,
                            unmatched_by_user_id, unmatched_at, created_at
                     FROM matches WHERE id = ?1",
                    [match_id],
                    row_to_match,
                )
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

/// Look up the match row for a canonical pair, whatever its status.
pub async fn find_by_pair(db: &Database, pair: UserPair) -> Result<Option<Match>, AmoraError> {
    let (low, high) = (pair.low(), pair.high());
    db.connection()
        .call(move |conn| {
            let record = conn
                .query_row(
                    "SELECT id, user_low_id, user_high_id, status,
                            unmatched_by_user_id, unmatched_at, created_at
                     FROM matches WHERE user_low_id = ?1 AND user_high_id = ?2",
                    [low, high],
                    row_to_match,
                )
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

/// Whether an ACTIVE match exists for the pair.
pub async fn has_active(db: &Database, pair: UserPair) -> Result<bool, AmoraError> {
    let (low, high) = (pair.low(), pair.high());
    db.connection()
        .call(move |conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM matches
                     WHERE user_low_id = ?1 AND user_high_id = ?2 AND status = 'ACTIVE'
                 )",
                [low, high],
                |row| row.get::<_, bool>(0),
            )?;
            Ok(exists)
        })
        .await
        .map_err(map_tr_err)
}

/// ACTIVE matches a user participates in, newest first.
pub async fn active_matches(
    db: &Database,
    user_id: UserId,
    limit: Option<i64>,
) -> Result<Vec<Match>, AmoraError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_low_id, user_high_id, status,
                        unmatched_by_user_id, unmatched_at, created_at
                 FROM matches
                 WHERE (user_low_id = ?1 OR user_high_id = ?1) AND status = 'ACTIVE'
                 ORDER BY created_at DESC, id DESC
                 LIMIT COALESCE(?2, -1)",
            )?;
            let rows = stmt.query_map(rusqlite::params![user_id, limit], row_to_match)?;
            let mut matches = Vec::new();
            for row in rows {
                matches.push(row?);
            }
            Ok(matches)
        })
        .await
        .map_err(map_tr_err)
}

/// Count of ACTIVE matches for a user.
pub async fn count_active(db: &Database, user_id: UserId) -> Result<u64, AmoraError> {
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM matches
                 WHERE (user_low_id = ?1 OR user_high_id = ?1) AND status = 'ACTIVE'",
                [user_id],
                |row| row.get::<_, i64>(0),
            )?;
            Ok(count as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Transition an ACTIVE match to UNMATCHED, recording who did it and when.
/// Returns false when the row is missing or not ACTIVE.
pub async fn unmatch(
    db: &Database,
    match_id: MatchId,
    by_user: UserId,
) -> Result<bool, AmoraError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE matches
                 SET status = 'UNMATCHED',
                     unmatched_by_user_id = ?2,
                     unmatched_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'ACTIVE'",
                [match_id, by_user],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_match(row: &rusqlite::Row<'_>) -> Result<Match, rusqlite::Error> {
    let status: String = row.get(3)?;
    let status = MatchStatus::from_str(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Match {
        id: row.get(0)?,
        user_low_id: row.get(1)?,
        user_high_id: row.get(2)?,
        status,
        unmatched_by_user_id: row.get(4)?,
        unmatched_at: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users::create_user;
    use tempfile::tempdir;

    async fn setup_db(dir: &tempfile::TempDir) -> Database {
        let path = dir.path().join("matches.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        for (id, name) in [(1, "ada"), (2, "grace"), (3, "edsger")] {
            create_user(&db, id, name).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn create_if_absent_is_idempotent() {
        let dir = tempdir().unwrap();
        let db = setup_db(&dir).await;
        let pair = UserPair::new(2, 1);

        let first = create_if_absent(&db, pair).await.unwrap();
        assert!(first.created);
        assert_eq!(first.record.user_low_id, 1);
        assert_eq!(first.record.user_high_id, 2);
        assert_eq!(first.record.status, MatchStatus::Active);

        // Same pair in either direction resolves to the same row.
        let second = create_if_absent(&db, UserPair::new(1, 2)).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.record.id, first.record.id);
    }

    #[tokio::test]
    async fn unmatch_transitions_active_once() {
        let dir = tempdir().unwrap();
        let db = setup_db(&dir).await;

        let created = create_if_absent(&db, UserPair::new(1, 2)).await.unwrap();
        let id = created.record.id;

        assert!(unmatch(&db, id, 1).await.unwrap());
        let row = find_by_id(&db, id).await.unwrap().unwrap();
        assert_eq!(row.status, MatchStatus::Unmatched);
        assert_eq!(row.unmatched_by_user_id, Some(1));
        assert!(row.unmatched_at.is_some());

        // Second attempt finds no ACTIVE row.
        assert!(!unmatch(&db, id, 2).await.unwrap());
        // Unknown id also reports false.
        assert!(!unmatch(&db, 9999, 1).await.unwrap());
    }

    #[tokio::test]
    async fn unmatched_pair_is_not_resurrected() {
        let dir = tempdir().unwrap();
        let db = setup_db(&dir).await;
        let pair = UserPair::new(1, 2);

        let created = create_if_absent(&db, pair).await.unwrap();
        unmatch(&db, created.record.id, 2).await.unwrap();

        let again = create_if_absent(&db, pair).await.unwrap();
        assert!(!again.created);
        assert_eq!(again.record.status, MatchStatus::Unmatched);
        assert!(!has_active(&db, pair).await.unwrap());
    }

    #[tokio::test]
    async fn active_matches_filter_by_status_and_user() {
        let dir = tempdir().unwrap();
        let db = setup_db(&dir).await;

        create_if_absent(&db, UserPair::new(1, 2)).await.unwrap();
        let m13 = create_if_absent(&db, UserPair::new(1, 3)).await.unwrap();
        unmatch(&db, m13.record.id, 3).await.unwrap();

        let active = active_matches(&db, 1, None).await.unwrap();
        assert_eq!(active.len(), 1);
        assert!(active[0].is_participant(2));
        assert_eq!(count_active(&db, 1).await.unwrap(), 1);
        assert_eq!(count_active(&db, 3).await.unwrap(), 0);
        assert!(has_active(&db, UserPair::new(1, 2)).await.unwrap());
        assert!(!has_active(&db, UserPair::new(1, 3)).await.unwrap());
    }

    #[tokio::test]
    async fn find_by_pair_and_limit() {
        let dir = tempdir().unwrap();
        let db = setup_db(&dir).await;

        create_if_absent(&db, UserPair::new(1, 2)).await.unwrap();
        create_if_absent(&db, UserPair::new(1, 3)).await.unwrap();

        assert!(find_by_pair(&db, UserPair::new(3, 1)).await.unwrap().is_some());
        assert!(find_by_pair(&db, UserPair::new(2, 3)).await.unwrap().is_none());

        let limited = active_matches(&db, 1, Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
