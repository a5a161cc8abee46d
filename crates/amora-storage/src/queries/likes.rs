// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Like store queries.
//!
//! Like edges are written by [`crate::queries::swipes::record_swipe`] in the
//! same transaction as the ledger row; this module is read-only.

use amora_core::types::{LikeEdge, UserId};
use amora_core::AmoraError;

use crate::database::{map_tr_err, Database};

/// Whether a like edge exists for the ordered pair. This is the durable
/// reciprocity check behind match creation.
pub async fn like_exists(db: &Database, from: UserId, to: UserId) -> Result<bool, AmoraError> {
    db.connection()
        .call(move |conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM likes WHERE from_user_id = ?1 AND to_user_id = ?2
                 )",
                [from, to],
                |row| row.get::<_, bool>(0),
            )?;
            Ok(exists)
        })
        .await
        .map_err(map_tr_err)
}

/// Likes a user has sent.
pub async fn count_sent(db: &Database, user_id: UserId) -> Result<u64, AmoraError> {
    count_where(db, "from_user_id", user_id).await
}

/// Likes a user has received.
pub async fn count_received(db: &Database, user_id: UserId) -> Result<u64, AmoraError> {
    count_where(db, "to_user_id", user_id).await
}

/// Likes a user has sent since an RFC 3339 UTC timestamp. Used to seed the
/// daily budget counter after a cache restart.
pub async fn count_sent_since(
    db: &Database,
    user_id: UserId,
    since: String,
) -> Result<u64, AmoraError> {
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM likes
                 WHERE from_user_id = ?1 AND created_at >= ?2",
                rusqlite::params![user_id, since],
                |row| row.get::<_, i64>(0),
            )?;
            Ok(count as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Like edges received by a user, newest first, optionally bounded by an
/// RFC 3339 UTC timestamp.
pub async fn received_since(
    db: &Database,
    user_id: UserId,
    since: Option<String>,
) -> Result<Vec<LikeEdge>, AmoraError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, from_user_id, to_user_id, is_super_like, message, created_at
                 FROM likes
                 WHERE to_user_id = ?1 AND created_at >= COALESCE(?2, '')
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt.query_map(rusqlite::params![user_id, since], row_to_like)?;
            let mut likes = Vec::new();
            for row in rows {
                likes.push(row?);
            }
            Ok(likes)
        })
        .await
        .map_err(map_tr_err)
}

async fn count_where(db: &Database, column: &'static str, user_id: UserId) -> Result<u64, AmoraError> {
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT COUNT(*) FROM likes WHERE {column} = ?1");
            let count = conn.query_row(&sql, [user_id], |row| row.get::<_, i64>(0))?;
            Ok(count as u64)
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_like(row: &rusqlite::Row<'_>) -> Result<LikeEdge, rusqlite::Error> {
    Ok(LikeEdge {
        id: row.get(0)?,
        from_user_id: row.get(1)?,
        to_user_id: row.get(2)?,
        is_super_like: row.get(3)?,
        message: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::swipes::record_swipe;
    use crate::queries::users::create_user;
    use amora_core::types::SwipeDecision;
    use tempfile::tempdir;

    async fn setup_db(dir: &tempfile::TempDir) -> Database {
        let path = dir.path().join("likes.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        for (id, name) in [(1, "ada"), (2, "grace"), (3, "edsger")] {
            create_user(&db, id, name).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn counts_follow_direction() {
        let dir = tempdir().unwrap();
        let db = setup_db(&dir).await;

        record_swipe(&db, 1, 2, SwipeDecision::Like, None).await.unwrap();
        record_swipe(&db, 1, 3, SwipeDecision::SuperLike, None)
            .await
            .unwrap();
        record_swipe(&db, 3, 1, SwipeDecision::Like, None).await.unwrap();
        // Dislikes never land in the like store.
        record_swipe(&db, 2, 1, SwipeDecision::Dislike, None)
            .await
            .unwrap();

        assert_eq!(count_sent(&db, 1).await.unwrap(), 2);
        assert_eq!(count_received(&db, 1).await.unwrap(), 1);
        assert_eq!(count_received(&db, 2).await.unwrap(), 1);
        assert_eq!(count_sent(&db, 2).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn like_exists_is_directional() {
        let dir = tempdir().unwrap();
        let db = setup_db(&dir).await;

        record_swipe(&db, 1, 2, SwipeDecision::Like, None).await.unwrap();
        assert!(like_exists(&db, 1, 2).await.unwrap());
        assert!(!like_exists(&db, 2, 1).await.unwrap());
    }

    #[tokio::test]
    async fn count_sent_since_cutoff() {
        let dir = tempdir().unwrap();
        let db = setup_db(&dir).await;

        record_swipe(&db, 1, 2, SwipeDecision::Like, None).await.unwrap();
        record_swipe(&db, 1, 3, SwipeDecision::Like, None).await.unwrap();

        let past = "2000-01-01T00:00:00Z".to_string();
        let future = "9999-01-01T00:00:00Z".to_string();
        assert_eq!(count_sent_since(&db, 1, past).await.unwrap(), 2);
        assert_eq!(count_sent_since(&db, 1, future).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn received_since_returns_edges_with_messages() {
        let dir = tempdir().unwrap();
        let db = setup_db(&dir).await;

        record_swipe(&db, 2, 1, SwipeDecision::Like, None).await.unwrap();
        record_swipe(&db, 3, 1, SwipeDecision::SuperLike, Some("hi!".into()))
            .await
            .unwrap();

        let received = received_since(&db, 1, None).await.unwrap();
        assert_eq!(received.len(), 2);
        let super_like = received.iter().find(|l| l.is_super_like).unwrap();
        assert_eq!(super_like.from_user_id, 3);
        assert_eq!(super_like.message.as_deref(), Some("hi!"));

        let none = received_since(&db, 1, Some("9999-01-01T00:00:00Z".into()))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
