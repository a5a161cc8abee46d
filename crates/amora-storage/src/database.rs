// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use tracing::debug;

use amora_core::AmoraError;

/// Handle to the SQLite database.
///
/// Wraps a single `tokio_rusqlite::Connection`; query modules accept
/// `&Database` and run their closures on the background thread via
/// [`Database::connection`]. Migrations run on open.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    wal_mode: bool,
}

impl Database {
    /// Open (creating if necessary) the database at `path` with WAL
    /// journaling, apply PRAGMAs, and run pending migrations.
    pub async fn open(path: &str) -> Result<Self, AmoraError> {
        Self::open_with(path, true).await
    }

    /// Like [`Database::open`], with the journal mode under the caller's
    /// control. With `wal_mode` off SQLite keeps its default rollback
    /// journal, which some network filesystems require.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, AmoraError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| AmoraError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| AmoraError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| {
            if wal_mode {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            }
            conn.execute_batch(
                "PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        let report = conn
            .call(|conn| Ok(crate::migrations::run_migrations(conn)))
            .await
            .map_err(map_tr_err)?;
        report?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn, wal_mode })
    }

    /// The underlying single-writer connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Verify the database answers queries.
    pub async fn health_check(&self) -> Result<(), AmoraError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL before shutdown. A no-op without WAL journaling.
    pub async fn close(&self) -> Result<(), AmoraError> {
        if !self.wal_mode {
            return Ok(());
        }
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the workspace error type.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> AmoraError {
    AmoraError::Storage {
        source: Box::new(e),
    }
}

/// Whether `err` is a UNIQUE (or primary key) constraint violation.
///
/// Used to turn append-once conflicts into typed outcomes instead of
/// opaque storage errors. Foreign-key and CHECK violations do not count.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    if let rusqlite::Error::SqliteFailure(f, _) = err {
        f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_database_and_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("open.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        assert!(db_path.exists(), "database file should be created");

        // Migrations created the core tables.
        let tables: Vec<String> = db
            .connection()
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                Ok::<_, rusqlite::Error>(names)
            })
            .await
            .unwrap();
        for expected in ["users", "swipes", "likes", "matches"] {
            assert!(
                tables.iter().any(|t| t == expected),
                "missing table {expected}, got {tables:?}"
            );
        }

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_is_idempotent_across_restarts() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");

        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
        drop(db);

        // Second open re-runs the migration runner without error.
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.health_check().await.unwrap();
        db.close().await.unwrap();
    }

    async fn journal_mode(db: &Database) -> String {
        db.connection()
            .call(|conn| {
                let mode = conn.query_row("PRAGMA journal_mode", [], |row| {
                    row.get::<_, String>(0)
                })?;
                Ok::<_, rusqlite::Error>(mode)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn open_applies_wal_journaling() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("wal.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        assert_eq!(journal_mode(&db).await, "wal");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_with_wal_disabled_keeps_rollback_journal() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nowal.db");
        let db = Database::open_with(db_path.to_str().unwrap(), false)
            .await
            .unwrap();
        assert_eq!(journal_mode(&db).await, "delete");
        db.health_check().await.unwrap();
        // close() must not attempt a WAL checkpoint here.
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/dirs/amora.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        db.health_check().await.unwrap();
        assert!(db_path.exists());
    }
}
