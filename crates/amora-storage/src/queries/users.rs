// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User lookup and registration queries.

use amora_core::types::{User, UserId};
use amora_core::AmoraError;

use crate::database::{map_tr_err, Database};

/// Insert a user with an explicit id (ids come from the upstream identity
/// provider, not from SQLite).
pub async fn create_user(
    db: &Database,
    user_id: UserId,
    display_name: &str,
) -> Result<User, AmoraError> {
    let display_name = display_name.to_string();
    db.connection()
        .call(move |conn| {
            let user = conn.query_row(
                "INSERT INTO users (id, display_name) VALUES (?1, ?2)
                 RETURNING id, display_name, created_at",
                rusqlite::params![user_id, display_name],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        display_name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )?;
            Ok(user)
        })
        .await
        .map_err(map_tr_err)
}

/// Look up a user by id.
pub async fn find_user(db: &Database, user_id: UserId) -> Result<Option<User>, AmoraError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, display_name, created_at FROM users WHERE id = ?1",
            )?;
            let user = stmt
                .query_row([user_id], |row| {
                    Ok(User {
                        id: row.get(0)?,
                        display_name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                })
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            Ok(user)
        })
        .await
        .map_err(map_tr_err)
}

/// Whether a user with this id exists.
pub async fn user_exists(db: &Database, user_id: UserId) -> Result<bool, AmoraError> {
    db.connection()
        .call(move |conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                [user_id],
                |row| row.get::<_, bool>(0),
            )?;
            Ok(exists)
        })
        .await
        .map_err(map_tr_err)
}
