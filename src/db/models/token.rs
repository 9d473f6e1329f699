// src/db/models/token.rs

//! Auth token model - opaque keys that stand in for credentials

use crate::db::models::User;
use crate::error::{Error, Result};
use rand::RngCore;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Random bytes per key; hex-encoded this gives 40 characters
const KEY_BYTES: usize = 20;

/// An authentication token bound to one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub key: String,
    pub user_id: i64,
    pub created_at: Option<String>,
}

impl AuthToken {
    /// Generate a fresh random key
    pub fn generate_key() -> String {
        let mut bytes = [0u8; KEY_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Return the user's token, issuing one if they have none yet
    ///
    /// Concurrent callers for the same user all get the one stored token;
    /// `user_id` is unique, so only the first insert takes effect.
    pub fn get_or_create(conn: &Connection, user_id: i64) -> Result<Self> {
        conn.execute(
            "INSERT OR IGNORE INTO auth_tokens (key, user_id) VALUES (?1, ?2)",
            params![Self::generate_key(), user_id],
        )?;

        Self::find_by_user(conn, user_id)?.ok_or_else(|| {
            Error::NotFoundError(format!("No token stored for user {}", user_id))
        })
    }

    pub fn find_by_user(conn: &Connection, user_id: i64) -> Result<Option<Self>> {
        let token = conn
            .query_row(
                "SELECT key, user_id, created_at FROM auth_tokens WHERE user_id = ?1",
                [user_id],
                Self::from_row,
            )
            .optional()?;
        Ok(token)
    }

    pub fn find_by_key(conn: &Connection, key: &str) -> Result<Option<Self>> {
        let token = conn
            .query_row(
                "SELECT key, user_id, created_at FROM auth_tokens WHERE key = ?1",
                [key],
                Self::from_row,
            )
            .optional()?;
        Ok(token)
    }

    /// Resolve a presented key to its user
    pub fn find_user_by_key(conn: &Connection, key: &str) -> Result<Option<User>> {
        match Self::find_by_key(conn, key)? {
            Some(token) => User::find_by_id(conn, token.user_id),
            None => Ok(None),
        }
    }

    /// Revoke the user's token, if any
    pub fn delete_for_user(conn: &Connection, user_id: i64) -> Result<()> {
        conn.execute("DELETE FROM auth_tokens WHERE user_id = ?1", [user_id])?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get(0)?,
            user_id: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}
