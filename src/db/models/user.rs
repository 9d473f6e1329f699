// src/db/models/user.rs

//! User model - accounts identified by email

use crate::auth;
use crate::error::{Error, Result};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use std::fmt;
use tracing::info;

const USER_COLUMNS: &str =
    "id, email, name, password, is_active, is_staff, is_superuser, date_joined";

/// Normalize an email address for storage and lookup
///
/// Surrounding whitespace is dropped and the whole address is lowercased,
/// so `Test@EXAMPLE.com` and `test@example.com` are the same account.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// An account with login credentials and profile fields
#[derive(Debug, Clone)]
pub struct User {
    pub id: Option<i64>,
    pub email: String,
    pub name: String,
    /// Argon2 PHC string; empty means no usable password
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: Option<String>,
}

impl User {
    /// Create an unsaved user with no usable password
    pub fn new(email: String, name: String) -> Self {
        Self {
            id: None,
            email,
            name,
            password_hash: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: None,
        }
    }

    /// Create and save a regular user
    ///
    /// The email is normalized and must not be empty. The password is only
    /// ever stored hashed.
    pub fn create_user(conn: &Connection, email: &str, password: &str, name: &str) -> Result<Self> {
        let mut user = Self::prepare(email, password, name)?;
        user.insert(conn)?;

        info!("Created user {} (id {:?})", user.email, user.id);
        Ok(user)
    }

    /// Create and save a user with staff and superuser flags set
    pub fn create_superuser(
        conn: &Connection,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Self> {
        let mut user = Self::prepare(email, password, name)?;
        user.is_staff = true;
        user.is_superuser = true;
        user.insert(conn)?;

        info!("Created superuser {} (id {:?})", user.email, user.id);
        Ok(user)
    }

    /// Unsaved user with a normalized email and hashed password
    fn prepare(email: &str, password: &str, name: &str) -> Result<Self> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(Error::invalid("email", "Users must have an email address."));
        }

        let mut user = User::new(email, name.trim().to_string());
        user.set_password(password)?;
        Ok(user)
    }

    /// Replace the stored hash with a hash of `password`
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.password_hash = auth::hash_password(password)?;
        Ok(())
    }

    /// Check a plaintext password against the stored hash
    pub fn check_password(&self, password: &str) -> bool {
        !self.password_hash.is_empty() && auth::verify_password(password, &self.password_hash)
    }

    /// Insert this user into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO users (email, name, password, is_active, is_staff, is_superuser)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &self.email,
                &self.name,
                &self.password_hash,
                self.is_active,
                self.is_staff,
                self.is_superuser,
            ],
        )
        .map_err(unique_email_violation)?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Write every mutable field back to the database
    pub fn update(&self, conn: &Connection) -> Result<()> {
        let id = self
            .id
            .ok_or_else(|| Error::InitError("Cannot update user without ID".to_string()))?;

        conn.execute(
            "UPDATE users SET email = ?1, name = ?2, password = ?3, is_active = ?4,
                    is_staff = ?5, is_superuser = ?6
             WHERE id = ?7",
            params![
                &self.email,
                &self.name,
                &self.password_hash,
                self.is_active,
                self.is_staff,
                self.is_superuser,
                id,
            ],
        )
        .map_err(unique_email_violation)?;

        Ok(())
    }

    /// Find a user by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
        let user = stmt.query_row([id], Self::from_row).optional()?;
        Ok(user)
    }

    /// Find a user by email (normalized before lookup)
    pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<Self>> {
        let mut stmt =
            conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))?;
        let user = stmt
            .query_row([normalize_email(email)], Self::from_row)
            .optional()?;
        Ok(user)
    }

    /// Whether any other account already uses this email
    pub fn email_taken(conn: &Connection, email: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?1 AND id IS NOT ?2",
            params![normalize_email(email), exclude_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Delete a user and, by cascade, everything they own
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            email: row.get(1)?,
            name: row.get(2)?,
            password_hash: row.get(3)?,
            is_active: row.get(4)?,
            is_staff: row.get(5)?,
            is_superuser: row.get(6)?,
            date_joined: row.get(7)?,
        })
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

/// The only unique column on `users` is `email`
fn unique_email_violation(err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            Error::invalid("email", "user with this email already exists.")
        }
        other => other.into(),
    }
}
