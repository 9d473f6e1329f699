// src/auth.rs

//! Password hashing and credential checks
//!
//! Passwords are stored as Argon2id PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`) with a fresh 16-byte
//! salt per hash. Plaintext passwords never reach the database.

use crate::db::models::{User, normalize_email};
use crate::error::{Error, Result};
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::RngCore;
use rusqlite::Connection;
use std::sync::OnceLock;
use tracing::debug;

/// Hash a plaintext password with a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| Error::HashError(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::HashError(e.to_string()))
}

/// Check a plaintext password against a stored hash
///
/// A malformed stored hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hash checked when the email is unknown, so a miss costs as much as a
/// wrong password
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("recipe-api-timing-equalizer").ok())
        .as_deref()
}

/// Look up an account by email and verify its password
///
/// Returns `Ok(None)` for an unknown email, a wrong password or an inactive
/// account; callers must not distinguish between these.
pub fn authenticate(conn: &Connection, email: &str, password: &str) -> Result<Option<User>> {
    let email = normalize_email(email);

    let Some(user) = User::find_by_email(conn, &email)? else {
        if let Some(hash) = dummy_hash() {
            let _ = verify_password(password, hash);
        }
        debug!("Authentication failed: unknown account");
        return Ok(None);
    };

    if !user.check_password(password) {
        debug!("Authentication failed: bad password for user {:?}", user.id);
        return Ok(None);
    }

    if !user.is_active {
        debug!("Authentication failed: user {:?} is inactive", user.id);
        return Ok(None);
    }

    Ok(Some(user))
}
