// src/lib.rs

//! Recipe API
//!
//! Backend for a recipe-sharing service: email-based accounts with token
//! authentication, and per-user tags, ingredients and recipes.
//!
//! # Architecture
//!
//! - Database-first: all state in SQLite, schema managed by versioned migrations
//! - Accounts: normalized, case-insensitive emails; Argon2id password hashes
//! - Tokens: one opaque key per user, sent as `Authorization: Token <key>`
//! - HTTP: axum handlers run database work on the blocking pool

pub mod auth;
pub mod db;
mod error;
pub mod server;

pub use error::{Error, FieldErrors, Result};
