// src/server/auth.rs
//! Token authentication for API requests
//!
//! Clients send `Authorization: Token <key>` with the key obtained from
//! `POST /user/token/`. Handlers that take an [`AuthUser`] argument reject
//! requests without a valid key with 401.

use crate::db::models::{AuthToken, User};
use crate::server::{ApiError, SharedState};
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

/// Authentication scheme keyword (matched case-insensitively)
const KEYWORD: &str = "token";

/// The account behind a request's token
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    /// Database ID of the authenticated user
    pub fn id(&self) -> i64 {
        // Users loaded from the database always have an ID
        self.0.id.unwrap_or_default()
    }
}

/// Pull the key out of an `Authorization` header value
fn parse_token_header(value: &str) -> Result<&str, ApiError> {
    let mut parts = value.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(keyword), Some(key), None) if keyword.eq_ignore_ascii_case(KEYWORD) => Ok(key),
        (Some(keyword), None, _) if keyword.eq_ignore_ascii_case(KEYWORD) => Err(
            ApiError::unauthorized("Invalid token header. No credentials provided."),
        ),
        (Some(keyword), Some(_), Some(_)) if keyword.eq_ignore_ascii_case(KEYWORD) => Err(
            ApiError::unauthorized("Invalid token header. Token string should not contain spaces."),
        ),
        _ => Err(ApiError::unauthorized(
            "Authentication credentials were not provided.",
        )),
    }
}

#[async_trait]
impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided."))?
            .to_str()
            .map_err(|_| {
                ApiError::unauthorized("Invalid token header. Token string should not contain invalid characters.")
            })?;

        let key = parse_token_header(header)?.to_string();

        let state = state.clone();
        let user = tokio::task::spawn_blocking(move || {
            let conn = state.open_db()?;
            AuthToken::find_user_by_key(&conn, &key)
        })
        .await
        .map_err(|e| ApiError::internal(&format!("Task join error: {}", e)))?
        .map_err(ApiError::from)?;

        match user {
            Some(user) if user.is_active => Ok(AuthUser(user)),
            Some(user) => {
                debug!("Rejected token for inactive user {:?}", user.id);
                Err(ApiError::unauthorized("User inactive or deleted."))
            }
            None => Err(ApiError::unauthorized("Invalid token.")),
        }
    }
}
