// src/server/handlers/mod.rs
//! HTTP request handlers for the recipe API

pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;

use crate::server::{ApiError, ApiResult, SharedState};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use rusqlite::Connection;
use serde::Serialize;

/// Run blocking database work on a fresh connection
///
/// Library errors are converted to API errors on the way out.
pub(crate) async fn with_db<F, T>(state: &SharedState, f: F) -> ApiResult<T>
where
    F: FnOnce(&mut Connection) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || -> crate::Result<T> {
        let mut conn = state.open_db()?;
        f(&mut conn)
    })
    .await
    .map_err(|e| ApiError::internal(&format!("Task join error: {}", e)))?
    .map_err(ApiError::from)
}

/// Unwrap a JSON body, turning malformed input into a 400
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(&rejection.body_text()))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
