// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use recipe_api::db;
use recipe_api::db::models::{AuthToken, User};
use recipe_api::server::{AppState, ServerConfig, SharedState, create_router};
use rusqlite::Connection;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "recipe-api-test-boundary";

/// A router over a fresh database and media directory
///
/// Keep the value alive for the duration of the test; dropping it removes
/// the temp directory.
pub struct TestApp {
    _temp_dir: TempDir,
    pub state: SharedState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            db_path: temp_dir.path().join("test.db"),
            media_root: temp_dir.path().join("media"),
            ..ServerConfig::default()
        };
        db::init(&config.db_path.to_string_lossy()).unwrap();

        let state: SharedState = Arc::new(AppState::new(config));
        let router = create_router(state.clone());

        Self {
            _temp_dir: temp_dir,
            state,
            router,
        }
    }

    pub fn conn(&self) -> Connection {
        self.state.open_db().unwrap()
    }

    pub fn media_root(&self) -> PathBuf {
        self.state.config.media_root.clone()
    }

    /// Create a user directly in the database and return it with a token
    pub fn user_with_token(&self, email: &str, password: &str, name: &str) -> (User, String) {
        let conn = self.conn();
        let user = User::create_user(&conn, email, password, name).unwrap();
        let token = AuthToken::get_or_create(&conn, user.id.unwrap()).unwrap();
        (user, token.key)
    }

    /// Send a request with an optional token and JSON body; returns the
    /// status and the parsed body (`Value::Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.dispatch(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Upload `data` as a multipart file field
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        filename: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Token {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(field, filename, data)))
            .unwrap();

        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

/// A single-file multipart body
pub fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}
