// src/server/handlers/users.rs
//! Account handlers: sign-up, token issue and the caller's own profile

use super::{json_body, with_db};
use crate::auth;
use crate::db::models::{AuthToken, User};
use crate::error::Error;
use crate::server::serializers::{
    AuthTokenRequest, TokenResponse, UserCreateRequest, UserResponse, UserUpdateRequest,
};
use crate::server::{ApiResult, AuthUser, SharedState};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use tracing::{debug, info};

const DUPLICATE_EMAIL: &str = "user with this email already exists.";

/// Create an account
///
/// POST /user/create/
pub async fn create_user(
    State(state): State<SharedState>,
    payload: Result<Json<UserCreateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let request = json_body(payload)?;
    let new_user = request.validate(state.config.min_password_length)?;

    let user = with_db(&state, move |conn| {
        if User::email_taken(conn, &new_user.email, None)? {
            return Err(Error::invalid("email", DUPLICATE_EMAIL));
        }
        User::create_user(conn, &new_user.email, &new_user.password, &new_user.name)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Exchange credentials for an auth token
///
/// POST /user/token/
pub async fn create_token(
    State(state): State<SharedState>,
    payload: Result<Json<AuthTokenRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let request = json_body(payload)?;
    let (email, password) = request.validate()?;

    let token = with_db(&state, move |conn| {
        let user = auth::authenticate(conn, &email, &password)?.ok_or_else(|| {
            Error::AuthenticationError(format!("invalid credentials for {}", email))
        })?;

        let user_id = user
            .id
            .ok_or_else(|| Error::DatabaseError("authenticated user has no ID".to_string()))?;
        AuthToken::get_or_create(conn, user_id)
    })
    .await?;

    debug!("Issued token for user {}", token.user_id);
    Ok(Json(TokenResponse { token: token.key }))
}

/// The authenticated user's profile
///
/// GET /user/me/
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// Partially update the authenticated user
///
/// PATCH /user/me/
pub async fn patch_me(
    State(state): State<SharedState>,
    user: AuthUser,
    payload: Result<Json<UserUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    update_me(state, user, json_body(payload)?, true).await
}

/// Replace the authenticated user's email, password and name
///
/// PUT /user/me/
pub async fn put_me(
    State(state): State<SharedState>,
    user: AuthUser,
    payload: Result<Json<UserUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    update_me(state, user, json_body(payload)?, false).await
}

async fn update_me(
    state: SharedState,
    AuthUser(mut user): AuthUser,
    request: UserUpdateRequest,
    partial: bool,
) -> ApiResult<Json<UserResponse>> {
    let changes = request.validate(state.config.min_password_length, partial)?;

    let user = with_db(&state, move |conn| {
        if let Some(email) = changes.email {
            if User::email_taken(conn, &email, user.id)? {
                return Err(Error::invalid("email", DUPLICATE_EMAIL));
            }
            user.email = email;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(password) = changes.password {
            user.set_password(&password)?;
        }

        user.update(conn)?;
        Ok(user)
    })
    .await?;

    info!("Updated profile for {}", user.email);
    Ok(Json(UserResponse::from(&user)))
}
