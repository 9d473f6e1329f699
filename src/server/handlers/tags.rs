// src/server/handlers/tags.rs
//! Tag handlers

use super::{json_body, with_db};
use crate::db::models::Tag;
use crate::server::serializers::{NameRequest, TagResponse};
use crate::server::{ApiResult, AuthUser, SharedState};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

/// GET /recipe/tags/
pub async fn list_tags(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<TagResponse>>> {
    let user_id = user.id();
    let tags = with_db(&state, move |conn| Tag::list_for_user(conn, user_id)).await?;

    Ok(Json(tags.iter().map(TagResponse::from).collect()))
}

/// POST /recipe/tags/
pub async fn create_tag(
    State(state): State<SharedState>,
    user: AuthUser,
    payload: Result<Json<NameRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TagResponse>)> {
    let name = json_body(payload)?.validate()?;
    let user_id = user.id();

    let tag = with_db(&state, move |conn| {
        let mut tag = Tag::new(user_id, name);
        tag.insert(conn)?;
        Ok(tag)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(TagResponse::from(&tag))))
}
