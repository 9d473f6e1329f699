// src/server/handlers/ingredients.rs
//! Ingredient handlers

use super::{json_body, with_db};
use crate::db::models::Ingredient;
use crate::server::serializers::{IngredientResponse, NameRequest};
use crate::server::{ApiResult, AuthUser, SharedState};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

/// GET /recipe/ingredients/
pub async fn list_ingredients(
    State(state): State<SharedState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<IngredientResponse>>> {
    let user_id = user.id();
    let ingredients =
        with_db(&state, move |conn| Ingredient::list_for_user(conn, user_id)).await?;

    Ok(Json(
        ingredients.iter().map(IngredientResponse::from).collect(),
    ))
}

/// POST /recipe/ingredients/
pub async fn create_ingredient(
    State(state): State<SharedState>,
    user: AuthUser,
    payload: Result<Json<NameRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IngredientResponse>)> {
    let name = json_body(payload)?.validate()?;
    let user_id = user.id();

    let ingredient = with_db(&state, move |conn| {
        let mut ingredient = Ingredient::new(user_id, name);
        ingredient.insert(conn)?;
        Ok(ingredient)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(IngredientResponse::from(&ingredient))))
}
