// src/server/handlers/recipes.rs
//! Recipe handlers
//!
//! Every query is scoped to the authenticated user; another user's recipe
//! is indistinguishable from a missing one.

use super::{json_body, with_db};
use crate::db;
use crate::db::models::{Ingredient, Recipe, RecipeFilter, Tag, recipe_image_file_path};
use crate::error::{Error, FieldErrors};
use crate::server::serializers::{
    RecipeChanges, RecipeDetailResponse, RecipeImageResponse, RecipeListQuery, RecipeRequest,
    RecipeResponse,
};
use crate::server::{ApiError, ApiResult, AuthUser, SharedState};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use rusqlite::Connection;
use tracing::{info, warn};

/// Multipart field carrying the image
const IMAGE_FIELD: &str = "image";

fn recipe_not_found(id: i64) -> Error {
    Error::NotFoundError(format!("Recipe {}", id))
}

fn detail(conn: &Connection, recipe: &Recipe) -> crate::Result<RecipeDetailResponse> {
    let recipe_id = recipe.id.unwrap_or_default();
    let tags = Tag::list_for_recipe(conn, recipe_id)?;
    let ingredients = Ingredient::list_for_recipe(conn, recipe_id)?;
    Ok(RecipeDetailResponse::new(recipe, &tags, &ingredients))
}

/// Check related IDs, write the recipe and replace its links
fn save_recipe(
    conn: &mut Connection,
    mut recipe: Recipe,
    changes: RecipeChanges,
) -> crate::Result<RecipeDetailResponse> {
    db::transaction(conn, |tx| {
        if let Some(tags) = &changes.tags {
            Tag::ensure_owned(tx, recipe.user_id, tags)?;
        }
        if let Some(ingredients) = &changes.ingredients {
            Ingredient::ensure_owned(tx, recipe.user_id, ingredients)?;
        }

        changes.apply(&mut recipe);
        if recipe.id.is_some() {
            recipe.update(tx)?;
        } else {
            recipe.insert(tx)?;
        }

        if let Some(tags) = &changes.tags {
            recipe.set_tags(tx, tags)?;
        }
        if let Some(ingredients) = &changes.ingredients {
            recipe.set_ingredients(tx, ingredients)?;
        }

        detail(tx, &recipe)
    })
}

/// List the caller's recipes
///
/// GET /recipe/recipes/?tags=1,2&ingredients=3
pub async fn list_recipes(
    State(state): State<SharedState>,
    user: AuthUser,
    Query(query): Query<RecipeListQuery>,
) -> ApiResult<Json<Vec<RecipeResponse>>> {
    let (tags, ingredients) = query.parse_ids()?;
    let filter = RecipeFilter { tags, ingredients };
    let user_id = user.id();

    let recipes = with_db(&state, move |conn| {
        let conn: &Connection = conn;
        Recipe::list_for_user(conn, user_id, &filter)?
            .iter()
            .map(|recipe| {
                Ok(RecipeResponse::new(
                    recipe,
                    recipe.tag_ids(conn)?,
                    recipe.ingredient_ids(conn)?,
                ))
            })
            .collect::<crate::Result<Vec<_>>>()
    })
    .await?;

    Ok(Json(recipes))
}

/// Create a recipe
///
/// POST /recipe/recipes/
pub async fn create_recipe(
    State(state): State<SharedState>,
    user: AuthUser,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RecipeDetailResponse>)> {
    let changes = json_body(payload)?.validate(false)?;
    let user_id = user.id();

    let created = with_db(&state, move |conn| {
        // Placeholder values are overwritten by the validated fields
        let recipe = Recipe::new(user_id, String::new(), 0, Default::default());
        save_recipe(conn, recipe, changes)
    })
    .await?;

    info!("User {} created recipe {}", user_id, created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// Recipe detail with tags and ingredients expanded
///
/// GET /recipe/recipes/:id/
pub async fn get_recipe(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<RecipeDetailResponse>> {
    let user_id = user.id();

    let recipe = with_db(&state, move |conn| {
        let recipe = Recipe::find_for_user(conn, user_id, id)?.ok_or_else(|| recipe_not_found(id))?;
        detail(conn, &recipe)
    })
    .await?;

    Ok(Json(recipe))
}

/// PATCH /recipe/recipes/:id/
pub async fn patch_recipe(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> ApiResult<Json<RecipeDetailResponse>> {
    update_recipe(state, user, id, json_body(payload)?, true).await
}

/// PUT /recipe/recipes/:id/
pub async fn put_recipe(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> ApiResult<Json<RecipeDetailResponse>> {
    update_recipe(state, user, id, json_body(payload)?, false).await
}

async fn update_recipe(
    state: SharedState,
    user: AuthUser,
    id: i64,
    request: RecipeRequest,
    partial: bool,
) -> ApiResult<Json<RecipeDetailResponse>> {
    let mut changes = request.validate(partial)?;
    if !partial {
        // A full update replaces the links too
        changes.tags.get_or_insert_with(Vec::new);
        changes.ingredients.get_or_insert_with(Vec::new);
    }
    let user_id = user.id();

    let updated = with_db(&state, move |conn| {
        let recipe = Recipe::find_for_user(conn, user_id, id)?.ok_or_else(|| recipe_not_found(id))?;
        save_recipe(conn, recipe, changes)
    })
    .await?;

    Ok(Json(updated))
}

/// DELETE /recipe/recipes/:id/
pub async fn delete_recipe(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let user_id = user.id();

    let image = with_db(&state, move |conn| {
        let recipe = Recipe::find_for_user(conn, user_id, id)?.ok_or_else(|| recipe_not_found(id))?;
        Recipe::delete(conn, user_id, id)?;
        Ok(recipe.image)
    })
    .await?;

    if let Some(image) = image {
        remove_media(&state, &image).await;
    }

    info!("User {} deleted recipe {}", user_id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Attach an image to a recipe
///
/// POST /recipe/recipes/:id/upload-image/ (multipart, field `image`)
pub async fn upload_image(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<Json<RecipeImageResponse>> {
    let user_id = user.id();

    // 404 before reading the body
    with_db(&state, move |conn| {
        Recipe::find_for_user(conn, user_id, id)?.ok_or_else(|| recipe_not_found(id))
    })
    .await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(&e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or(IMAGE_FIELD).to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(&e.body_text()))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = match upload {
        Some((filename, data)) if !data.is_empty() => (filename, data),
        Some(_) => {
            return Err(ApiError::validation(FieldErrors::single(
                IMAGE_FIELD,
                "The submitted file is empty.",
            )));
        }
        None => {
            return Err(ApiError::validation(FieldErrors::single(
                IMAGE_FIELD,
                "No file was submitted.",
            )));
        }
    };

    let relative = recipe_image_file_path(&filename);
    let full_path = state.config.media_root.join(&relative);
    if let Some(parent) = full_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ApiError::from(Error::from(e)))?;
    }
    tokio::fs::write(&full_path, &data)
        .await
        .map_err(|e| ApiError::from(Error::from(e)))?;

    let stored = relative.clone();
    let previous = with_db(&state, move |conn| {
        // The recipe may have been deleted while the body was streaming
        let mut recipe =
            Recipe::find_for_user(conn, user_id, id)?.ok_or_else(|| recipe_not_found(id))?;
        let previous = recipe.image.take();
        recipe.set_image(conn, stored)?;
        Ok(previous)
    })
    .await;

    let previous = match previous {
        Ok(previous) => previous,
        Err(e) => {
            remove_media(&state, &relative).await;
            return Err(e);
        }
    };

    if let Some(previous) = previous {
        remove_media(&state, &previous).await;
    }

    info!(
        "Stored image for recipe {} at {} ({} bytes)",
        id,
        relative,
        data.len()
    );
    Ok(Json(RecipeImageResponse {
        id,
        image: Some(relative),
    }))
}

/// Best-effort removal of a file under the media root
async fn remove_media(state: &SharedState, relative: &str) {
    let path = state.config.media_root.join(relative);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}
