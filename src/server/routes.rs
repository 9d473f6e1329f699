// src/server/routes.rs
//! Axum router configuration for the recipe API
//!
//! Paths keep their trailing slash; `/user/me` and `/user/me/` are different
//! routes and only the latter exists.

use crate::server::SharedState;
use crate::server::handlers::{self, ingredients, recipes, tags, users};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Create the main application router
pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);
    let max_upload_bytes = state.config.max_upload_bytes;

    let user_routes = Router::new()
        .route("/user/create/", post(users::create_user))
        .route("/user/token/", post(users::create_token))
        .route(
            "/user/me/",
            get(users::get_me).patch(users::patch_me).put(users::put_me),
        );

    let recipe_routes = Router::new()
        .route(
            "/recipe/tags/",
            get(tags::list_tags).post(tags::create_tag),
        )
        .route(
            "/recipe/ingredients/",
            get(ingredients::list_ingredients).post(ingredients::create_ingredient),
        )
        .route(
            "/recipe/recipes/",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipe/recipes/:id/",
            get(recipes::get_recipe)
                .put(recipes::put_recipe)
                .patch(recipes::patch_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/recipe/recipes/:id/upload-image/",
            post(recipes::upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(user_routes)
        .merge(recipe_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origins; an empty list allows none
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
