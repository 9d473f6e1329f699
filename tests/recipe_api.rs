// tests/recipe_api.rs

//! Recipe API tests: tags, ingredients, recipes and image upload.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use recipe_api::db::models::{Ingredient, Recipe, RecipeFilter, Tag};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;

const TAGS_URL: &str = "/recipe/tags/";
const INGREDIENTS_URL: &str = "/recipe/ingredients/";
const RECIPES_URL: &str = "/recipe/recipes/";

fn detail_url(id: i64) -> String {
    format!("/recipe/recipes/{}/", id)
}

fn image_upload_url(id: i64) -> String {
    format!("/recipe/recipes/{}/upload-image/", id)
}

fn sample_tag(app: &TestApp, user_id: i64, name: &str) -> Tag {
    let mut tag = Tag::new(user_id, name.to_string());
    tag.insert(&app.conn()).unwrap();
    tag
}

fn sample_ingredient(app: &TestApp, user_id: i64, name: &str) -> Ingredient {
    let mut ingredient = Ingredient::new(user_id, name.to_string());
    ingredient.insert(&app.conn()).unwrap();
    ingredient
}

fn sample_recipe(app: &TestApp, user_id: i64, title: &str) -> Recipe {
    let mut recipe = Recipe::new(
        user_id,
        title.to_string(),
        10,
        Decimal::from_str("5.00").unwrap(),
    );
    recipe.insert(&app.conn()).unwrap();
    recipe
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect()
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_recipe_endpoints_require_login() {
    let app = TestApp::new();

    for url in [TAGS_URL, INGREDIENTS_URL, RECIPES_URL] {
        let (status, _) = app.get(url, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{url}");
    }

    let (status, _) = app.post(TAGS_URL, None, json!({"name": "Vegan"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Tags
// =============================================================================

#[tokio::test]
async fn test_retrieve_tags() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    sample_tag(&app, user.id.unwrap(), "Vegan");
    sample_tag(&app, user.id.unwrap(), "Dessert");

    let (status, body) = app.get(TAGS_URL, Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Vegan", "Dessert"]);
}

#[tokio::test]
async fn test_tags_limited_to_user() {
    let app = TestApp::new();
    let (other, _) = app.user_with_token("other@elguerodev.com", "testpass", "");
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    sample_tag(&app, other.id.unwrap(), "Fruity");
    let tag = sample_tag(&app, user.id.unwrap(), "Comfort Food");

    let (status, body) = app.get(TAGS_URL, Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": tag.id.unwrap(), "name": "Comfort Food"}]));
}

#[tokio::test]
async fn test_create_tag_successful() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");

    let (status, body) = app
        .post(TAGS_URL, Some(&token), json!({"name": "Test tag"}))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Test tag");

    let tags = Tag::list_for_user(&app.conn(), user.id.unwrap()).unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "Test tag");
}

#[tokio::test]
async fn test_create_tag_invalid() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("test@elguerodev.com", "testpass", "");

    let (status, body) = app.post(TAGS_URL, Some(&token), json!({"name": ""})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["name"].is_array());
}

// =============================================================================
// Ingredients
// =============================================================================

#[tokio::test]
async fn test_retrieve_ingredient_list() {
    let app = TestApp::new();
    let (other, _) = app.user_with_token("other@elguerodev.com", "testpass", "");
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    sample_ingredient(&app, user.id.unwrap(), "Kale");
    sample_ingredient(&app, user.id.unwrap(), "Salt");
    sample_ingredient(&app, other.id.unwrap(), "Vinegar");

    let (status, body) = app.get(INGREDIENTS_URL, Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Salt", "Kale"]);
}

#[tokio::test]
async fn test_create_ingredient() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");

    let (status, _) = app
        .post(INGREDIENTS_URL, Some(&token), json!({"name": "Cabbage"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(INGREDIENTS_URL, Some(&token), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let ingredients = Ingredient::list_for_user(&app.conn(), user.id.unwrap()).unwrap();
    assert_eq!(ingredients.len(), 1);
}

// =============================================================================
// Recipes
// =============================================================================

#[tokio::test]
async fn test_retrieve_recipes_limited_to_user() {
    let app = TestApp::new();
    let (other, _) = app.user_with_token("other@elguerodev.com", "testpass", "");
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    sample_recipe(&app, other.id.unwrap(), "Not mine");
    let first = sample_recipe(&app, user.id.unwrap(), "First");
    let second = sample_recipe(&app, user.id.unwrap(), "Second");

    let (status, body) = app.get(RECIPES_URL, Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second.id.unwrap(), first.id.unwrap()]);
    assert_eq!(body[0]["price"], "5.00");
    assert_eq!(body[0]["tags"], json!([]));
}

#[tokio::test]
async fn test_create_basic_recipe() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");

    let payload = json!({"title": "Chocolate cheesecake", "time_minutes": 30, "price": 5.00});
    let (status, body) = app.post(RECIPES_URL, Some(&token), payload).await;

    assert_eq!(status, StatusCode::CREATED);
    let recipe = Recipe::find_for_user(&app.conn(), user.id.unwrap(), body["id"].as_i64().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(recipe.title, "Chocolate cheesecake");
    assert_eq!(recipe.time_minutes, 30);
    assert_eq!(recipe.price, Decimal::from_str("5.00").unwrap());
}

#[tokio::test]
async fn test_create_recipe_with_tags_and_ingredients() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    let uid = user.id.unwrap();
    let vegan = sample_tag(&app, uid, "Vegan").id.unwrap();
    let dessert = sample_tag(&app, uid, "Dessert").id.unwrap();
    let prawns = sample_ingredient(&app, uid, "Prawns").id.unwrap();

    let payload = json!({
        "title": "Avocado lime cheesecake",
        "time_minutes": 60,
        "price": "20.00",
        "tags": [vegan, dessert],
        "ingredients": [prawns],
    });
    let (status, body) = app.post(RECIPES_URL, Some(&token), payload).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tags"].as_array().unwrap().len(), 2);
    assert_eq!(body["ingredients"][0]["name"], "Prawns");

    let recipe = Recipe::find_for_user(&app.conn(), uid, body["id"].as_i64().unwrap())
        .unwrap()
        .unwrap();
    let mut tag_ids = recipe.tag_ids(&app.conn()).unwrap();
    tag_ids.sort();
    let mut expected = vec![vegan, dessert];
    expected.sort();
    assert_eq!(tag_ids, expected);
}

#[tokio::test]
async fn test_create_recipe_rejects_foreign_tag() {
    let app = TestApp::new();
    let (other, _) = app.user_with_token("other@elguerodev.com", "testpass", "");
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    let foreign = sample_tag(&app, other.id.unwrap(), "Theirs").id.unwrap();

    let payload = json!({
        "title": "Sneaky",
        "time_minutes": 5,
        "price": "1.00",
        "tags": [foreign],
    });
    let (status, body) = app.post(RECIPES_URL, Some(&token), payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["tags"].is_array());

    // Nothing was written
    let recipes =
        Recipe::list_for_user(&app.conn(), user.id.unwrap(), &RecipeFilter::default()).unwrap();
    assert!(recipes.is_empty());
}

#[tokio::test]
async fn test_create_recipe_invalid_price() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("test@elguerodev.com", "testpass", "");

    let payload = json!({"title": "Gold leaf", "time_minutes": 5, "price": "100000.00"});
    let (status, body) = app.post(RECIPES_URL, Some(&token), payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["price"].is_array());
}

#[tokio::test]
async fn test_view_recipe_detail() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    let uid = user.id.unwrap();
    let recipe = sample_recipe(&app, uid, "Sample recipe");
    let tag = sample_tag(&app, uid, "Vegan");
    recipe.set_tags(&app.conn(), &[tag.id.unwrap()]).unwrap();

    let (status, body) = app.get(&detail_url(recipe.id.unwrap()), Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Sample recipe");
    assert_eq!(body["tags"], json!([{"id": tag.id.unwrap(), "name": "Vegan"}]));
    assert_eq!(body["ingredients"], json!([]));
}

#[tokio::test]
async fn test_other_users_recipe_not_found() {
    let app = TestApp::new();
    let (other, _) = app.user_with_token("other@elguerodev.com", "testpass", "");
    let (_, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    let theirs = sample_recipe(&app, other.id.unwrap(), "Theirs");

    let (status, _) = app.get(&detail_url(theirs.id.unwrap()), Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::DELETE, &detail_url(theirs.id.unwrap()), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(
        Recipe::find_for_user(&app.conn(), other.id.unwrap(), theirs.id.unwrap())
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_partial_update_recipe() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    let uid = user.id.unwrap();
    let recipe = sample_recipe(&app, uid, "Sample recipe");
    let old_tag = sample_tag(&app, uid, "Old");
    recipe.set_tags(&app.conn(), &[old_tag.id.unwrap()]).unwrap();
    let new_tag = sample_tag(&app, uid, "Curry");

    let payload = json!({"title": "Chicken tikka", "tags": [new_tag.id.unwrap()]});
    let (status, body) = app
        .send(Method::PATCH, &detail_url(recipe.id.unwrap()), Some(&token), Some(payload))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Chicken tikka");
    assert_eq!(body["time_minutes"], 10);

    let stored = Recipe::find_for_user(&app.conn(), uid, recipe.id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Chicken tikka");
    assert_eq!(stored.tag_ids(&app.conn()).unwrap(), vec![new_tag.id.unwrap()]);
}

#[tokio::test]
async fn test_full_update_recipe() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    let uid = user.id.unwrap();
    let recipe = sample_recipe(&app, uid, "Sample recipe");
    let tag = sample_tag(&app, uid, "Curry");
    recipe.set_tags(&app.conn(), &[tag.id.unwrap()]).unwrap();

    let payload = json!({"title": "Spaghetti carbonara", "time_minutes": 25, "price": "5.00"});
    let (status, _) = app
        .send(Method::PUT, &detail_url(recipe.id.unwrap()), Some(&token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::OK);

    let stored = Recipe::find_for_user(&app.conn(), uid, recipe.id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Spaghetti carbonara");
    assert_eq!(stored.time_minutes, 25);
    assert!(stored.tag_ids(&app.conn()).unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_recipe() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    let recipe = sample_recipe(&app, user.id.unwrap(), "Doomed");

    let (status, _) = app
        .send(Method::DELETE, &detail_url(recipe.id.unwrap()), Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(
        Recipe::find_for_user(&app.conn(), user.id.unwrap(), recipe.id.unwrap())
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_filter_recipes_by_tags_and_ingredients() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    let uid = user.id.unwrap();

    let curry = sample_recipe(&app, uid, "Thai vegetable curry");
    let tahini = sample_recipe(&app, uid, "Aubergine with tahini");
    let fish = sample_recipe(&app, uid, "Fish and chips");

    let vegan = sample_tag(&app, uid, "Vegan").id.unwrap();
    let vegetarian = sample_tag(&app, uid, "Vegetarian").id.unwrap();
    let chicken = sample_ingredient(&app, uid, "Chicken").id.unwrap();
    curry.set_tags(&app.conn(), &[vegan]).unwrap();
    tahini.set_tags(&app.conn(), &[vegetarian]).unwrap();
    fish.set_ingredients(&app.conn(), &[chicken]).unwrap();

    let (status, body) = app
        .get(&format!("{RECIPES_URL}?tags={vegan},{vegetarian}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Aubergine with tahini", "Thai vegetable curry"]);

    let (_, body) = app
        .get(&format!("{RECIPES_URL}?ingredients={chicken}"), Some(&token))
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Fish and chips");

    let (status, _) = app
        .get(&format!("{RECIPES_URL}?tags=abc"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Image upload
// =============================================================================

#[tokio::test]
async fn test_upload_image_to_recipe() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    let recipe = sample_recipe(&app, user.id.unwrap(), "Pictured");

    let (status, body) = app
        .upload(
            &image_upload_url(recipe.id.unwrap()),
            &token,
            "image",
            "photo.jpg",
            b"\xff\xd8\xff\xe0 not really a jpeg",
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let image = body["image"].as_str().unwrap();
    assert!(image.starts_with("uploads/recipe/"));
    assert!(image.ends_with(".jpg"));
    assert!(app.media_root().join(image).exists());

    let stored = Recipe::find_for_user(&app.conn(), user.id.unwrap(), recipe.id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(stored.image.as_deref(), Some(image));
}

#[tokio::test]
async fn test_upload_image_filename_cannot_add_directories() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    let recipe = sample_recipe(&app, user.id.unwrap(), "Pictured");

    let (status, body) = app
        .upload(
            &image_upload_url(recipe.id.unwrap()),
            &token,
            "image",
            "photo./nested/evil",
            b"data",
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let image = body["image"].as_str().unwrap();
    let file = image.strip_prefix("uploads/recipe/").unwrap();
    assert!(!file.contains('/'), "{image}");
    assert!(file.ends_with(".evil"), "{image}");
    assert!(app.media_root().join(image).is_file());

    // Only plain files under the image directory
    let image_dir = app.media_root().join("uploads/recipe");
    for entry in std::fs::read_dir(&image_dir).unwrap() {
        assert!(entry.unwrap().file_type().unwrap().is_file());
    }
}

#[tokio::test]
async fn test_upload_replaces_previous_image() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    let recipe = sample_recipe(&app, user.id.unwrap(), "Pictured");
    let url = image_upload_url(recipe.id.unwrap());

    let (_, first) = app.upload(&url, &token, "image", "a.png", b"first").await;
    let (status, second) = app.upload(&url, &token, "image", "b.png", b"second").await;

    assert_eq!(status, StatusCode::OK);
    let first = first["image"].as_str().unwrap();
    let second = second["image"].as_str().unwrap();
    assert_ne!(first, second);
    assert!(!app.media_root().join(first).exists());
    assert!(app.media_root().join(second).exists());
}

#[tokio::test]
async fn test_upload_image_bad_request() {
    let app = TestApp::new();
    let (user, token) = app.user_with_token("test@elguerodev.com", "testpass", "");
    let recipe = sample_recipe(&app, user.id.unwrap(), "Pictured");
    let url = image_upload_url(recipe.id.unwrap());

    let (status, body) = app.upload(&url, &token, "image", "empty.jpg", b"").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["image"].is_array());

    let (status, _) = app.upload(&url, &token, "photo", "pic.jpg", b"data").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stored = Recipe::find_for_user(&app.conn(), user.id.unwrap(), recipe.id.unwrap())
        .unwrap()
        .unwrap();
    assert!(stored.image.is_none());
}

#[tokio::test]
async fn test_upload_image_missing_recipe() {
    let app = TestApp::new();
    let (_, token) = app.user_with_token("test@elguerodev.com", "testpass", "");

    let (status, _) = app
        .upload(&image_upload_url(9999), &token, "image", "pic.jpg", b"data")
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
