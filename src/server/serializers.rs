// src/server/serializers.rs
//! Request and response bodies for the API
//!
//! Request types keep every field optional so that a missing field becomes
//! a field-level validation message instead of a JSON rejection. Each
//! request type has a `validate` method that either returns the checked
//! values or a [`FieldErrors`] map.

use crate::db::models::{Ingredient, Recipe, Tag, User, normalize_email};
use crate::error::FieldErrors;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Longest accepted value for short text fields
pub const MAX_CHAR_LENGTH: usize = 255;

/// Digits allowed in a recipe price, and how many of them after the point
pub const PRICE_MAX_DIGITS: u32 = 5;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

/// Loose structural email check: one `@`, a non-empty local part and a
/// dotted (or `localhost`) domain, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    if local.is_empty() || local.contains('@') || domain.is_empty() {
        return false;
    }

    if domain == "localhost" {
        return true;
    }

    domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

fn check_length(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.chars().count() > MAX_CHAR_LENGTH {
        errors.add(
            field,
            format!("Ensure this field has no more than {MAX_CHAR_LENGTH} characters."),
        );
    }
}

/// Required, non-blank, length-checked text; returns the trimmed value
fn required_text(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    match value.map(str::trim) {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some("") => {
            errors.add(field, BLANK);
            None
        }
        Some(v) => {
            check_length(errors, field, v);
            Some(v.to_string())
        }
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) -> String {
    let email = normalize_email(email);
    if email.is_empty() {
        errors.add("email", BLANK);
    } else if !is_valid_email(&email) {
        errors.add("email", "Enter a valid email address.");
    } else {
        check_length(errors, "email", &email);
    }
    email
}

fn check_password(errors: &mut FieldErrors, password: &str, min_length: usize) {
    if password.is_empty() {
        errors.add("password", BLANK);
    } else if password.chars().count() < min_length {
        errors.add(
            "password",
            format!("Ensure this field has at least {min_length} characters."),
        );
    }
}

fn check_price(errors: &mut FieldErrors, price: Decimal) -> Decimal {
    let normalized = price.normalize();
    if normalized.scale() > PRICE_DECIMAL_PLACES {
        errors.add(
            "price",
            format!("Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."),
        );
        return price;
    }

    let mut stored = normalized;
    stored.rescale(PRICE_DECIMAL_PLACES);
    if stored.mantissa().unsigned_abs() >= 10u128.pow(PRICE_MAX_DIGITS) {
        errors.add(
            "price",
            format!("Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."),
        );
    }
    stored
}

// =============================================================================
// Users
// =============================================================================

/// `POST /user/create/`
#[derive(Debug, Default, Deserialize)]
pub struct UserCreateRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// A validated account creation request
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl UserCreateRequest {
    pub fn validate(&self, min_password_length: usize) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = match self.email.as_deref() {
            Some(email) => check_email(&mut errors, email),
            None => {
                errors.add("email", REQUIRED);
                String::new()
            }
        };

        let password = match self.password.as_deref() {
            Some(password) => {
                check_password(&mut errors, password, min_password_length);
                password.to_string()
            }
            None => {
                errors.add("password", REQUIRED);
                String::new()
            }
        };

        let name = self.name.as_deref().unwrap_or("").trim().to_string();
        check_length(&mut errors, "name", &name);

        if errors.is_empty() {
            Ok(NewUser {
                email,
                password,
                name,
            })
        } else {
            Err(errors)
        }
    }
}

/// `PUT`/`PATCH /user/me/`
#[derive(Debug, Default, Deserialize)]
pub struct UserUpdateRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Validated profile changes; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

impl UserUpdateRequest {
    /// With `partial == false` (PUT) email and password are required
    pub fn validate(
        &self,
        min_password_length: usize,
        partial: bool,
    ) -> Result<UserChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut changes = UserChanges::default();

        match self.email.as_deref() {
            Some(email) => changes.email = Some(check_email(&mut errors, email)),
            None if !partial => errors.add("email", REQUIRED),
            None => {}
        }

        match self.password.as_deref() {
            Some(password) => {
                check_password(&mut errors, password, min_password_length);
                changes.password = Some(password.to_string());
            }
            None if !partial => errors.add("password", REQUIRED),
            None => {}
        }

        if let Some(name) = self.name.as_deref() {
            let name = name.trim().to_string();
            check_length(&mut errors, "name", &name);
            changes.name = Some(name);
        }

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(errors)
        }
    }
}

/// Public representation of an account; never includes the password
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// `POST /user/token/`
#[derive(Debug, Default, Deserialize)]
pub struct AuthTokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl AuthTokenRequest {
    /// Presence checks only; the credentials themselves are checked against
    /// the database. Passwords are not trimmed.
    pub fn validate(&self) -> Result<(String, String), FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = match self.email.as_deref().map(str::trim) {
            None => {
                errors.add("email", REQUIRED);
                String::new()
            }
            Some("") => {
                errors.add("email", BLANK);
                String::new()
            }
            Some(email) => email.to_string(),
        };

        let password = match self.password.as_deref() {
            None => {
                errors.add("password", REQUIRED);
                String::new()
            }
            Some("") => {
                errors.add("password", BLANK);
                String::new()
            }
            Some(password) => password.to_string(),
        };

        if errors.is_empty() {
            Ok((email, password))
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

// =============================================================================
// Tags and ingredients
// =============================================================================

/// `POST /recipe/tags/` and `POST /recipe/ingredients/`
#[derive(Debug, Default, Deserialize)]
pub struct NameRequest {
    pub name: Option<String>,
}

impl NameRequest {
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required_text(&mut errors, "name", self.name.as_deref());
        match name {
            Some(name) if errors.is_empty() => Ok(name),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
}

impl From<&Tag> for TagResponse {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id.unwrap_or_default(),
            name: tag.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientResponse {
    pub id: i64,
    pub name: String,
}

impl From<&Ingredient> for IngredientResponse {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            id: ingredient.id.unwrap_or_default(),
            name: ingredient.name.clone(),
        }
    }
}

// =============================================================================
// Recipes
// =============================================================================

/// `POST /recipe/recipes/`, `PUT`/`PATCH /recipe/recipes/:id/`
#[derive(Debug, Default, Deserialize)]
pub struct RecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

/// Validated recipe fields; `None` leaves a field alone on update
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

impl RecipeChanges {
    /// Overwrite the scalar fields that were supplied
    pub fn apply(&self, recipe: &mut Recipe) {
        if let Some(title) = &self.title {
            recipe.title = title.clone();
        }
        if let Some(time_minutes) = self.time_minutes {
            recipe.time_minutes = time_minutes;
        }
        if let Some(price) = self.price {
            recipe.price = price;
        }
        if let Some(link) = &self.link {
            recipe.link = link.clone();
        }
    }
}

impl RecipeRequest {
    /// With `partial == false` (create, PUT) title, time and price are
    /// required
    pub fn validate(&self, partial: bool) -> Result<RecipeChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut changes = RecipeChanges::default();

        if self.title.is_some() || !partial {
            changes.title = required_text(&mut errors, "title", self.title.as_deref());
        }

        match self.time_minutes {
            Some(minutes) => changes.time_minutes = Some(minutes),
            None if !partial => errors.add("time_minutes", REQUIRED),
            None => {}
        }

        match self.price {
            Some(price) => changes.price = Some(check_price(&mut errors, price)),
            None if !partial => errors.add("price", REQUIRED),
            None => {}
        }

        if let Some(link) = self.link.as_deref() {
            let link = link.trim().to_string();
            check_length(&mut errors, "link", &link);
            changes.link = Some(link);
        }

        changes.tags = self.tags.clone();
        changes.ingredients = self.ingredients.clone();

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(errors)
        }
    }
}

/// List representation: related records by ID
#[derive(Debug, Clone, Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
    pub image: Option<String>,
}

impl RecipeResponse {
    pub fn new(recipe: &Recipe, tags: Vec<i64>, ingredients: Vec<i64>) -> Self {
        Self {
            id: recipe.id.unwrap_or_default(),
            title: recipe.title.clone(),
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link.clone(),
            tags,
            ingredients,
            image: recipe.image.clone(),
        }
    }
}

/// Detail representation: related records expanded
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetailResponse {
    pub id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<IngredientResponse>,
    pub image: Option<String>,
}

impl RecipeDetailResponse {
    pub fn new(recipe: &Recipe, tags: &[Tag], ingredients: &[Ingredient]) -> Self {
        Self {
            id: recipe.id.unwrap_or_default(),
            title: recipe.title.clone(),
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link.clone(),
            tags: tags.iter().map(TagResponse::from).collect(),
            ingredients: ingredients.iter().map(IngredientResponse::from).collect(),
            image: recipe.image.clone(),
        }
    }
}

/// Response to an image upload
#[derive(Debug, Clone, Serialize)]
pub struct RecipeImageResponse {
    pub id: i64,
    pub image: Option<String>,
}

/// `GET /recipe/recipes/?tags=1,2&ingredients=3`
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

impl RecipeListQuery {
    /// Parse the comma-separated ID lists
    pub fn parse_ids(&self) -> Result<(Vec<i64>, Vec<i64>), FieldErrors> {
        let mut errors = FieldErrors::new();
        let tags = parse_id_list(&mut errors, "tags", self.tags.as_deref());
        let ingredients = parse_id_list(&mut errors, "ingredients", self.ingredients.as_deref());

        if errors.is_empty() {
            Ok((tags, ingredients))
        } else {
            Err(errors)
        }
    }
}

fn parse_id_list(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Vec<i64> {
    let Some(value) = value else {
        return Vec::new();
    };

    let mut ids = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<i64>() {
            Ok(id) => ids.push(id),
            Err(_) => {
                errors.add(field, format!("\"{part}\" is not a valid ID."));
                return Vec::new();
            }
        }
    }
    ids
}
