// src/db/models/mod.rs

//! Data models for recipe-api database entities
//!
//! This module defines Rust structs that correspond to database tables
//! and provides methods for creating, reading, updating, and deleting records.
//! Everything except `User` itself is owned by exactly one user, and every
//! lookup on an owned record takes the owner's ID.

mod ingredient;
mod recipe;
mod tag;
mod token;
mod user;

pub use ingredient::Ingredient;
pub use recipe::{RECIPE_IMAGE_DIR, Recipe, RecipeFilter, recipe_image_file_path};
pub use tag::Tag;
pub use token::AuthToken;
pub use user::{User, normalize_email};
