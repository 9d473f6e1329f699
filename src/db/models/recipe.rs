// src/db/models/recipe.rs

//! Recipe model - per-user recipes with tags, ingredients and an image

use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Directory (relative to the media root) recipe images are stored under
pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

const RECIPE_COLUMNS: &str = "r.id, r.user_id, r.title, r.time_minutes, r.price, r.link, r.image";

/// Storage path for an uploaded recipe image
///
/// The stem is a fresh UUID on every call. Only the last path component
/// of `filename` is considered; the extension is whatever follows its last
/// `.`, kept verbatim. An empty extension, or one holding a NUL byte, is
/// dropped and the path has no extension at all.
pub fn recipe_image_file_path(filename: &str) -> String {
    let basename = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let ext = basename.rsplit('.').next().unwrap_or(basename);

    if ext.is_empty() || ext.contains('\0') {
        format!("{}/{}", RECIPE_IMAGE_DIR, Uuid::new_v4())
    } else {
        format!("{}/{}.{}", RECIPE_IMAGE_DIR, Uuid::new_v4(), ext)
    }
}

/// Restrict a recipe listing to recipes carrying any of the given tags and
/// any of the given ingredients; an empty list means no restriction
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

/// A recipe owned by one user
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: Option<i64>,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub link: String,
    /// Path relative to the media root, see [`recipe_image_file_path`]
    pub image: Option<String>,
}

impl Recipe {
    pub fn new(user_id: i64, title: String, time_minutes: i64, price: Decimal) -> Self {
        Self {
            id: None,
            user_id,
            title,
            time_minutes,
            price,
            link: String::new(),
            image: None,
        }
    }

    /// Insert this recipe into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO recipes (user_id, title, time_minutes, price, link, image)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.user_id,
                &self.title,
                self.time_minutes,
                self.price.to_string(),
                &self.link,
                &self.image,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Write the scalar fields back to the database
    pub fn update(&self, conn: &Connection) -> Result<()> {
        let id = self.require_id()?;

        conn.execute(
            "UPDATE recipes SET title = ?1, time_minutes = ?2, price = ?3, link = ?4, image = ?5
             WHERE id = ?6 AND user_id = ?7",
            params![
                &self.title,
                self.time_minutes,
                self.price.to_string(),
                &self.link,
                &self.image,
                id,
                self.user_id,
            ],
        )?;

        Ok(())
    }

    /// Find one of the user's recipes by ID
    pub fn find_for_user(conn: &Connection, user_id: i64, id: i64) -> Result<Option<Self>> {
        let recipe = conn
            .query_row(
                &format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = ?1 AND r.user_id = ?2"),
                params![id, user_id],
                Self::from_row,
            )
            .optional()?;
        Ok(recipe)
    }

    /// List the user's recipes, newest first
    pub fn list_for_user(
        conn: &Connection,
        user_id: i64,
        filter: &RecipeFilter,
    ) -> Result<Vec<Self>> {
        let mut sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.user_id = ?");
        let mut values: Vec<i64> = vec![user_id];

        if !filter.tags.is_empty() {
            sql.push_str(&format!(
                " AND r.id IN (SELECT recipe_id FROM recipe_tags WHERE tag_id IN ({}))",
                placeholders(filter.tags.len())
            ));
            values.extend(&filter.tags);
        }

        if !filter.ingredients.is_empty() {
            sql.push_str(&format!(
                " AND r.id IN (SELECT recipe_id FROM recipe_ingredients WHERE ingredient_id IN ({}))",
                placeholders(filter.ingredients.len())
            ));
            values.extend(&filter.ingredients);
        }

        sql.push_str(" ORDER BY r.id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let recipes = stmt
            .query_map(params_from_iter(values), Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(recipes)
    }

    /// Delete one of the user's recipes; returns false if there was none
    pub fn delete(conn: &Connection, user_id: i64, id: i64) -> Result<bool> {
        let deleted = conn.execute(
            "DELETE FROM recipes WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Record a new image path
    pub fn set_image(&mut self, conn: &Connection, path: String) -> Result<()> {
        self.image = Some(path);
        self.update(conn)
    }

    pub fn tag_ids(&self, conn: &Connection) -> Result<Vec<i64>> {
        link_ids(
            conn,
            "SELECT tag_id FROM recipe_tags WHERE recipe_id = ?1 ORDER BY tag_id",
            self.require_id()?,
        )
    }

    pub fn ingredient_ids(&self, conn: &Connection) -> Result<Vec<i64>> {
        link_ids(
            conn,
            "SELECT ingredient_id FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY ingredient_id",
            self.require_id()?,
        )
    }

    /// Replace the recipe's tags
    ///
    /// Ownership of the tags is the caller's responsibility
    /// (see [`crate::db::models::Tag::ensure_owned`]).
    pub fn set_tags(&self, conn: &Connection, tag_ids: &[i64]) -> Result<()> {
        let id = self.require_id()?;
        conn.execute("DELETE FROM recipe_tags WHERE recipe_id = ?1", [id])?;
        for tag_id in tag_ids {
            conn.execute(
                "INSERT OR IGNORE INTO recipe_tags (recipe_id, tag_id) VALUES (?1, ?2)",
                params![id, tag_id],
            )?;
        }
        Ok(())
    }

    /// Replace the recipe's ingredients
    pub fn set_ingredients(&self, conn: &Connection, ingredient_ids: &[i64]) -> Result<()> {
        let id = self.require_id()?;
        conn.execute("DELETE FROM recipe_ingredients WHERE recipe_id = ?1", [id])?;
        for ingredient_id in ingredient_ids {
            conn.execute(
                "INSERT OR IGNORE INTO recipe_ingredients (recipe_id, ingredient_id) VALUES (?1, ?2)",
                params![id, ingredient_id],
            )?;
        }
        Ok(())
    }

    fn require_id(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| Error::InitError("Recipe has not been saved".to_string()))
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let price_str: String = row.get(4)?;
        let price = Decimal::from_str(&price_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Self {
            id: Some(row.get(0)?),
            user_id: row.get(1)?,
            title: row.get(2)?,
            time_minutes: row.get(3)?,
            price,
            link: row.get(5)?,
            image: row.get(6)?,
        })
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn link_ids(conn: &Connection, sql: &str, recipe_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([recipe_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    Ok(ids)
}
