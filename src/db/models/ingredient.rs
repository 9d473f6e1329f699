// src/db/models/ingredient.rs

//! Ingredient model

use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fmt;

/// A named ingredient owned by one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub id: Option<i64>,
    pub name: String,
    pub user_id: i64,
}

impl Ingredient {
    pub fn new(user_id: i64, name: String) -> Self {
        Self {
            id: None,
            name,
            user_id,
        }
    }

    /// Insert this ingredient into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO ingredients (name, user_id) VALUES (?1, ?2)",
            params![&self.name, self.user_id],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn find_for_user(conn: &Connection, user_id: i64, id: i64) -> Result<Option<Self>> {
        let ingredient = conn
            .query_row(
                "SELECT id, name, user_id FROM ingredients WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
                Self::from_row,
            )
            .optional()?;
        Ok(ingredient)
    }

    /// List the user's ingredients, name descending
    pub fn list_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, user_id FROM ingredients WHERE user_id = ?1
             ORDER BY name DESC, id DESC",
        )?;

        let ingredients = stmt
            .query_map([user_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ingredients)
    }

    pub fn list_for_recipe(conn: &Connection, recipe_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT i.id, i.name, i.user_id FROM ingredients i
             JOIN recipe_ingredients ri ON ri.ingredient_id = i.id
             WHERE ri.recipe_id = ?1
             ORDER BY i.name, i.id",
        )?;

        let ingredients = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ingredients)
    }

    /// Fail unless every ID names one of the user's ingredients
    pub fn ensure_owned(conn: &Connection, user_id: i64, ids: &[i64]) -> Result<()> {
        for &id in ids {
            if Self::find_for_user(conn, user_id, id)?.is_none() {
                return Err(Error::invalid(
                    "ingredients",
                    format!("Invalid pk \"{id}\" - object does not exist."),
                ));
            }
        }
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            user_id: row.get(2)?,
        })
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
