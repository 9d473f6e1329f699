// src/db/models/tag.rs

//! Tag model - per-user labels attached to recipes

use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fmt;

/// A named label owned by one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: Option<i64>,
    pub name: String,
    pub user_id: i64,
}

impl Tag {
    pub fn new(user_id: i64, name: String) -> Self {
        Self {
            id: None,
            name,
            user_id,
        }
    }

    /// Insert this tag into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO tags (name, user_id) VALUES (?1, ?2)",
            params![&self.name, self.user_id],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find one of the user's tags by ID
    pub fn find_for_user(conn: &Connection, user_id: i64, id: i64) -> Result<Option<Self>> {
        let tag = conn
            .query_row(
                "SELECT id, name, user_id FROM tags WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
                Self::from_row,
            )
            .optional()?;
        Ok(tag)
    }

    /// List the user's tags, name descending
    pub fn list_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, user_id FROM tags WHERE user_id = ?1 ORDER BY name DESC, id DESC",
        )?;

        let tags = stmt
            .query_map([user_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    /// Tags attached to a recipe, name ascending
    pub fn list_for_recipe(conn: &Connection, recipe_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.user_id FROM tags t
             JOIN recipe_tags rt ON rt.tag_id = t.id
             WHERE rt.recipe_id = ?1
             ORDER BY t.name, t.id",
        )?;

        let tags = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    /// Fail unless every ID names one of the user's tags
    pub fn ensure_owned(conn: &Connection, user_id: i64, ids: &[i64]) -> Result<()> {
        for &id in ids {
            if Self::find_for_user(conn, user_id, id)?.is_none() {
                return Err(Error::invalid(
                    "tags",
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

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
