//! Category administration
//!
//! Name uniqueness (both languages) and the referential delete guard are
//! enforced here in application code; the schema only carries UNIQUE
//! constraints as a backstop.

use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::{Database, DbConn};
use crate::error::{Error, Result};
use crate::models::{Category, DEFAULT_EMOJI};

/// Case-sensitive exact-match uniqueness check for one name column,
/// optionally excluding the row being updated
fn name_taken(conn: &DbConn, column: &str, value: &str, exclude_id: Option<i64>) -> Result<bool> {
    // column is one of two fixed identifiers, never user input
    let existing: Option<i64> = match exclude_id {
        Some(id) => conn
            .query_row(
                &format!("SELECT id FROM categories WHERE {} = ? AND id != ?", column),
                params![value, id],
                |row| row.get(0),
            )
            .optional()?,
        None => conn
            .query_row(
                &format!("SELECT id FROM categories WHERE {} = ?", column),
                params![value],
                |row| row.get(0),
            )
            .optional()?,
    };
    Ok(existing.is_some())
}

impl Database {
    /// All categories ordered by id
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;

        let mut stmt =
            conn.prepare("SELECT id, name_cn, name_ug, emoji FROM categories ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            let emoji: Option<String> = row.get(3)?;
            Ok(Category {
                id: row.get(0)?,
                name_cn: row.get(1)?,
                name_ug: row.get(2)?,
                emoji: emoji.unwrap_or_else(|| DEFAULT_EMOJI.to_string()),
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Look up a category by id
    pub fn get_category(&self, id: i64) -> Result<Category> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT id, name_cn, name_ug, emoji FROM categories WHERE id = ?",
            params![id],
            |row| {
                let emoji: Option<String> = row.get(3)?;
                Ok(Category {
                    id: row.get(0)?,
                    name_cn: row.get(1)?,
                    name_ug: row.get(2)?,
                    emoji: emoji.unwrap_or_else(|| DEFAULT_EMOJI.to_string()),
                })
            },
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("Category {} does not exist", id)))
    }

    /// Create a category; both names must be non-empty and unique
    pub fn add_category(&self, name_cn: &str, name_ug: &str, emoji: &str) -> Result<i64> {
        let name_cn = name_cn.trim();
        let name_ug = name_ug.trim();
        let emoji = if emoji.trim().is_empty() {
            DEFAULT_EMOJI
        } else {
            emoji.trim()
        };

        if name_cn.is_empty() {
            return Err(Error::InvalidData("Chinese name must not be empty".into()));
        }
        if name_ug.is_empty() {
            return Err(Error::InvalidData("Uyghur name must not be empty".into()));
        }

        let conn = self.conn()?;

        if name_taken(&conn, "name_cn", name_cn, None)? {
            return Err(Error::Conflict(format!(
                "Category name '{}' already exists",
                name_cn
            )));
        }
        if name_taken(&conn, "name_ug", name_ug, None)? {
            return Err(Error::Conflict(format!(
                "Category name '{}' already exists",
                name_ug
            )));
        }

        conn.execute(
            "INSERT INTO categories (name_cn, name_ug, emoji) VALUES (?, ?, ?)",
            params![name_cn, name_ug, emoji],
        )?;

        let id = conn.last_insert_rowid();
        info!(id, name_cn, "Added category");
        Ok(id)
    }

    /// Update any of the three category fields; at least one must be given
    pub fn update_category(
        &self,
        id: i64,
        name_cn: Option<&str>,
        name_ug: Option<&str>,
        emoji: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn()?;

        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("Category {} does not exist", id)));
        }

        let mut fields = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(name) = name_cn.map(str::trim).filter(|s| !s.is_empty()) {
            if name_taken(&conn, "name_cn", name, Some(id))? {
                return Err(Error::Conflict(format!(
                    "Category name '{}' is already used by another category",
                    name
                )));
            }
            fields.push("name_cn = ?");
            values.push(Box::new(name.to_string()));
        }
        if let Some(name) = name_ug.map(str::trim).filter(|s| !s.is_empty()) {
            if name_taken(&conn, "name_ug", name, Some(id))? {
                return Err(Error::Conflict(format!(
                    "Category name '{}' is already used by another category",
                    name
                )));
            }
            fields.push("name_ug = ?");
            values.push(Box::new(name.to_string()));
        }
        if let Some(e) = emoji.map(str::trim).filter(|s| !s.is_empty()) {
            fields.push("emoji = ?");
            values.push(Box::new(e.to_string()));
        }

        if fields.is_empty() {
            return Err(Error::InvalidData(
                "Nothing to update: provide a new name or emoji".into(),
            ));
        }

        values.push(Box::new(id));
        let sql = format!("UPDATE categories SET {} WHERE id = ?", fields.join(", "));
        let value_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();
        conn.execute(&sql, value_refs.as_slice())?;

        Ok(())
    }

    /// Number of expense rows referencing a category
    pub fn category_usage(&self, id: i64) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE category_id = ?",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Delete a category; refused while any expense still references it
    pub fn delete_category(&self, id: i64) -> Result<()> {
        let category = self.get_category(id)?;

        let usage = self.category_usage(id)?;
        if usage > 0 {
            return Err(Error::InUse(format!(
                "Category '{} / {}' is referenced by {} expense record(s) and cannot be deleted",
                category.name_cn, category.name_ug, usage
            )));
        }

        let conn = self.conn()?;
        conn.execute("DELETE FROM categories WHERE id = ?", params![id])?;

        info!(id, name_cn = %category.name_cn, "Deleted category");
        Ok(())
    }
}
