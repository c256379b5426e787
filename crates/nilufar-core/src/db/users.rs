//! Operator accounts and authentication
//!
//! Passwords are stored as SHA-256 hex digests. Accounts created before
//! hashing was introduced hold plaintext; the first successful verification
//! rehashes them in place (legacy plaintext upgrade).

use std::str::FromStr;

use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Role, User};

/// SHA-256 hex digest of a password
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// A stored value is a hash iff it is 64 hex characters; anything else is
/// legacy plaintext
fn is_hashed(stored: &str) -> bool {
    stored.len() == 64 && stored.chars().all(|c| c.is_ascii_hexdigit())
}

impl Database {
    /// Check a username/password pair, returning the role on success
    ///
    /// A legacy plaintext password is rehashed and persisted before the
    /// comparison, so the upgrade happens exactly once. Unknown users and
    /// wrong passwords both yield `Ok(None)`.
    pub fn verify_user(&self, username: &str, password: &str) -> Result<Option<Role>> {
        let conn = self.conn()?;

        let stored: Option<(String, String)> = conn
            .query_row(
                "SELECT password, role FROM users WHERE username = ?",
                params![username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((mut stored_password, role)) = stored else {
            return Ok(None);
        };

        if !is_hashed(&stored_password) {
            let upgraded = hash_password(&stored_password);
            conn.execute(
                "UPDATE users SET password = ? WHERE username = ?",
                params![upgraded, username],
            )?;
            warn!(username, "Upgraded legacy plaintext password to SHA-256");
            stored_password = upgraded;
        }

        if stored_password == hash_password(password) {
            let role = Role::from_str(&role).map_err(Error::InvalidData)?;
            Ok(Some(role))
        } else {
            Ok(None)
        }
    }

    /// All accounts ordered by id
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT id, username, role FROM users ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;

        let mut users = Vec::new();
        for row in rows {
            let (id, username, role) = row?;
            users.push(User {
                id,
                username,
                role: Role::from_str(&role).map_err(Error::InvalidData)?,
            });
        }
        Ok(users)
    }

    /// Look up a user id by username
    pub fn user_id(&self, username: &str) -> Result<Option<i64>> {
        let conn = self.conn()?;

        let id = conn
            .query_row(
                "SELECT id FROM users WHERE username = ?",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Create a regular (non-admin) account
    pub fn add_user(&self, username: &str, password: &str) -> Result<i64> {
        let username = username.trim();

        if username.len() < 3 {
            return Err(Error::InvalidData(
                "Username must be at least 3 characters".into(),
            ));
        }
        if password.is_empty() {
            return Err(Error::InvalidData("Password must not be empty".into()));
        }

        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE username = ?",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(Error::Conflict(format!(
                "Username '{}' already exists",
                username
            )));
        }

        conn.execute(
            "INSERT INTO users (username, password, role) VALUES (?, ?, 'user')",
            params![username, hash_password(password)],
        )?;

        let id = conn.last_insert_rowid();
        info!(id, username, "Added user");
        Ok(id)
    }

    /// Delete an account
    ///
    /// The `admin` account is never deletable, and neither is any account
    /// that still owns expense records.
    pub fn delete_user(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;

        let username: Option<String> = conn
            .query_row(
                "SELECT username FROM users WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(username) = username else {
            return Err(Error::NotFound(format!("User {} does not exist", id)));
        };

        if username == "admin" {
            return Err(Error::NotPermitted(
                "The admin account cannot be deleted".into(),
            ));
        }

        let expense_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE user_id = ?",
            params![id],
            |row| row.get(0),
        )?;
        if expense_count > 0 {
            return Err(Error::InUse(format!(
                "User '{}' owns {} expense record(s) and cannot be deleted",
                username, expense_count
            )));
        }

        conn.execute("DELETE FROM users WHERE id = ?", params![id])?;
        info!(id, username = %username, "Deleted user");
        Ok(())
    }

    /// Change a user's username and/or password after re-verifying the
    /// current password
    ///
    /// The stored password gets the same legacy-plaintext treatment as
    /// `verify_user` before the comparison.
    pub fn update_credentials(
        &self,
        user_id: i64,
        old_password: &str,
        new_username: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<()> {
        let new_username = new_username.map(str::trim).filter(|s| !s.is_empty());
        let new_password = new_password.map(str::trim).filter(|s| !s.is_empty());

        if new_username.is_none() && new_password.is_none() {
            return Err(Error::InvalidData(
                "Provide a new username or a new password".into(),
            ));
        }

        let conn = self.conn()?;

        let record: Option<(String, String)> = conn
            .query_row(
                "SELECT username, password FROM users WHERE id = ?",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((_current_username, mut stored_password)) = record else {
            return Err(Error::NotFound(format!("User {} does not exist", user_id)));
        };

        if !is_hashed(&stored_password) {
            stored_password = hash_password(&stored_password);
        }
        if stored_password != hash_password(old_password) {
            return Err(Error::Unauthorized("Current password is incorrect".into()));
        }

        let mut fields = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(username) = new_username {
            let taken: Option<i64> = conn
                .query_row(
                    "SELECT id FROM users WHERE username = ? AND id != ?",
                    params![username, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Err(Error::Conflict(format!(
                    "Username '{}' already exists",
                    username
                )));
            }
            fields.push("username = ?");
            values.push(Box::new(username.to_string()));
        }

        if let Some(password) = new_password {
            if password.len() < 3 {
                return Err(Error::InvalidData(
                    "New password must be at least 3 characters".into(),
                ));
            }
            fields.push("password = ?");
            values.push(Box::new(hash_password(password)));
        }

        values.push(Box::new(user_id));
        let sql = format!("UPDATE users SET {} WHERE id = ?", fields.join(", "));
        let value_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let updated = conn.execute(&sql, value_refs.as_slice())?;

        if updated == 0 {
            return Err(Error::NotFound(format!("User {} does not exist", user_id)));
        }

        info!(user_id, "Updated user credentials");
        Ok(())
    }
}
