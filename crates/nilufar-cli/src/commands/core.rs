//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - date/range parsing helpers used by every command that takes dates
//! - `cmd_init` - Initialize the database
//! - `cmd_login` - Verify an operator login

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use nilufar_core::{config, Database};

/// Resolve the database location: explicit `--db` beats the per-user default
pub fn resolve_db_path(db: Option<&Path>) -> Result<PathBuf> {
    match db {
        Some(path) => Ok(path.to_path_buf()),
        None => config::default_db_path().context("Cannot determine the default database path"),
    }
}

/// Open the database, creating schema and seed rows if needed
pub fn open_db(db: Option<&Path>) -> Result<Database> {
    let path = resolve_db_path(db)?;
    Database::open(&path)
        .with_context(|| format!("Failed to open database at {}", path.display()))
}

/// Parse a YYYY-MM-DD argument
pub fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD)", s))
}

/// Parse an optional date argument, defaulting to today
pub fn parse_date_or_today(s: Option<&str>) -> Result<NaiveDate> {
    match s {
        Some(s) => parse_date_arg(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Parse and validate an inclusive date range
pub fn parse_range(from: &str, to: &str) -> Result<(NaiveDate, NaiveDate)> {
    let start = parse_date_arg(from)?;
    let end = parse_date_arg(to)?;
    if start > end {
        bail!("Range start {} is after range end {}", start, end);
    }
    Ok((start, end))
}

pub fn cmd_init(db: Option<&Path>, seed: Option<&Path>) -> Result<()> {
    let path = resolve_db_path(db)?;
    println!("🔧 Initializing database at {}...", path.display());

    let database = Database::initialize(&path, seed).context("Failed to initialize database")?;

    let categories = database.list_categories()?;
    println!("   Categories: {}", categories.len());
    println!("   Accounts:   {}", database.list_users()?.len());

    println!("✅ Database ready!");
    println!();
    println!("Next steps:");
    println!("  1. Log in:           nilufar login admin -p 123456");
    println!("  2. Record an expense: nilufar expense add 42.50 --category 1");

    Ok(())
}

pub fn cmd_login(db: &Database, username: &str, password: &str) -> Result<()> {
    match db.verify_user(username, password)? {
        Some(role) => {
            config::save_last_username(username);
            println!("✅ Logged in as '{}' ({})", username, role);
            Ok(())
        }
        None => bail!("Invalid username or password"),
    }
}
