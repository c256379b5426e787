//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init/login commands and shared utilities (open_db, date parsing)
//! - `expenses` - Expense record commands (add, edit, delete, day, list, purge-day)
//! - `categories` - Category management commands
//! - `users` - Operator account commands
//! - `reports` - Summary report and CSV export commands
//! - `analyze` - AI comparative analysis command
//! - `config` - Config file commands (show, set-key, test)

pub mod analyze;
pub mod categories;
pub mod config;
pub mod core;
pub mod expenses;
pub mod reports;
pub mod users;

// Re-export command functions for main.rs
pub use analyze::*;
pub use categories::*;
pub use config::*;
pub use core::*;
pub use expenses::*;
pub use reports::*;
pub use users::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
