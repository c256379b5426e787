//! Nilufar Core Library
//!
//! Shared functionality for the Nilufar restaurant expense ledger:
//! - Database access, schema migrations, and first-run seeding
//! - Expense, category, and user data access with sequence bookkeeping
//! - Per-user configuration (DeepSeek API key, analysis tuning)
//! - DeepSeek comparative-analysis backend
//! - CSV export for expense listings and summaries

pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;

pub use ai::{AnalysisBackend, DeepSeekBackend, MockBackend, PeriodSummary};
pub use config::Config;
pub use db::{hash_password, Database};
pub use error::{AnalysisErrorKind, Error, Result};
pub use models::{Category, CategoryTotal, ExpenseRecord, NewExpense, Role, User};
