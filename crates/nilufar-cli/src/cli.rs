//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Nilufar - Restaurant expense ledger with AI analysis
#[derive(Parser)]
#[command(name = "nilufar")]
#[command(about = "Bilingual restaurant expense ledger", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (defaults to the per-user data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init {
        /// Bundled seed database to install on first run
        #[arg(long)]
        seed: Option<PathBuf>,
    },

    /// Verify an operator login and remember the username
    Login {
        /// Username
        username: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },

    /// Manage expense records
    Expense {
        #[command(subcommand)]
        action: ExpenseAction,
    },

    /// Manage expense categories
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Manage operator accounts
    Users {
        #[command(subcommand)]
        action: Option<UsersAction>,
    },

    /// Reports over a date range
    Report {
        #[command(subcommand)]
        report_type: ReportType,
    },

    /// AI comparative analysis of two spending periods
    Analyze {
        /// First period start (YYYY-MM-DD)
        #[arg(long)]
        from1: String,

        /// First period end (YYYY-MM-DD)
        #[arg(long)]
        to1: String,

        /// Second period start (YYYY-MM-DD)
        #[arg(long)]
        from2: String,

        /// Second period end (YYYY-MM-DD)
        #[arg(long)]
        to2: String,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage configuration (API key, analysis tuning)
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ExpenseAction {
    /// Record an expense
    Add {
        /// Amount in yuan
        amount: f64,

        /// Category id (see 'nilufar categories')
        #[arg(short, long)]
        category: i64,

        /// Expense date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Operator username (defaults to the last login)
        #[arg(long)]
        operator: Option<String>,

        /// Free-form note
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Correct an expense amount or note
    Edit {
        /// Expense id
        id: i64,

        /// New amount in yuan
        #[arg(short, long)]
        amount: f64,

        /// New note (replaces the old one)
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete one expense (its day/category sequence is renumbered)
    Delete {
        /// Expense id
        id: i64,
    },

    /// List one day's expenses
    Day {
        /// Date (YYYY-MM-DD, defaults to today)
        date: Option<String>,
    },

    /// List expenses in a date range, newest first
    List {
        /// Range start (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Range end (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Only this category id
        #[arg(short, long)]
        category: Option<i64>,
    },

    /// Delete every expense for one day
    PurgeDay {
        /// Date (YYYY-MM-DD)
        date: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// Add a category
    Add {
        /// Chinese name
        name_cn: String,

        /// Uyghur name
        name_ug: String,

        /// Display emoji
        #[arg(short, long)]
        emoji: Option<String>,
    },

    /// Edit a category's names or emoji
    Edit {
        /// Category id
        id: i64,

        /// New Chinese name
        #[arg(long)]
        name_cn: Option<String>,

        /// New Uyghur name
        #[arg(long)]
        name_ug: Option<String>,

        /// New display emoji
        #[arg(long)]
        emoji: Option<String>,
    },

    /// Delete a category (refused while expenses reference it)
    Delete {
        /// Category id
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// Add a regular operator account
    Add {
        /// Username (at least 3 characters)
        username: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },

    /// Delete an account (never 'admin', never one that owns expenses)
    Delete {
        /// User id
        id: i64,
    },

    /// Change a username and/or password
    Passwd {
        /// Current username
        username: String,

        /// Current password
        #[arg(long)]
        old_password: String,

        /// New username
        #[arg(long)]
        new_username: Option<String>,

        /// New password (at least 3 characters)
        #[arg(long)]
        new_password: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Per-category totals over a date range
    Summary {
        /// Range start (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Range end (YYYY-MM-DD)
        #[arg(long)]
        to: String,
    },

    /// Export a range to CSV
    Export {
        /// Range start (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Range end (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Only this category id
        #[arg(short, long)]
        category: Option<i64>,

        /// Export per-category totals instead of the detail listing
        #[arg(long)]
        summary: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the config file contents (API key masked)
    Show,

    /// Store the DeepSeek API key
    SetKey {
        /// API key (starts with "sk-")
        key: String,
    },

    /// Send a cheap round trip to verify the API key and connectivity
    Test,
}
