//! Nilufar CLI - Bilingual restaurant expense ledger
//!
//! Usage:
//!   nilufar init                         Initialize database
//!   nilufar login admin -p 123456        Verify a login
//!   nilufar expense add 42.50 -c 1       Record an expense
//!   nilufar report summary --from ... --to ...
//!   nilufar analyze --from1 ... --to1 ... --from2 ... --to2 ...

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init { seed } => commands::cmd_init(cli.db.as_deref(), seed.as_deref()),
        Commands::Login { username, password } => {
            let db = commands::open_db(cli.db.as_deref())?;
            commands::cmd_login(&db, &username, &password)
        }
        Commands::Expense { action } => {
            let db = commands::open_db(cli.db.as_deref())?;
            match action {
                ExpenseAction::Add {
                    amount,
                    category,
                    date,
                    operator,
                    notes,
                } => {
                    let date = commands::parse_date_or_today(date.as_deref())?;
                    commands::cmd_expense_add(
                        &db,
                        date,
                        amount,
                        category,
                        operator.as_deref(),
                        notes.as_deref(),
                    )
                }
                ExpenseAction::Edit { id, amount, notes } => {
                    commands::cmd_expense_edit(&db, id, amount, notes.as_deref())
                }
                ExpenseAction::Delete { id } => commands::cmd_expense_delete(&db, id),
                ExpenseAction::Day { date } => {
                    let date = commands::parse_date_or_today(date.as_deref())?;
                    commands::cmd_expense_day(&db, date)
                }
                ExpenseAction::List { from, to, category } => {
                    let (start, end) = commands::parse_range(&from, &to)?;
                    commands::cmd_expense_list(&db, start, end, category)
                }
                ExpenseAction::PurgeDay { date, yes } => {
                    let date = commands::parse_date_arg(&date)?;
                    commands::cmd_expense_purge_day(&db, date, yes)
                }
            }
        }
        Commands::Categories { action } => {
            let db = commands::open_db(cli.db.as_deref())?;
            match action {
                None => commands::cmd_categories_list(&db),
                Some(CategoriesAction::Add {
                    name_cn,
                    name_ug,
                    emoji,
                }) => commands::cmd_categories_add(&db, &name_cn, &name_ug, emoji.as_deref()),
                Some(CategoriesAction::Edit {
                    id,
                    name_cn,
                    name_ug,
                    emoji,
                }) => commands::cmd_categories_edit(
                    &db,
                    id,
                    name_cn.as_deref(),
                    name_ug.as_deref(),
                    emoji.as_deref(),
                ),
                Some(CategoriesAction::Delete { id }) => commands::cmd_categories_delete(&db, id),
            }
        }
        Commands::Users { action } => {
            let db = commands::open_db(cli.db.as_deref())?;
            match action {
                None => commands::cmd_users_list(&db),
                Some(UsersAction::Add { username, password }) => {
                    commands::cmd_users_add(&db, &username, &password)
                }
                Some(UsersAction::Delete { id }) => commands::cmd_users_delete(&db, id),
                Some(UsersAction::Passwd {
                    username,
                    old_password,
                    new_username,
                    new_password,
                }) => commands::cmd_users_passwd(
                    &db,
                    &username,
                    &old_password,
                    new_username.as_deref(),
                    new_password.as_deref(),
                ),
            }
        }
        Commands::Report { report_type } => {
            let db = commands::open_db(cli.db.as_deref())?;
            match report_type {
                ReportType::Summary { from, to } => {
                    let (start, end) = commands::parse_range(&from, &to)?;
                    commands::cmd_report_summary(&db, start, end)
                }
                ReportType::Export {
                    from,
                    to,
                    output,
                    category,
                    summary,
                } => {
                    let (start, end) = commands::parse_range(&from, &to)?;
                    commands::cmd_report_export(&db, start, end, &output, category, summary)
                }
            }
        }
        Commands::Analyze {
            from1,
            to1,
            from2,
            to2,
            output,
        } => {
            let db = commands::open_db(cli.db.as_deref())?;
            let period1 = commands::parse_range(&from1, &to1)?;
            let period2 = commands::parse_range(&from2, &to2)?;
            commands::cmd_analyze(&db, period1, period2, output.as_deref()).await
        }
        Commands::Config { action } => match action {
            None | Some(ConfigAction::Show) => commands::cmd_config_show(),
            Some(ConfigAction::SetKey { key }) => commands::cmd_config_set_key(&key),
            Some(ConfigAction::Test) => commands::cmd_config_test().await,
        },
    }
}
