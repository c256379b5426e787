//! Expense record command implementations

use anyhow::{bail, Result};
use chrono::NaiveDate;
use nilufar_core::{config, Database, ExpenseRecord, NewExpense};

use super::truncate;

/// Resolve the operator recording an expense: explicit flag, then the
/// remembered last login
fn resolve_operator(db: &Database, operator: Option<&str>) -> Result<i64> {
    let username = match operator {
        Some(name) => name.to_string(),
        None => match config::last_username() {
            Some(name) => {
                tracing::debug!("Using remembered operator '{}'", name);
                name
            }
            None => bail!("No operator given and no remembered login; use --operator or 'nilufar login'"),
        },
    };

    match db.user_id(&username)? {
        Some(id) => Ok(id),
        None => bail!("Unknown operator '{}'", username),
    }
}

fn print_records(records: &[ExpenseRecord]) {
    let mut total = 0.0;
    for record in records {
        total += record.amount;
        println!(
            "   [{:>4}] {} │ {} #{} │ {:>10} │ {} │ {}",
            record.id,
            record.expense_date,
            record.category_name_cn,
            record.sequence_number,
            format!("¥{:.2}", record.amount),
            record.username,
            truncate(record.notes.as_deref().unwrap_or(""), 30),
        );
    }
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Total: ¥{:.2} across {} record(s)", total, records.len());
}

pub fn cmd_expense_add(
    db: &Database,
    date: NaiveDate,
    amount: f64,
    category_id: i64,
    operator: Option<&str>,
    notes: Option<&str>,
) -> Result<()> {
    if amount <= 0.0 || !amount.is_finite() {
        bail!("Amount must be a positive number, got {}", amount);
    }

    let category = db.get_category(category_id)?;
    let user_id = resolve_operator(db, operator)?;

    let id = db.add_expense(&NewExpense {
        expense_date: date,
        amount,
        category_id,
        user_id,
        notes: notes.map(str::to_string),
    })?;

    println!(
        "✅ Recorded expense [{}]: {} {} ¥{:.2} on {}",
        id, category.emoji, category.name_cn, amount, date
    );
    Ok(())
}

pub fn cmd_expense_edit(db: &Database, id: i64, amount: f64, notes: Option<&str>) -> Result<()> {
    if amount <= 0.0 || !amount.is_finite() {
        bail!("Amount must be a positive number, got {}", amount);
    }

    db.update_expense(id, amount, notes)?;
    println!("✅ Updated expense [{}]: ¥{:.2}", id, amount);
    Ok(())
}

pub fn cmd_expense_delete(db: &Database, id: i64) -> Result<()> {
    db.delete_expense(id)?;
    println!("✅ Deleted expense [{}] and renumbered its day", id);
    Ok(())
}

pub fn cmd_expense_day(db: &Database, date: NaiveDate) -> Result<()> {
    let records = db.expenses_for_date(date)?;

    if records.is_empty() {
        println!("No expenses recorded on {}.", date);
        return Ok(());
    }

    println!();
    println!("📝 Expenses on {}", date);
    println!("   ─────────────────────────────────────────────────────────────");
    print_records(&records);
    Ok(())
}

pub fn cmd_expense_list(
    db: &Database,
    start: NaiveDate,
    end: NaiveDate,
    category_id: Option<i64>,
) -> Result<()> {
    if let Some(id) = category_id {
        // Surface a readable error before running the range query
        db.get_category(id)?;
    }
    let records = db.expenses_in_range(start, end, category_id)?;

    if records.is_empty() {
        println!("No expenses between {} and {}.", start, end);
        return Ok(());
    }

    println!();
    println!("📝 Expenses {} to {}", start, end);
    println!("   ─────────────────────────────────────────────────────────────");
    print_records(&records);
    Ok(())
}

pub fn cmd_expense_purge_day(db: &Database, date: NaiveDate, yes: bool) -> Result<()> {
    let count = db.expenses_for_date(date)?.len();
    if count == 0 {
        println!("No expenses recorded on {}; nothing to delete.", date);
        return Ok(());
    }

    if !yes {
        tracing::warn!("Purge of {} aborted: --yes not given", date);
        println!(
            "⚠️  This would delete {} expense record(s) on {}.",
            count, date
        );
        println!("   Re-run with --yes to confirm.");
        return Ok(());
    }

    let deleted = db.delete_expenses_for_date(date)?;
    println!("✅ Deleted {} expense record(s) on {}", deleted, date);
    Ok(())
}
