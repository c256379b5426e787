//! Report generation command implementations

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use nilufar_core::{export, Database};

pub fn cmd_report_summary(db: &Database, start: NaiveDate, end: NaiveDate) -> Result<()> {
    let totals = db.category_totals(start, end)?;

    if totals.is_empty() {
        println!("No expenses between {} and {}.", start, end);
        return Ok(());
    }

    let grand_total: f64 = totals.iter().map(|t| t.total_amount).sum();

    println!();
    println!("📊 Spending by Category  {} to {}", start, end);
    println!("   ─────────────────────────────────────────────");
    for row in &totals {
        let percentage = if grand_total > 0.0 {
            row.total_amount / grand_total * 100.0
        } else {
            0.0
        };
        println!(
            "   {:<12} {:>12}  {:>5.1}%",
            row.category_name_cn,
            format!("¥{:.2}", row.total_amount),
            percentage
        );
    }
    println!("   ─────────────────────────────────────────────");
    println!("   {:<12} {:>12}", "合计", format!("¥{:.2}", grand_total));

    Ok(())
}

pub fn cmd_report_export(
    db: &Database,
    start: NaiveDate,
    end: NaiveDate,
    output: &Path,
    category_id: Option<i64>,
    summary: bool,
) -> Result<()> {
    let rows = if summary {
        let totals = db.category_totals(start, end)?;
        export::export_summary_to_path(output, &totals)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        totals.len()
    } else {
        let records = db.expenses_in_range(start, end, category_id)?;
        export::export_expenses_to_path(output, &records)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        records.len()
    };

    println!(
        "✅ Exported {} row(s) for {} to {} into {}",
        rows,
        start,
        end,
        output.display()
    );
    Ok(())
}
