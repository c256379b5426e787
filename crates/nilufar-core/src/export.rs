//! Spreadsheet export
//!
//! Writes expense listings and category summaries as CSV: one header row,
//! one row per record, and a closing totals row.

use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::models::{CategoryTotal, ExpenseRecord};

/// Write a detailed expense listing
pub fn write_expenses_csv<W: Write>(writer: W, records: &[ExpenseRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([
        "日期",
        "分类(中文)",
        "分类(维语)",
        "金额",
        "操作员",
        "备注",
        "序号",
    ])?;

    let mut total = 0.0;
    for record in records {
        total += record.amount;
        csv_writer.write_record([
            record.expense_date.to_string().as_str(),
            record.category_name_cn.as_str(),
            record.category_name_ug.as_str(),
            format!("{:.2}", record.amount).as_str(),
            record.username.as_str(),
            record.notes.as_deref().unwrap_or(""),
            record.sequence_number.to_string().as_str(),
        ])?;
    }

    csv_writer.write_record([
        "合计",
        "",
        "",
        format!("{:.2}", total).as_str(),
        "",
        "",
        "",
    ])?;

    csv_writer.flush()?;
    Ok(())
}

/// Write a per-category summary
pub fn write_summary_csv<W: Write>(writer: W, totals: &[CategoryTotal]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["分类", "总金额"])?;

    let mut grand_total = 0.0;
    for row in totals {
        grand_total += row.total_amount;
        csv_writer.write_record([
            row.category_name_cn.as_str(),
            format!("{:.2}", row.total_amount).as_str(),
        ])?;
    }

    csv_writer.write_record(["合计", format!("{:.2}", grand_total).as_str()])?;

    csv_writer.flush()?;
    Ok(())
}

/// Write an expense listing to a file path
pub fn export_expenses_to_path(path: &Path, records: &[ExpenseRecord]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_expenses_csv(file, records)
}

/// Write a category summary to a file path
pub fn export_summary_to_path(path: &Path, totals: &[CategoryTotal]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_summary_csv(file, totals)
}
