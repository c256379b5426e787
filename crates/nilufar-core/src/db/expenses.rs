//! Expense operations
//!
//! Each write is one independently committed unit of work. Inserts and
//! deletes maintain the per-(date, category) sequence invariant: the
//! surviving sequence numbers for any pair are always exactly 1..=n.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};

use super::{parse_date, Database};
use crate::error::{Error, Result};
use crate::models::{CategoryTotal, ExpenseRecord, NewExpense};

const RECORD_SELECT: &str = r#"
    SELECT e.id, e.expense_date, e.amount, e.notes, e.sequence_number,
           c.id, c.name_cn, c.name_ug,
           u.username
    FROM expenses e
    JOIN categories c ON e.category_id = c.id
    JOIN users u ON e.user_id = u.id
"#;

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ExpenseRecord> {
    let date_str: String = row.get(1)?;
    Ok(ExpenseRecord {
        id: row.get(0)?,
        expense_date: parse_date(&date_str),
        amount: row.get(2)?,
        notes: row.get(3)?,
        sequence_number: row.get(4)?,
        category_id: row.get(5)?,
        category_name_cn: row.get(6)?,
        category_name_ug: row.get(7)?,
        username: row.get(8)?,
    })
}

impl Database {
    /// Insert an expense, assigning the next sequence number for its
    /// (date, category) pair
    ///
    /// The max+1 computation and the insert run in one transaction so two
    /// concurrent inserts cannot claim the same sequence number.
    pub fn add_expense(&self, expense: &NewExpense) -> Result<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let next_sequence: i64 = tx.query_row(
            r#"
            SELECT COALESCE(MAX(sequence_number), 0) + 1
            FROM expenses
            WHERE expense_date = ? AND category_id = ?
            "#,
            params![expense.expense_date.to_string(), expense.category_id],
            |row| row.get(0),
        )?;

        tx.execute(
            r#"
            INSERT INTO expenses (expense_date, amount, category_id, user_id, notes, sequence_number)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                expense.expense_date.to_string(),
                expense.amount,
                expense.category_id,
                expense.user_id,
                expense.notes,
                next_sequence,
            ],
        )?;

        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!(id, sequence = next_sequence, "Inserted expense");
        Ok(id)
    }

    /// Update the amount and notes of an expense by primary key
    pub fn update_expense(&self, id: i64, amount: f64, notes: Option<&str>) -> Result<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            "UPDATE expenses SET amount = ?, notes = ? WHERE id = ?",
            params![amount, notes, id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Expense {} does not exist", id)));
        }
        Ok(())
    }

    /// Delete an expense and close the gap it leaves in its (date, category)
    /// sequence
    ///
    /// Every surviving row of the same pair with a strictly greater sequence
    /// number is decremented by one, keeping the sequence dense.
    pub fn delete_expense(&self, id: i64) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let target: Option<(String, i64, i64)> = tx
            .query_row(
                "SELECT expense_date, category_id, sequence_number FROM expenses WHERE id = ?",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((expense_date, category_id, deleted_sequence)) = target else {
            return Err(Error::NotFound(format!("Expense {} does not exist", id)));
        };

        tx.execute("DELETE FROM expenses WHERE id = ?", params![id])?;

        tx.execute(
            r#"
            UPDATE expenses
            SET sequence_number = sequence_number - 1
            WHERE expense_date = ? AND category_id = ? AND sequence_number > ?
            "#,
            params![expense_date, category_id, deleted_sequence],
        )?;

        tx.commit()?;
        debug!(id, "Deleted expense and renumbered sequence");
        Ok(())
    }

    /// All expenses for one day, joined with category and operator,
    /// ordered by category name then sequence number
    pub fn expenses_for_date(&self, date: NaiveDate) -> Result<Vec<ExpenseRecord>> {
        let conn = self.conn()?;

        let sql = format!(
            "{} WHERE e.expense_date = ? ORDER BY c.name_cn, e.sequence_number",
            RECORD_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![date.to_string()], record_from_row)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Expenses in an inclusive date range, optionally filtered by category,
    /// newest first
    pub fn expenses_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        category_id: Option<i64>,
    ) -> Result<Vec<ExpenseRecord>> {
        let conn = self.conn()?;

        let records = if let Some(cat) = category_id {
            let sql = format!(
                r#"{}
                WHERE e.expense_date >= ? AND e.expense_date <= ? AND e.category_id = ?
                ORDER BY e.expense_date DESC, e.id DESC
                "#,
                RECORD_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![start.to_string(), end.to_string(), cat],
                record_from_row,
            )?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        } else {
            let sql = format!(
                r#"{}
                WHERE e.expense_date >= ? AND e.expense_date <= ?
                ORDER BY e.expense_date DESC, e.id DESC
                "#,
                RECORD_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![start.to_string(), end.to_string()],
                record_from_row,
            )?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        Ok(records)
    }

    /// Total spend per category over an inclusive date range, largest first
    pub fn category_totals(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<CategoryTotal>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT c.name_cn, SUM(e.amount) as total_amount
            FROM expenses e
            JOIN categories c ON e.category_id = c.id
            WHERE e.expense_date >= ? AND e.expense_date <= ?
            GROUP BY c.id, c.name_cn
            ORDER BY total_amount DESC
            "#,
        )?;

        let rows = stmt.query_map(params![start.to_string(), end.to_string()], |row| {
            Ok(CategoryTotal {
                category_name_cn: row.get(0)?,
                total_amount: row.get(1)?,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Delete every expense for one day, returning the number of rows removed
    ///
    /// Zero is a normal outcome for a day with no records; failures surface
    /// as errors rather than sentinel values.
    pub fn delete_expenses_for_date(&self, date: NaiveDate) -> Result<usize> {
        let conn = self.conn()?;

        let deleted = conn.execute(
            "DELETE FROM expenses WHERE expense_date = ?",
            params![date.to_string()],
        )?;

        if deleted > 0 {
            info!(date = %date, count = deleted, "Deleted all expenses for day");
        }
        Ok(deleted)
    }
}
