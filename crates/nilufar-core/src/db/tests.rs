//! Database tests

use super::*;
use crate::error::Error;
use crate::models::{NewExpense, Role};

use chrono::NaiveDate;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn new_expense(db: &Database, day: &str, amount: f64, category_id: i64) -> NewExpense {
    let user_id = db.user_id("admin").unwrap().unwrap();
    NewExpense {
        expense_date: date(day),
        amount,
        category_id,
        user_id,
        notes: None,
    }
}

/// Sequence numbers for a (date, category) pair, in stored order
fn sequences(db: &Database, day: &str, category_id: i64) -> Vec<i64> {
    let conn = db.conn().unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT sequence_number FROM expenses
             WHERE expense_date = ? AND category_id = ?
             ORDER BY sequence_number",
        )
        .unwrap();
    let rows = stmt
        .query_map(params![day, category_id], |row| row.get(0))
        .unwrap();
    rows.collect::<rusqlite::Result<Vec<i64>>>().unwrap()
}

#[test]
fn test_first_run_seeds_admin_and_categories() {
    let db = Database::in_memory().unwrap();

    let users = db.list_users().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "admin");
    assert_eq!(users[0].role, Role::Admin);

    let categories = db.list_categories().unwrap();
    assert_eq!(categories.len(), 12);
    assert_eq!(categories[0].name_cn, "羊肉");
    assert_eq!(categories[0].emoji, "🐑");

    // Default admin password works
    let role = db.verify_user("admin", "123456").unwrap();
    assert_eq!(role, Some(Role::Admin));
}

#[test]
fn test_seeding_is_idempotent() {
    let db = Database::in_memory().unwrap();
    let path = db.path().to_path_buf();
    drop(db);

    let db = Database::open(&path).unwrap();
    assert_eq!(db.list_users().unwrap().len(), 1);
    assert_eq!(db.list_categories().unwrap().len(), 12);
}

#[test]
fn test_emoji_migration_on_legacy_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    // A pre-emoji database as the original application would have created it
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name_cn TEXT NOT NULL UNIQUE,
                name_ug TEXT NOT NULL UNIQUE
            );
            INSERT INTO categories (name_cn, name_ug) VALUES ('羊肉', 'قوي گۆشى');
            INSERT INTO categories (name_cn, name_ug) VALUES ('神秘分类', 'sirliq');
            "#,
        )
        .unwrap();
    }

    let db = Database::open(&path).unwrap();
    let categories = db.list_categories().unwrap();

    let lamb = categories.iter().find(|c| c.name_cn == "羊肉").unwrap();
    assert_eq!(lamb.emoji, "🐑", "known names are backfilled");

    let unknown = categories.iter().find(|c| c.name_cn == "神秘分类").unwrap();
    assert_eq!(unknown.emoji, "📝", "unknown names get the default");
}

#[test]
fn test_seed_file_copied_on_first_run() {
    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("seed.db");
    let target = dir.path().join("data").join("restaurant.db");

    // Build a marker database to act as the bundled seed
    {
        let db = Database::open(&seed).unwrap();
        db.add_user("marker_user", "secret").unwrap();
    }

    let db = Database::initialize(&target, Some(seed.as_path())).unwrap();
    assert!(
        db.user_id("marker_user").unwrap().is_some(),
        "seed contents must survive the copy"
    );

    // Second initialize leaves the existing database alone
    drop(db);
    let db = Database::initialize(&target, Some(seed.as_path())).unwrap();
    assert!(db.user_id("marker_user").unwrap().is_some());
}

#[test]
fn test_add_expense_round_trip() {
    let db = Database::in_memory().unwrap();
    let mut expense = new_expense(&db, "2025-03-01", 42.50, 1);
    expense.notes = Some("x".to_string());

    db.add_expense(&expense).unwrap();

    let records = db.expenses_for_date(date("2025-03-01")).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].amount, 42.50);
    assert_eq!(records[0].notes.as_deref(), Some("x"));
    assert_eq!(records[0].sequence_number, 1);
    assert_eq!(records[0].category_name_cn, "羊肉");
    assert_eq!(records[0].username, "admin");
}

#[test]
fn test_sequence_assignment_per_date_and_category() {
    let db = Database::in_memory().unwrap();

    db.add_expense(&new_expense(&db, "2025-01-01", 10.0, 1)).unwrap();
    db.add_expense(&new_expense(&db, "2025-01-01", 20.0, 1)).unwrap();
    db.add_expense(&new_expense(&db, "2025-01-01", 30.0, 2)).unwrap();
    db.add_expense(&new_expense(&db, "2025-01-02", 40.0, 1)).unwrap();

    assert_eq!(sequences(&db, "2025-01-01", 1), vec![1, 2]);
    assert_eq!(sequences(&db, "2025-01-01", 2), vec![1]);
    assert_eq!(sequences(&db, "2025-01-02", 1), vec![1]);
}

#[test]
fn test_delete_keeps_sequence_dense() {
    let db = Database::in_memory().unwrap();

    let a = db.add_expense(&new_expense(&db, "2025-01-01", 10.0, 5)).unwrap();
    let b = db.add_expense(&new_expense(&db, "2025-01-01", 20.0, 5)).unwrap();
    let c = db.add_expense(&new_expense(&db, "2025-01-01", 30.0, 5)).unwrap();
    assert_eq!(sequences(&db, "2025-01-01", 5), vec![1, 2, 3]);

    // Delete the middle row; the former 3 must become 2
    db.delete_expense(b).unwrap();
    assert_eq!(sequences(&db, "2025-01-01", 5), vec![1, 2]);

    // A later insert continues from the dense maximum
    let d = db.add_expense(&new_expense(&db, "2025-01-01", 40.0, 5)).unwrap();
    assert_eq!(sequences(&db, "2025-01-01", 5), vec![1, 2, 3]);

    // Deleting the head renumbers everything behind it
    db.delete_expense(a).unwrap();
    assert_eq!(sequences(&db, "2025-01-01", 5), vec![1, 2]);

    // Other rows untouched by all of the above
    db.delete_expense(c).unwrap();
    db.delete_expense(d).unwrap();
    assert!(sequences(&db, "2025-01-01", 5).is_empty());
}

#[test]
fn test_delete_expense_not_found() {
    let db = Database::in_memory().unwrap();
    let err = db.delete_expense(999).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_update_expense() {
    let db = Database::in_memory().unwrap();
    let id = db.add_expense(&new_expense(&db, "2025-01-01", 10.0, 1)).unwrap();

    db.update_expense(id, 99.5, Some("corrected")).unwrap();

    let records = db.expenses_for_date(date("2025-01-01")).unwrap();
    assert_eq!(records[0].amount, 99.5);
    assert_eq!(records[0].notes.as_deref(), Some("corrected"));

    let err = db.update_expense(999, 1.0, None).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_expenses_for_date_ordering() {
    let db = Database::in_memory().unwrap();

    // Grouped by category name, then by sequence within the category
    db.add_expense(&new_expense(&db, "2025-01-01", 10.0, 1)).unwrap(); // 羊肉
    db.add_expense(&new_expense(&db, "2025-01-01", 20.0, 1)).unwrap(); // 羊肉
    db.add_expense(&new_expense(&db, "2025-01-01", 30.0, 7)).unwrap(); // 调料

    let records = db.expenses_for_date(date("2025-01-01")).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].category_name_cn, records[1].category_name_cn);
    assert_eq!(records[0].sequence_number, 1);
    assert_eq!(records[1].sequence_number, 2);
    assert_eq!(records[2].category_name_cn, "调料");
    assert_eq!(records[2].sequence_number, 1);
}

#[test]
fn test_expenses_in_range_filters_and_orders() {
    let db = Database::in_memory().unwrap();

    db.add_expense(&new_expense(&db, "2025-01-01", 10.0, 1)).unwrap();
    db.add_expense(&new_expense(&db, "2025-01-05", 20.0, 2)).unwrap();
    db.add_expense(&new_expense(&db, "2025-01-10", 30.0, 1)).unwrap();
    db.add_expense(&new_expense(&db, "2025-02-01", 40.0, 1)).unwrap();

    let all = db
        .expenses_in_range(date("2025-01-01"), date("2025-01-31"), None)
        .unwrap();
    assert_eq!(all.len(), 3);
    // Newest first
    assert_eq!(all[0].expense_date, date("2025-01-10"));
    assert_eq!(all[2].expense_date, date("2025-01-01"));

    let lamb_only = db
        .expenses_in_range(date("2025-01-01"), date("2025-01-31"), Some(1))
        .unwrap();
    assert_eq!(lamb_only.len(), 2);

    let empty = db
        .expenses_in_range(date("2024-01-01"), date("2024-12-31"), None)
        .unwrap();
    assert!(empty.is_empty());
}

#[test]
fn test_category_totals_match_manual_aggregation() {
    let db = Database::in_memory().unwrap();

    db.add_expense(&new_expense(&db, "2025-01-01", 10.5, 1)).unwrap();
    db.add_expense(&new_expense(&db, "2025-01-02", 20.0, 1)).unwrap();
    db.add_expense(&new_expense(&db, "2025-01-03", 5.0, 2)).unwrap();
    db.add_expense(&new_expense(&db, "2025-01-04", 100.0, 3)).unwrap();
    // Out of range
    db.add_expense(&new_expense(&db, "2025-02-01", 999.0, 1)).unwrap();

    let start = date("2025-01-01");
    let end = date("2025-01-31");
    let totals = db.category_totals(start, end).unwrap();

    // Descending by total
    assert!(totals.windows(2).all(|w| w[0].total_amount >= w[1].total_amount));

    // Each total equals the manually filtered sum over the detail query
    let details = db.expenses_in_range(start, end, None).unwrap();
    for row in &totals {
        let manual: f64 = details
            .iter()
            .filter(|d| d.category_name_cn == row.category_name_cn)
            .map(|d| d.amount)
            .sum();
        assert!((row.total_amount - manual).abs() < 1e-9);
    }

    let grand: f64 = totals.iter().map(|t| t.total_amount).sum();
    assert!((grand - 135.5).abs() < 1e-9);
}

#[test]
fn test_delete_all_for_date_counts() {
    let db = Database::in_memory().unwrap();

    assert_eq!(db.delete_expenses_for_date(date("2025-01-01")).unwrap(), 0);

    db.add_expense(&new_expense(&db, "2025-01-01", 10.0, 1)).unwrap();
    db.add_expense(&new_expense(&db, "2025-01-01", 20.0, 2)).unwrap();
    db.add_expense(&new_expense(&db, "2025-01-02", 30.0, 1)).unwrap();

    assert_eq!(db.delete_expenses_for_date(date("2025-01-01")).unwrap(), 2);
    assert!(db.expenses_for_date(date("2025-01-01")).unwrap().is_empty());
    assert_eq!(db.expenses_for_date(date("2025-01-02")).unwrap().len(), 1);
}

#[test]
fn test_add_category_rejects_duplicates_and_blanks() {
    let db = Database::in_memory().unwrap();

    let id = db.add_category("干果", "قۇرۇق مېۋە", "🥜").unwrap();
    assert!(id > 0);

    assert!(matches!(
        db.add_category("干果", "basqa", "📝").unwrap_err(),
        Error::Conflict(_)
    ));
    assert!(matches!(
        db.add_category("其他", "قۇرۇق مېۋە", "📝").unwrap_err(),
        Error::Conflict(_)
    ));
    assert!(matches!(
        db.add_category("  ", "x", "📝").unwrap_err(),
        Error::InvalidData(_)
    ));
}

#[test]
fn test_update_category_uniqueness_excludes_self() {
    let db = Database::in_memory().unwrap();
    let id = db.add_category("干果", "قۇرۇق مېۋە", "🥜").unwrap();

    // Renaming to its own name is fine
    db.update_category(id, Some("干果"), None, None).unwrap();
    // Renaming onto a seeded name is not
    assert!(matches!(
        db.update_category(id, Some("羊肉"), None, None).unwrap_err(),
        Error::Conflict(_)
    ));

    db.update_category(id, None, None, Some("🌰")).unwrap();
    assert_eq!(db.get_category(id).unwrap().emoji, "🌰");

    assert!(matches!(
        db.update_category(id, None, None, None).unwrap_err(),
        Error::InvalidData(_)
    ));
    assert!(matches!(
        db.update_category(999, Some("x"), None, None).unwrap_err(),
        Error::NotFound(_)
    ));
}

#[test]
fn test_delete_category_guarded_by_references() {
    let db = Database::in_memory().unwrap();

    db.add_expense(&new_expense(&db, "2025-01-01", 10.0, 1)).unwrap();
    db.add_expense(&new_expense(&db, "2025-01-02", 20.0, 1)).unwrap();

    let err = db.delete_category(1).unwrap_err();
    match err {
        Error::InUse(message) => assert!(message.contains('2'), "message carries the count"),
        other => panic!("Expected InUse, got {:?}", other),
    }
    assert_eq!(db.category_usage(1).unwrap(), 2);

    db.delete_expenses_for_date(date("2025-01-01")).unwrap();
    db.delete_expenses_for_date(date("2025-01-02")).unwrap();
    db.delete_category(1).unwrap();
    assert!(matches!(db.get_category(1).unwrap_err(), Error::NotFound(_)));
}

#[test]
fn test_add_user_validation() {
    let db = Database::in_memory().unwrap();

    assert!(matches!(
        db.add_user("ab", "pw").unwrap_err(),
        Error::InvalidData(_)
    ));
    assert!(matches!(
        db.add_user("gulnar", "").unwrap_err(),
        Error::InvalidData(_)
    ));

    db.add_user("gulnar", "secret").unwrap();
    assert!(matches!(
        db.add_user("gulnar", "other").unwrap_err(),
        Error::Conflict(_)
    ));

    assert_eq!(db.verify_user("gulnar", "secret").unwrap(), Some(Role::User));
    assert_eq!(db.verify_user("gulnar", "wrong").unwrap(), None);
    assert_eq!(db.verify_user("nobody", "x").unwrap(), None);
}

#[test]
fn test_admin_account_never_deletable() {
    let db = Database::in_memory().unwrap();
    let admin_id = db.user_id("admin").unwrap().unwrap();

    assert!(matches!(
        db.delete_user(admin_id).unwrap_err(),
        Error::NotPermitted(_)
    ));

    // Still there regardless of other state
    db.add_user("gulnar", "secret").unwrap();
    assert!(matches!(
        db.delete_user(admin_id).unwrap_err(),
        Error::NotPermitted(_)
    ));
}

#[test]
fn test_delete_user_guarded_by_expenses() {
    let db = Database::in_memory().unwrap();
    let id = db.add_user("gulnar", "secret").unwrap();

    db.add_expense(&NewExpense {
        expense_date: date("2025-01-01"),
        amount: 10.0,
        category_id: 1,
        user_id: id,
        notes: None,
    })
    .unwrap();

    assert!(matches!(db.delete_user(id).unwrap_err(), Error::InUse(_)));

    db.delete_expenses_for_date(date("2025-01-01")).unwrap();
    db.delete_user(id).unwrap();
    assert!(db.user_id("gulnar").unwrap().is_none());

    assert!(matches!(db.delete_user(999).unwrap_err(), Error::NotFound(_)));
}

#[test]
fn test_legacy_plaintext_password_upgrade() {
    let db = Database::in_memory().unwrap();

    // A pre-hashing account with the password stored in the clear
    {
        let conn = db.conn().unwrap();
        conn.execute(
            "INSERT INTO users (username, password, role) VALUES ('legacy', '123456', 'user')",
            [],
        )
        .unwrap();
    }

    // First successful verification rewrites storage to the hash
    assert_eq!(db.verify_user("legacy", "123456").unwrap(), Some(Role::User));

    let stored: String = {
        let conn = db.conn().unwrap();
        conn.query_row(
            "SELECT password FROM users WHERE username = 'legacy'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    };
    assert_eq!(stored, hash_password("123456"));

    // Subsequent calls compare hash-to-hash and still succeed
    assert_eq!(db.verify_user("legacy", "123456").unwrap(), Some(Role::User));
    assert_eq!(db.verify_user("legacy", "wrong").unwrap(), None);
}

#[test]
fn test_legacy_upgrade_on_failed_attempt_still_persists_hash() {
    let db = Database::in_memory().unwrap();
    {
        let conn = db.conn().unwrap();
        conn.execute(
            "INSERT INTO users (username, password, role) VALUES ('legacy', 'pw', 'user')",
            [],
        )
        .unwrap();
    }

    // Wrong password: upgrade happens, login still denied
    assert_eq!(db.verify_user("legacy", "nope").unwrap(), None);
    assert_eq!(db.verify_user("legacy", "pw").unwrap(), Some(Role::User));
}

#[test]
fn test_update_credentials() {
    let db = Database::in_memory().unwrap();
    let id = db.add_user("gulnar", "secret").unwrap();

    assert!(matches!(
        db.update_credentials(id, "secret", None, None).unwrap_err(),
        Error::InvalidData(_)
    ));
    assert!(matches!(
        db.update_credentials(id, "wrong", None, Some("newpw")).unwrap_err(),
        Error::Unauthorized(_)
    ));
    assert!(matches!(
        db.update_credentials(id, "secret", None, Some("ab")).unwrap_err(),
        Error::InvalidData(_)
    ));
    assert!(matches!(
        db.update_credentials(id, "secret", Some("admin"), None).unwrap_err(),
        Error::Conflict(_)
    ));
    assert!(matches!(
        db.update_credentials(999, "x", Some("y"), None).unwrap_err(),
        Error::NotFound(_)
    ));

    // Rename and change password together
    db.update_credentials(id, "secret", Some("aygul"), Some("newpw"))
        .unwrap();
    assert!(db.user_id("gulnar").unwrap().is_none());
    assert_eq!(db.verify_user("aygul", "newpw").unwrap(), Some(Role::User));
    assert_eq!(db.verify_user("aygul", "secret").unwrap(), None);
}

#[test]
fn test_update_credentials_with_legacy_stored_password() {
    let db = Database::in_memory().unwrap();
    {
        let conn = db.conn().unwrap();
        conn.execute(
            "INSERT INTO users (username, password, role) VALUES ('legacy', 'oldpw', 'user')",
            [],
        )
        .unwrap();
    }
    let id = db.user_id("legacy").unwrap().unwrap();

    // Old password verifies against the upgraded hash form
    db.update_credentials(id, "oldpw", None, Some("newpw")).unwrap();
    assert_eq!(db.verify_user("legacy", "newpw").unwrap(), Some(Role::User));
}
