//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `expenses` - Expense CRUD, sequence bookkeeping, and range queries
//! - `categories` - Bilingual category administration
//! - `users` - Operator accounts and authentication

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::info;

use crate::error::{Error, Result};

mod categories;
mod expenses;
mod users;

pub use self::users::hash_password;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Categories installed on first run: (Chinese name, Uyghur name, emoji)
const SEED_CATEGORIES: [(&str, &str, &str); 12] = [
    ("羊肉", "قوي گۆشى", "🐑"),
    ("牛肉", "كالا گۆشى", "🐄"),
    ("鸡肉", "توخۇ گۆشى", "🐔"),
    ("鱼肉", "بېلىق گۆشى", "🐟"),
    ("蔬菜孙玲", "كۆكتات سۇنلىڭ", "🥬"),
    ("蔬菜巴克", "كۆكتات باقى", "🥒"),
    ("调料", "تېتىتقۇ", "🧂"),
    ("酸奶", "قېتىق", "🥛"),
    ("牛肚", "قېرېن", "🫃"),
    ("羊肉串", "كاۋاپ", "🍢"),
    ("油塔子", "يۇتازا", "🫒"),
    ("清洁用品", "تازلىق بۇيۇملىرى", "🧽"),
];

/// Parse a stored ISO date string
pub(crate) fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|_| chrono::Local::now().date_naive())
}

/// Verify the database location is usable before touching the driver
///
/// Produces a readable diagnostic for the common failure modes (missing or
/// read-only directory, unreadable file) instead of an opaque driver error.
fn check_permissions(path: &Path) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    if !dir.as_os_str().is_empty() && !dir.exists() {
        return Err(Error::Config(format!(
            "Database directory does not exist: {}",
            dir.display()
        )));
    }

    if path.exists() {
        let meta = std::fs::metadata(path)?;
        if meta.permissions().readonly() {
            return Err(Error::Config(format!(
                "Database file is not writable: {}",
                path.display()
            )));
        }
        // Readable check: opening for read fails on permission problems
        std::fs::File::open(path).map_err(|e| {
            Error::Config(format!(
                "Database file is not readable: {}: {}",
                path.display(),
                e
            ))
        })?;
    } else if !dir.as_os_str().is_empty() {
        // File will be created; probe the directory for write access
        let probe = dir.join(".nilufar_write_check");
        std::fs::write(&probe, b"check").map_err(|e| {
            Error::Config(format!(
                "Cannot create files in database directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        let _ = std::fs::remove_file(&probe);
    }

    Ok(())
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: PathBuf,
}

impl Database {
    /// Open (or create) the database at `path` and run migrations and seeding
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        check_permissions(path)?;

        // Pragmas are per-connection, so apply them as each pooled
        // connection is created. WAL itself persists in the file.
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                r#"
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA temp_store = MEMORY;
                PRAGMA cache_size = 10000;
                PRAGMA foreign_keys = ON;
                "#,
            )
        });

        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_path_buf(),
        };
        db.run_migrations()?;
        db.seed_defaults()?;

        Ok(db)
    }

    /// First-run installation
    ///
    /// If no database exists yet and a bundled seed file is available, the
    /// seed is copied verbatim and opened as-is; otherwise a fresh schema is
    /// created and default rows inserted. An existing database is opened
    /// without modification.
    pub fn initialize<P: AsRef<Path>>(path: P, seed: Option<&Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            if let Some(dir) = path.parent() {
                if !dir.as_os_str().is_empty() {
                    std::fs::create_dir_all(dir)?;
                }
            }
            if let Some(seed_path) = seed {
                if seed_path.exists() {
                    std::fs::copy(seed_path, path)?;
                    info!(seed = %seed_path.display(), "Installed seed database");
                }
            }
        }

        Self::open(path)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Create a throwaway on-disk database (for testing)
    ///
    /// Uses a unique temp file rather than `:memory:` because every pooled
    /// connection must see the same database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "nilufar_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let _ = std::fs::remove_file(&path);

        Self::open(path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Operator accounts
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                role TEXT NOT NULL
            );

            -- Bilingual expense categories
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name_cn TEXT NOT NULL UNIQUE,
                name_ug TEXT NOT NULL UNIQUE,
                emoji TEXT DEFAULT '📝'
            );

            -- Expense records
            -- sequence_number is a dense per-(expense_date, category_id) rank
            -- maintained by the application on insert and delete
            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                expense_date TEXT NOT NULL,
                amount REAL NOT NULL,
                category_id INTEGER,
                user_id INTEGER,
                notes TEXT,
                sequence_number INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY (category_id) REFERENCES categories (id),
                FOREIGN KEY (user_id) REFERENCES users (id)
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(expense_date);
            CREATE INDEX IF NOT EXISTS idx_expenses_date_category
                ON expenses(expense_date, category_id);
            "#,
        )?;

        // Legacy databases predate the emoji column; add and backfill it
        let has_emoji: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pragma_table_info('categories') WHERE name = 'emoji'",
            [],
            |row| row.get(0),
        )?;

        if has_emoji == 0 {
            conn.execute_batch("ALTER TABLE categories ADD COLUMN emoji TEXT DEFAULT '📝'")?;
            for (name_cn, _, emoji) in &SEED_CATEGORIES {
                conn.execute(
                    "UPDATE categories SET emoji = ? WHERE name_cn = ?",
                    params![emoji, name_cn],
                )?;
            }
            info!("Migrated categories table: added emoji column");
        }

        info!("Database schema initialized");
        Ok(())
    }

    /// Insert the admin account and default categories on first run
    fn seed_defaults(&self) -> Result<()> {
        let conn = self.conn()?;

        let user_count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        if user_count == 0 {
            conn.execute(
                "INSERT INTO users (username, password, role) VALUES (?, ?, 'admin')",
                params!["admin", hash_password("123456")],
            )?;
            info!("Seeded default admin account");
        }

        let category_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if category_count == 0 {
            for (name_cn, name_ug, emoji) in &SEED_CATEGORIES {
                conn.execute(
                    "INSERT INTO categories (name_cn, name_ug, emoji) VALUES (?, ?, ?)",
                    params![name_cn, name_ug, emoji],
                )?;
            }
            info!(count = SEED_CATEGORIES.len(), "Seeded default categories");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
