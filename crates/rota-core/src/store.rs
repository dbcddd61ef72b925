//! Rotation storage trait and the SQLite implementation.
//!
//! The store owns all persisted state: one row per assignment, keyed by a unique
//! due date. Rotation rules live in the engine; the store only reads and writes.

use crate::error::{RotaError, RotaResult};
use crate::types::{Assignment, UserPair};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Trait for rotation storage operations
pub trait RotationStore: Send + Sync {
    /// All assignments, ordered by due date
    fn list_all(&self) -> RotaResult<Vec<Assignment>>;

    /// The assignment due on exactly this date
    fn find_by_due_date(&self, date: NaiveDate) -> RotaResult<Option<Assignment>>;

    /// The earliest-due assignment containing this user
    fn find_by_user(&self, user: &str) -> RotaResult<Option<Assignment>>;

    /// Move the assignment containing `user` to a new due date
    fn set_due_date(&self, user: &str, new_date: NaiveDate) -> RotaResult<()>;

    /// Apply several due-date moves; all of them or none
    fn set_due_dates(&self, updates: &[(String, NaiveDate)]) -> RotaResult<()> {
        for (user, date) in updates {
            self.set_due_date(user, *date)?;
        }
        Ok(())
    }

    /// Add a new assignment
    fn insert(&self, assignment: &Assignment) -> RotaResult<()>;

    /// Whether the rotation has no assignments yet
    fn is_empty(&self) -> RotaResult<bool> {
        Ok(self.list_all()?.is_empty())
    }
}

/// SQLite-backed rotation store
pub struct SqliteRotationStore {
    conn: Mutex<Connection>,
}

impl SqliteRotationStore {
    /// Create a new store at the given path
    pub fn new(path: impl AsRef<Path>) -> RotaResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> RotaResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> RotaResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RotaError::store("rotation store connection lock poisoned"))
    }

    fn init_schema(&self) -> RotaResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS assignments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_a TEXT NOT NULL,
                user_b TEXT NOT NULL,
                due_date TEXT NOT NULL UNIQUE
            );

            CREATE INDEX IF NOT EXISTS idx_assignments_user_a ON assignments(user_a);
            CREATE INDEX IF NOT EXISTS idx_assignments_user_b ON assignments(user_b);
        "#,
        )?;
        Ok(())
    }

    fn parse_date(raw: &str) -> RotaResult<NaiveDate> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| RotaError::corrupted(format!("bad due_date '{}': {}", raw, e)))
    }

    fn row_to_assignment(row: &rusqlite::Row<'_>) -> RotaResult<Assignment> {
        let user_a: String = row.get(0)?;
        let user_b: String = row.get(1)?;
        let due_date: String = row.get(2)?;

        Ok(Assignment {
            users: UserPair::new(user_a, user_b),
            due_date: Self::parse_date(&due_date)?,
        })
    }

    fn update_one(conn: &Connection, user: &str, new_date: NaiveDate) -> RotaResult<()> {
        let changed = conn.execute(
            "UPDATE assignments SET due_date = ?2 WHERE user_a = ?1 OR user_b = ?1",
            params![user, new_date.to_string()],
        )?;
        if changed == 0 {
            return Err(RotaError::not_found(user));
        }
        Ok(())
    }
}

impl RotationStore for SqliteRotationStore {
    fn list_all(&self) -> RotaResult<Vec<Assignment>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT user_a, user_b, due_date FROM assignments ORDER BY due_date")?;

        let results = stmt.query_map([], |row| Ok(Self::row_to_assignment(row)))?;

        results
            .map(|r| r.map_err(|e| e.into()).and_then(|inner| inner))
            .collect()
    }

    fn find_by_due_date(&self, date: NaiveDate) -> RotaResult<Option<Assignment>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT user_a, user_b, due_date FROM assignments WHERE due_date = ?1")?;

        stmt.query_row(params![date.to_string()], |row| {
            Ok(Self::row_to_assignment(row))
        })
        .optional()?
        .transpose()
    }

    fn find_by_user(&self, user: &str) -> RotaResult<Option<Assignment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT user_a, user_b, due_date FROM assignments
               WHERE user_a = ?1 OR user_b = ?1
               ORDER BY due_date LIMIT 1"#,
        )?;

        stmt.query_row(params![user], |row| Ok(Self::row_to_assignment(row)))
            .optional()?
            .transpose()
    }

    fn set_due_date(&self, user: &str, new_date: NaiveDate) -> RotaResult<()> {
        let conn = self.conn()?;
        Self::update_one(&conn, user, new_date)
    }

    fn set_due_dates(&self, updates: &[(String, NaiveDate)]) -> RotaResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for (user, date) in updates {
            Self::update_one(&tx, user, *date)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn insert(&self, assignment: &Assignment) -> RotaResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO assignments (user_a, user_b, due_date) VALUES (?1, ?2, ?3)",
            params![
                assignment.users.first,
                assignment.users.second,
                assignment.due_date.to_string(),
            ],
        )?;
        Ok(())
    }

    fn is_empty(&self) -> RotaResult<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM assignments", [], |row| row.get(0))?;
        Ok(count == 0)
    }
}
