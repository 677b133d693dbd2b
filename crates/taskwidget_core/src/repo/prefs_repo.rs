//! Key-value repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Read and write the task blob and the current-list pointer.
//! - Verify a connection is migrated before handing out a repository.
//!
//! # Invariants
//! - Writes are single-statement upserts; the last writer wins.
//! - Only keys are interpreted here; values are opaque text.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key holding the JSON array of all task lists.
pub const KEY_TASK_LISTS: &str = "task_lists";
/// Key holding the id of the list both surfaces display.
pub const KEY_CURRENT_LIST: &str = "current_list";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from key-value repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "prefs repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "prefs repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Get/put access to persisted string values.
pub trait PrefsRepository {
    /// Reads one value; `None` when the key was never written.
    fn get_value(&self, key: &str) -> RepoResult<Option<String>>;
    /// Replaces the value stored under `key`.
    fn put_value(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Removes one key. Returns whether anything was removed.
    fn remove_value(&self, key: &str) -> RepoResult<bool>;
}

/// SQLite-backed key-value repository.
pub struct SqlitePrefsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePrefsRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_prefs_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PrefsRepository for SqlitePrefsRepository<'_> {
    fn get_value(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM prefs WHERE key = ?1;", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put_value(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO prefs (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_value(&self, key: &str) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM prefs WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }
}

impl<R: PrefsRepository + ?Sized> PrefsRepository for &R {
    fn get_value(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).get_value(key)
    }

    fn put_value(&self, key: &str, value: &str) -> RepoResult<()> {
        (**self).put_value(key, value)
    }

    fn remove_value(&self, key: &str) -> RepoResult<bool> {
        (**self).remove_value(key)
    }
}

fn ensure_prefs_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'prefs'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable("prefs"));
    }

    Ok(())
}
