//! Settings repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the persistence boundary for serialized settings rows.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - A `None` value is a delete, never a stored row.
//! - `get_items` returns an entry for exactly the requested keys.
//! - Batched writes apply inside one immediate transaction.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::setting::{validate_setting_key, SettingKeyError};
use crate::serialize::StorageEncoding;
use rusqlite::{params, params_from_iter, Connection, TransactionBehavior};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const UPSERT_SETTING_SQL: &str = "INSERT INTO settings (key, value) VALUES (?1, ?2)
 ON CONFLICT(key) DO UPDATE SET
    value = excluded.value,
    updated_at = (strftime('%s', 'now') * 1000);";

const DELETE_SETTING_SQL: &str = "DELETE FROM settings WHERE key = ?1;";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for settings persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(SettingKeyError),
    Db(DbError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection is not migrated: expected schema version {expected_version}, found {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<SettingKeyError> for RepoError {
    fn from(value: SettingKeyError) -> Self {
        Self::Validation(value)
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

/// Persistence boundary for serialized settings.
///
/// Values are opaque encoded blobs. On write, `None` deletes the key;
/// on read, `None` means the key holds no row.
pub trait SettingsRepository {
    /// Upserts one value, or deletes the key when `value` is `None`.
    fn set_item(&mut self, key: &str, value: Option<&str>) -> RepoResult<()>;
    /// Batched upsert/delete; deletes where the value is `None`.
    fn set_items(&mut self, items: &BTreeMap<String, Option<String>>) -> RepoResult<()>;
    fn get_item(&self, key: &str) -> RepoResult<Option<String>>;
    /// Returns an entry for exactly the requested keys, `None` when absent.
    fn get_items(&self, keys: &[String]) -> RepoResult<BTreeMap<String, Option<String>>>;
    /// Returns every persisted key with its serialized value.
    fn get_all(&self) -> RepoResult<BTreeMap<String, String>>;
    fn delete_all(&mut self) -> RepoResult<()>;
    /// Escape transform required by this backend's value column.
    fn storage_encoding(&self) -> StorageEncoding;
}

/// SQLite-backed settings repository.
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_settings_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn set_item(&mut self, key: &str, value: Option<&str>) -> RepoResult<()> {
        validate_setting_key(key)?;

        match value {
            None => {
                self.conn.execute(DELETE_SETTING_SQL, [key])?;
            }
            Some(value) => {
                self.conn.execute(UPSERT_SETTING_SQL, params![key, value])?;
            }
        }

        Ok(())
    }

    fn set_items(&mut self, items: &BTreeMap<String, Option<String>>) -> RepoResult<()> {
        for key in items.keys() {
            validate_setting_key(key)?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for (key, value) in items {
            match value {
                None => {
                    tx.execute(DELETE_SETTING_SQL, [key.as_str()])?;
                }
                Some(value) => {
                    tx.execute(UPSERT_SETTING_SQL, params![key.as_str(), value.as_str()])?;
                }
            }
        }
        tx.commit()?;

        Ok(())
    }

    fn get_item(&self, key: &str) -> RepoResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM settings WHERE key = ?1;")?;
        let mut rows = stmt.query([key])?;

        if let Some(row) = rows.next()? {
            return Ok(Some(row.get(0)?));
        }

        Ok(None)
    }

    fn get_items(&self, keys: &[String]) -> RepoResult<BTreeMap<String, Option<String>>> {
        let mut items: BTreeMap<String, Option<String>> =
            keys.iter().map(|key| (key.clone(), None)).collect();
        if keys.is_empty() {
            return Ok(items);
        }

        // One round trip for the whole key set.
        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql = format!("SELECT key, value FROM settings WHERE key IN ({placeholders});");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(keys.iter()))?;

        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let value: String = row.get(1)?;
            items.insert(key, Some(value));
        }

        Ok(items)
    }

    fn get_all(&self) -> RepoResult<BTreeMap<String, String>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings;")?;
        let mut rows = stmt.query([])?;
        let mut items = BTreeMap::new();

        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let value: String = row.get(1)?;
            items.insert(key, value);
        }

        Ok(items)
    }

    fn delete_all(&mut self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM settings;", [])?;
        Ok(())
    }

    fn storage_encoding(&self) -> StorageEncoding {
        StorageEncoding::Plain
    }
}

fn ensure_settings_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "settings")? {
        return Err(RepoError::MissingRequiredTable("settings"));
    }

    for column in ["key", "value", "created_at", "updated_at"] {
        if !table_has_column(conn, "settings", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "settings",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
