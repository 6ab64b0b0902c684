//! Entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `entries` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Entry::validate()` before any SQL mutation.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `edit` touches title, content and `updated_at` only.
//! - `delete` reports a missing row as `false`, never as an error.

use crate::db::DbError;
use crate::model::entry::{Entry, EntryId, EntryStatus, EntryTitle, EntryValidationError};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Row count returned by `get_titles` when the caller asks for fewer than one.
pub const DEFAULT_TITLES_LIMIT: i64 = 100;

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    status,
    created_at,
    updated_at
FROM entries";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by entry and token persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntryValidationError),
    Db(DbError),
    /// No entry row matches the id.
    NotFound(EntryId),
    /// No token row matches the lookup. The lookup value is not echoed.
    TokenNotFound,
    /// A unique constraint rejected the write.
    Conflict(&'static str),
    /// `get_titles` was called with a negative start id.
    InvalidStart(i64),
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entry not found: {id}"),
            Self::TokenNotFound => write!(f, "token not found"),
            Self::Conflict(target) => write!(f, "unique constraint conflict on {target}"),
            Self::InvalidStart(start) => write!(f, "invalid start index: {start}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EntryValidationError> for RepoError {
    fn from(value: EntryValidationError) -> Self {
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

/// Repository interface for entry CRUD operations.
pub trait EntryRepository {
    /// Gets one entry by id.
    fn get(&self, id: EntryId) -> RepoResult<Entry>;
    /// Lists all entry ids in ascending order.
    fn get_ids(&self) -> RepoResult<Vec<EntryId>>;
    /// Lists `(id, title)` pairs with `id >= start`, ordered by id.
    ///
    /// `n < 1` falls back to `DEFAULT_TITLES_LIMIT`.
    fn get_titles(&self, start: i64, n: i64) -> RepoResult<Vec<EntryTitle>>;
    /// Validates and inserts an entry, returning the generated id.
    fn save(&self, entry: &Entry) -> RepoResult<EntryId>;
    /// Validates and replaces title and content of `entry.id`.
    fn edit(&self, entry: &Entry) -> RepoResult<()>;
    /// Deletes one entry; returns whether a row was removed.
    fn delete(&self, id: EntryId) -> RepoResult<bool>;
}

impl<R: EntryRepository + ?Sized> EntryRepository for &R {
    fn get(&self, id: EntryId) -> RepoResult<Entry> {
        (**self).get(id)
    }

    fn get_ids(&self) -> RepoResult<Vec<EntryId>> {
        (**self).get_ids()
    }

    fn get_titles(&self, start: i64, n: i64) -> RepoResult<Vec<EntryTitle>> {
        (**self).get_titles(start, n)
    }

    fn save(&self, entry: &Entry) -> RepoResult<EntryId> {
        (**self).save(entry)
    }

    fn edit(&self, entry: &Entry) -> RepoResult<()> {
        (**self).edit(entry)
    }

    fn delete(&self, id: EntryId) -> RepoResult<bool> {
        (**self).delete(id)
    }
}

/// Normalizes the `get_titles` row limit.
pub fn normalize_titles_limit(n: i64) -> i64 {
    if n < 1 {
        DEFAULT_TITLES_LIMIT
    } else {
        n
    }
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable("entries")` when migrations were not applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if !table_exists(conn, "entries")? {
            return Err(RepoError::MissingRequiredTable("entries"));
        }
        Ok(Self { conn })
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn get(&self, id: EntryId) -> RepoResult<Entry> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => parse_entry_row(row),
            None => Err(RepoError::NotFound(id)),
        }
    }

    fn get_ids(&self) -> RepoResult<Vec<EntryId>> {
        let mut stmt = self.conn.prepare("SELECT id FROM entries ORDER BY id ASC;")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, EntryId>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn get_titles(&self, start: i64, n: i64) -> RepoResult<Vec<EntryTitle>> {
        if start < 0 {
            return Err(RepoError::InvalidStart(start));
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, title
             FROM entries
             WHERE id >= ?1
             ORDER BY id ASC
             LIMIT ?2;",
        )?;
        let titles = stmt
            .query_map(params![start, normalize_titles_limit(n)], |row| {
                Ok(EntryTitle {
                    id: row.get("id")?,
                    title: row.get("title")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(titles)
    }

    fn save(&self, entry: &Entry) -> RepoResult<EntryId> {
        entry.validate()?;

        self.conn.execute(
            "INSERT INTO entries (title, content, status) VALUES (?1, ?2, ?3);",
            params![
                entry.title.as_str(),
                entry.content.as_str(),
                entry.status.code()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn edit(&self, entry: &Entry) -> RepoResult<()> {
        entry.validate()?;

        let changed = self.conn.execute(
            "UPDATE entries
             SET
                title = ?1,
                content = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?3;",
            params![entry.title.as_str(), entry.content.as_str(), entry.id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(entry.id));
        }
        Ok(())
    }

    fn delete(&self, id: EntryId) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM entries WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<Entry> {
    let status_code: i64 = row.get("status")?;
    let status = EntryStatus::try_from(status_code).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid status value `{status_code}` in entries.status"
        ))
    })?;

    let entry = Entry {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    entry.validate()?;
    Ok(entry)
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
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
