//! Token repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `tokens` table.
//! - Surface unique-index violations on `tokens.value` as `RepoError::Conflict`.
//!
//! # Invariants
//! - Uniqueness of `value` is enforced by storage, not by lookup-before-insert.
//! - Token values never appear in error messages.

use crate::model::token::{Token, TokenId};
use crate::repo::entry_repo::{table_exists, RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode, Row};

const TOKEN_SELECT_SQL: &str = "SELECT
    id,
    value,
    created_at,
    updated_at
FROM tokens";

const TOKEN_VALUE_TARGET: &str = "tokens.value";

/// Repository interface for token persistence.
pub trait TokenRepository {
    /// Gets one token by id.
    fn get(&self, id: TokenId) -> RepoResult<Token>;
    /// Gets one token by exact value.
    fn find_by_value(&self, value: &str) -> RepoResult<Token>;
    /// Inserts a token and returns its generated id.
    ///
    /// Fails with `Conflict` when the value is already stored.
    fn save(&self, token: &Token) -> RepoResult<TokenId>;
    /// Replaces the value of `token.id`.
    fn update(&self, token: &Token) -> RepoResult<()>;
    /// Deletes one token; returns whether a row was removed.
    fn delete(&self, id: TokenId) -> RepoResult<bool>;
}

impl<R: TokenRepository + ?Sized> TokenRepository for &R {
    fn get(&self, id: TokenId) -> RepoResult<Token> {
        (**self).get(id)
    }

    fn find_by_value(&self, value: &str) -> RepoResult<Token> {
        (**self).find_by_value(value)
    }

    fn save(&self, token: &Token) -> RepoResult<TokenId> {
        (**self).save(token)
    }

    fn update(&self, token: &Token) -> RepoResult<()> {
        (**self).update(token)
    }

    fn delete(&self, id: TokenId) -> RepoResult<bool> {
        (**self).delete(id)
    }
}

/// Rejects token values that can never authorize anything.
pub(crate) fn ensure_token_value(value: &str) -> RepoResult<()> {
    if value.is_empty() {
        return Err(RepoError::InvalidData(
            "token value cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// SQLite-backed token repository.
pub struct SqliteTokenRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTokenRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if !table_exists(conn, "tokens")? {
            return Err(RepoError::MissingRequiredTable("tokens"));
        }
        Ok(Self { conn })
    }

    fn query_one(&self, filter: &str, value: &dyn rusqlite::ToSql) -> RepoResult<Token> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TOKEN_SELECT_SQL} WHERE {filter} = ?1;"))?;
        let mut rows = stmt.query([value])?;
        match rows.next()? {
            Some(row) => parse_token_row(row),
            None => Err(RepoError::TokenNotFound),
        }
    }
}

impl TokenRepository for SqliteTokenRepository<'_> {
    fn get(&self, id: TokenId) -> RepoResult<Token> {
        self.query_one("id", &id)
    }

    fn find_by_value(&self, value: &str) -> RepoResult<Token> {
        self.query_one("value", &value)
    }

    fn save(&self, token: &Token) -> RepoResult<TokenId> {
        ensure_token_value(&token.value)?;

        self.conn
            .execute(
                "INSERT INTO tokens (value) VALUES (?1);",
                [token.value.as_str()],
            )
            .map_err(map_unique_violation)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, token: &Token) -> RepoResult<()> {
        ensure_token_value(&token.value)?;

        let changed = self
            .conn
            .execute(
                "UPDATE tokens
                 SET
                    value = ?1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?2;",
                params![token.value.as_str(), token.id],
            )
            .map_err(map_unique_violation)?;

        if changed == 0 {
            return Err(RepoError::TokenNotFound);
        }
        Ok(())
    }

    fn delete(&self, id: TokenId) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM tokens WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

fn map_unique_violation(err: rusqlite::Error) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::Conflict(TOKEN_VALUE_TARGET)
        }
        _ => err.into(),
    }
}

fn parse_token_row(row: &Row<'_>) -> RepoResult<Token> {
    let token = Token {
        id: row.get("id")?,
        value: row.get("value")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    ensure_token_value(&token.value)
        .map_err(|_| RepoError::InvalidData("empty value in tokens.value".to_string()))?;
    Ok(token)
}
