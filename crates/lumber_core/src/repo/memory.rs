//! In-memory repository implementations.
//!
//! These mirror the SQLite repositories' contracts (validation, `NotFound`,
//! `Conflict`, delete-as-bool) without a database, for tests and embedding
//! callers that do not need persistence.

use crate::auth::tokens_match;
use crate::model::entry::{Entry, EntryId, EntryTitle};
use crate::model::token::{Token, TokenId};
use crate::repo::entry_repo::{normalize_titles_limit, EntryRepository, RepoError, RepoResult};
use crate::repo::token_repo::{ensure_token_value, TokenRepository};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[derive(Debug)]
struct Table<T> {
    last_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            last_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Entry repository backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryEntryRepository {
    table: RefCell<Table<Entry>>,
}

impl MemoryEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.table.borrow().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntryRepository for MemoryEntryRepository {
    fn get(&self, id: EntryId) -> RepoResult<Entry> {
        self.table
            .borrow()
            .rows
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound(id))
    }

    fn get_ids(&self) -> RepoResult<Vec<EntryId>> {
        Ok(self.table.borrow().rows.keys().copied().collect())
    }

    fn get_titles(&self, start: i64, n: i64) -> RepoResult<Vec<EntryTitle>> {
        if start < 0 {
            return Err(RepoError::InvalidStart(start));
        }
        let limit = usize::try_from(normalize_titles_limit(n)).unwrap_or(usize::MAX);
        Ok(self
            .table
            .borrow()
            .rows
            .range(start..)
            .take(limit)
            .map(|(id, entry)| EntryTitle {
                id: *id,
                title: entry.title.clone(),
            })
            .collect())
    }

    fn save(&self, entry: &Entry) -> RepoResult<EntryId> {
        entry.validate()?;

        let mut table = self.table.borrow_mut();
        let id = table.next_id();
        let now = now_epoch_ms();
        table.rows.insert(
            id,
            Entry {
                id,
                title: entry.title.clone(),
                content: entry.content.clone(),
                status: entry.status,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    fn edit(&self, entry: &Entry) -> RepoResult<()> {
        entry.validate()?;

        let mut table = self.table.borrow_mut();
        let stored = table
            .rows
            .get_mut(&entry.id)
            .ok_or(RepoError::NotFound(entry.id))?;
        stored.title = entry.title.clone();
        stored.content = entry.content.clone();
        stored.updated_at = now_epoch_ms();
        Ok(())
    }

    fn delete(&self, id: EntryId) -> RepoResult<bool> {
        Ok(self.table.borrow_mut().rows.remove(&id).is_some())
    }
}

/// Token repository backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryTokenRepository {
    table: RefCell<Table<Token>>,
}

impl MemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository pre-seeded with the given token values.
    pub fn with_values<I, S>(values: I) -> RepoResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let repo = Self::new();
        for value in values {
            repo.save(&Token::new(value))?;
        }
        Ok(repo)
    }

    /// Number of stored tokens.
    pub fn len(&self) -> usize {
        self.table.borrow().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TokenRepository for MemoryTokenRepository {
    fn get(&self, id: TokenId) -> RepoResult<Token> {
        self.table
            .borrow()
            .rows
            .get(&id)
            .cloned()
            .ok_or(RepoError::TokenNotFound)
    }

    fn find_by_value(&self, value: &str) -> RepoResult<Token> {
        self.table
            .borrow()
            .rows
            .values()
            .find(|token| tokens_match(&token.value, value))
            .cloned()
            .ok_or(RepoError::TokenNotFound)
    }

    fn save(&self, token: &Token) -> RepoResult<TokenId> {
        ensure_token_value(&token.value)?;

        let mut table = self.table.borrow_mut();
        if table.rows.values().any(|stored| stored.value == token.value) {
            return Err(RepoError::Conflict("tokens.value"));
        }
        let id = table.next_id();
        let now = now_epoch_ms();
        table.rows.insert(
            id,
            Token {
                id,
                value: token.value.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    fn update(&self, token: &Token) -> RepoResult<()> {
        ensure_token_value(&token.value)?;

        let mut table = self.table.borrow_mut();
        if table
            .rows
            .values()
            .any(|stored| stored.id != token.id && stored.value == token.value)
        {
            return Err(RepoError::Conflict("tokens.value"));
        }
        let stored = table
            .rows
            .get_mut(&token.id)
            .ok_or(RepoError::TokenNotFound)?;
        stored.value = token.value.clone();
        stored.updated_at = now_epoch_ms();
        Ok(())
    }

    fn delete(&self, id: TokenId) -> RepoResult<bool> {
        Ok(self.table.borrow_mut().rows.remove(&id).is_some())
    }
}
