//! Entry lifecycle use-case service.
//!
//! # Responsibility
//! - Compose the token gate, entry validation and repository persistence into
//!   get/list/post/edit/delete operations.
//!
//! # Invariants
//! - Post/edit/delete authorize first; a rejected token causes no write.
//! - Reads never consult the token gate.
//! - Edit replaces title and content only; status and id are kept.
//! - The service holds no state besides its repositories.

use crate::auth::{AuthError, TokenGate};
use crate::model::entry::{Entry, EntryElement, EntryId, EntryTitle, EntryValidationError};
use crate::repo::entry_repo::{EntryRepository, RepoError};
use crate::repo::token_repo::TokenRepository;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Error returned by lifecycle operations.
#[derive(Debug)]
pub enum LifecycleError {
    /// Token gate rejected the call.
    Unauthorized(AuthError),
    /// Candidate entry violates entry invariants.
    Validation(EntryValidationError),
    /// Target entry does not exist.
    NotFound(EntryId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl LifecycleError {
    /// Stable machine-readable code for diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(AuthError::InsufficientPrivileges) => "insufficient_privileges",
            Self::Unauthorized(AuthError::Repo(_)) => "token_lookup_failed",
            Self::Validation(err) => err.code(),
            Self::NotFound(_) => "entry_not_found",
            Self::Repo(RepoError::InvalidStart(_)) => "invalid_start_index",
            Self::Repo(_) => "storage_failure",
        }
    }
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entry not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unauthorized(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<AuthError> for LifecycleError {
    fn from(value: AuthError) -> Self {
        Self::Unauthorized(value)
    }
}

impl From<EntryValidationError> for LifecycleError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for LifecycleError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Entry lifecycle orchestrator.
pub struct EntryService<E: EntryRepository, T: TokenRepository> {
    entries: E,
    gate: TokenGate<T>,
}

impl<E: EntryRepository, T: TokenRepository> EntryService<E, T> {
    /// Creates a service over an entry repository and a token repository.
    pub fn new(entries: E, tokens: T) -> Self {
        Self {
            entries,
            gate: TokenGate::new(tokens),
        }
    }

    /// Gets one entry by id.
    pub fn get(&self, id: EntryId) -> LifecycleResult<Entry> {
        Ok(self.entries.get(id)?)
    }

    /// Lists all entry ids in ascending order.
    pub fn get_ids(&self) -> LifecycleResult<Vec<EntryId>> {
        Ok(self.entries.get_ids()?)
    }

    /// Lists `(id, title)` pairs starting at id `start`.
    pub fn get_titles(&self, start: i64, n: i64) -> LifecycleResult<Vec<EntryTitle>> {
        Ok(self.entries.get_titles(start, n)?)
    }

    /// Creates an entry and returns its id.
    ///
    /// # Errors
    /// - `Unauthorized` when the token gate rejects `token`.
    /// - `Validation` for empty/oversized fields.
    pub fn post(&self, element: &EntryElement, token: &str) -> LifecycleResult<EntryId> {
        let started_at = Instant::now();
        let result = self.post_inner(element, token);
        log_outcome("entry_post", started_at, &result);
        result
    }

    /// Replaces title and content of entry `id`.
    ///
    /// # Errors
    /// - `Unauthorized` when the token gate rejects `token`.
    /// - `Validation` for empty/oversized fields.
    /// - `NotFound` when `id` does not exist.
    pub fn edit(&self, id: EntryId, element: &EntryElement, token: &str) -> LifecycleResult<()> {
        let started_at = Instant::now();
        let result = self.edit_inner(id, element, token);
        log_outcome("entry_edit", started_at, &result);
        result
    }

    /// Deletes entry `id`; returns whether a row was removed.
    pub fn delete(&self, id: EntryId, token: &str) -> LifecycleResult<bool> {
        let started_at = Instant::now();
        let result = self.delete_inner(id, token);
        log_outcome("entry_delete", started_at, &result);
        result
    }

    fn post_inner(&self, element: &EntryElement, token: &str) -> LifecycleResult<EntryId> {
        self.gate.authorize(token)?;
        element.validate()?;
        Ok(self.entries.save(&element.entity())?)
    }

    fn edit_inner(&self, id: EntryId, element: &EntryElement, token: &str) -> LifecycleResult<()> {
        self.gate.authorize(token)?;
        element.validate()?;
        let mut entry = element.entity();
        entry.id = id;
        Ok(self.entries.edit(&entry)?)
    }

    fn delete_inner(&self, id: EntryId, token: &str) -> LifecycleResult<bool> {
        self.gate.authorize(token)?;
        Ok(self.entries.delete(id)?)
    }
}

fn log_outcome<V>(event: &str, started_at: Instant, result: &LifecycleResult<V>) {
    match result {
        Ok(_) => info!(
            "event={event} module=service status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event={event} module=service status=error duration_ms={} error_code={}",
            started_at.elapsed().as_millis(),
            err.code()
        ),
    }
}
