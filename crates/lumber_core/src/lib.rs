//! Core domain logic for the lumber entry backend.
//! This crate is the single source of truth for entry and token invariants.

pub mod auth;
pub mod boundary;
pub mod config;
pub mod db;
pub mod logging;
pub mod markdown;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::{tokens_match, AuthError, TokenGate};
pub use boundary::ErrorKind;
pub use config::{ConfigError, LumberConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use markdown::{extract_title_and_content, render_html};
pub use model::entry::{
    derive_status_from_title, validate_entry_fields, Entry, EntryElement, EntryField, EntryId,
    EntryStatus, EntryTitle, EntryValidationError, MAX_CONTENT_BYTES, MAX_TITLE_BYTES,
};
pub use model::token::{Token, TokenId};
pub use repo::entry_repo::{
    EntryRepository, RepoError, RepoResult, SqliteEntryRepository, DEFAULT_TITLES_LIMIT,
};
pub use repo::memory::{MemoryEntryRepository, MemoryTokenRepository};
pub use repo::token_repo::{SqliteTokenRepository, TokenRepository};
pub use service::entry_service::{EntryService, LifecycleError, LifecycleResult};
pub use service::token_service::{TokenService, TokenServiceError, MAX_ISSUE_ATTEMPTS};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
