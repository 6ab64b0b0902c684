//! Entry domain model and validation rules.
//!
//! # Responsibility
//! - Define the persisted `Entry` record and the caller-built `EntryElement`.
//! - Enforce emptiness, size and status invariants before persistence.
//!
//! # Invariants
//! - `title` is non-empty and at most `MAX_TITLE_BYTES` bytes.
//! - `content` is non-empty and at most `MAX_CONTENT_BYTES` bytes.
//! - `status` is always a known `EntryStatus` member.
//! - `id` and `status` never change after creation.

use crate::markdown::extract_title_and_content;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum title size in bytes (inclusive).
pub const MAX_TITLE_BYTES: usize = 1 << 8;
/// Maximum content size in bytes (inclusive), the capacity of a MySQL `TEXT`.
pub const MAX_CONTENT_BYTES: usize = (1 << 16) - 1;

static WIP_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\[wip\]").expect("valid wip prefix regex"));

/// Datastore-assigned entry identifier.
pub type EntryId = i64;

/// Visibility of an entry.
///
/// Serialized as its integer code (`0` public, `1` private).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum EntryStatus {
    #[default]
    Public,
    Private,
}

impl EntryStatus {
    /// Integer code used in storage and on the wire.
    pub fn code(self) -> i64 {
        match self {
            Self::Public => 0,
            Self::Private => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl Display for EntryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i64> for EntryStatus {
    type Error = EntryValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Public),
            1 => Ok(Self::Private),
            other => Err(EntryValidationError::InvalidStatus(other)),
        }
    }
}

impl From<EntryStatus> for i64 {
    fn from(value: EntryStatus) -> Self {
        value.code()
    }
}

/// Size-checked entry field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Title,
    Content,
}

impl EntryField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Content => "content",
        }
    }
}

/// Validation failure for entry candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    /// Title or content is empty after extraction.
    EmptyEntry,
    /// One field exceeds its byte limit.
    EntrySizeLimitExceeded {
        field: EntryField,
        size: usize,
        max: usize,
    },
    /// Status code outside the `EntryStatus` members.
    InvalidStatus(i64),
}

impl EntryValidationError {
    /// Stable machine-readable code for diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyEntry => "empty_entry",
            Self::EntrySizeLimitExceeded { .. } => "entry_size_limit_exceeded",
            Self::InvalidStatus(_) => "invalid_status",
        }
    }
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEntry => write!(f, "posting entry is empty"),
            Self::EntrySizeLimitExceeded { field, size, max } => write!(
                f,
                "posting entry size is limit exceeded: {} is {size} bytes, max {max}",
                field.as_str()
            ),
            Self::InvalidStatus(value) => write!(f, "invalid entry status type: {value}"),
        }
    }
}

impl Error for EntryValidationError {}

/// Checks emptiness and byte limits of entry text fields.
///
/// Emptiness is reported before size so an empty title with oversized content
/// still reads as `EmptyEntry`.
pub fn validate_entry_fields(title: &str, content: &str) -> Result<(), EntryValidationError> {
    if title.is_empty() || content.is_empty() {
        return Err(EntryValidationError::EmptyEntry);
    }
    if title.len() > MAX_TITLE_BYTES {
        return Err(EntryValidationError::EntrySizeLimitExceeded {
            field: EntryField::Title,
            size: title.len(),
            max: MAX_TITLE_BYTES,
        });
    }
    if content.len() > MAX_CONTENT_BYTES {
        return Err(EntryValidationError::EntrySizeLimitExceeded {
            field: EntryField::Content,
            size: content.len(),
            max: MAX_CONTENT_BYTES,
        });
    }
    Ok(())
}

/// Persisted entry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// `0` until the entry is persisted.
    pub id: EntryId,
    pub title: String,
    /// Rendered HTML.
    pub content: String,
    pub status: EntryStatus,
    /// Unix epoch milliseconds, assigned by storage.
    pub created_at: i64,
    /// Unix epoch milliseconds, assigned by storage.
    pub updated_at: i64,
}

impl Entry {
    /// Builds an unsaved entry from text fields.
    pub fn new(title: impl Into<String>, content: impl Into<String>, status: EntryStatus) -> Self {
        Self {
            id: 0,
            title: title.into(),
            content: content.into(),
            status,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Validates text field invariants.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        validate_entry_fields(&self.title, &self.content)
    }
}

/// `(id, title)` projection used by title listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTitle {
    pub id: EntryId,
    pub title: String,
}

/// Caller-built entry candidate for post/edit operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryElement {
    pub title: String,
    pub content: String,
    pub status: EntryStatus,
}

impl EntryElement {
    /// Extracts title and rendered content from raw markdown.
    ///
    /// Status starts as `EntryStatus::Public`.
    ///
    /// # Errors
    /// - `EmptyEntry` when either extracted field is empty.
    pub fn from_markdown(raw: &[u8]) -> Result<Self, EntryValidationError> {
        let (title, content) = extract_title_and_content(raw);
        if title.is_empty() || content.is_empty() {
            return Err(EntryValidationError::EmptyEntry);
        }
        Ok(Self {
            title,
            content,
            status: EntryStatus::Public,
        })
    }

    pub fn set_public(&mut self) {
        self.status = EntryStatus::Public;
    }

    pub fn set_private(&mut self) {
        self.status = EntryStatus::Private;
    }

    /// Validates text field invariants.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        validate_entry_fields(&self.title, &self.content)
    }

    /// Converts this element into an unsaved entry.
    pub fn entity(&self) -> Entry {
        Entry::new(self.title.clone(), self.content.clone(), self.status)
    }
}

/// Marks an element private when its title starts with `[wip]`.
///
/// The prefix match is case-insensitive. Returns whether the status changed.
/// This rule is opt-in; nothing in the lifecycle applies it implicitly.
pub fn derive_status_from_title(element: &mut EntryElement) -> bool {
    if element.status == EntryStatus::Private || !WIP_TITLE_RE.is_match(&element.title) {
        return false;
    }
    element.set_private();
    true
}
