//! Domain model for markdown entries and write tokens.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own validation rules that every persisted entry must satisfy.
//!
//! # Invariants
//! - A stored `Entry` always passes `Entry::validate()`.
//! - No two stored `Token` values are equal.

pub mod entry;
pub mod token;
