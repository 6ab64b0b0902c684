//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for entries and tokens.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Entry writes enforce `Entry::validate()` before persistence, even when
//!   the caller already validated.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod entry_repo;
pub mod memory;
pub mod token_repo;
