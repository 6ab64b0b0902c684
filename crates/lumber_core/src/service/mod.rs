//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate token gate and repository calls into lifecycle operations.
//! - Keep CLI/boundary layers decoupled from storage details.

pub mod entry_service;
pub mod token_service;
