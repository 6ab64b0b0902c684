//! Error classification for outer boundaries (HTTP, CLI).
//!
//! Boundaries translate core failures into their own status vocabulary. The
//! core only promises that failures stay distinguishable by `ErrorKind`.

use crate::auth::AuthError;
use crate::repo::entry_repo::RepoError;
use crate::service::entry_service::LifecycleError;
use crate::service::token_service::TokenServiceError;

/// Coarse failure class shared by all core operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller input is invalid; fix the input and resubmit.
    Validation,
    /// Token is missing or unknown.
    Unauthorized,
    /// Target entry or token does not exist.
    NotFound,
    /// A unique value is already taken.
    Conflict,
    /// Infrastructure failure.
    Storage,
}

impl ErrorKind {
    /// HTTP status code equivalent.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Storage => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
        }
    }
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidStart(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound(_) | Self::TokenNotFound => ErrorKind::NotFound,
            Self::Db(_) | Self::MissingRequiredTable(_) | Self::InvalidData(_) => {
                ErrorKind::Storage
            }
        }
    }
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(AuthError::InsufficientPrivileges) => ErrorKind::Unauthorized,
            Self::Unauthorized(AuthError::Repo(_)) => ErrorKind::Storage,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Repo(err) => err.kind(),
        }
    }
}

impl TokenServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ExhaustedAttempts(_) => ErrorKind::Storage,
            Self::Repo(err) => err.kind(),
        }
    }
}
