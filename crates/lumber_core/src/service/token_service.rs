//! Token issuance use-case service.
//!
//! # Responsibility
//! - Issue new tokens with random unique values.
//! - Expose lookup and revocation of stored tokens.
//!
//! # Invariants
//! - A value collision (`RepoError::Conflict`) triggers regeneration; any
//!   other repository error ends issuance immediately.
//! - Issuance makes at most `MAX_ISSUE_ATTEMPTS` save attempts.

use crate::model::token::{Token, TokenId};
use crate::repo::entry_repo::RepoError;
use crate::repo::token_repo::TokenRepository;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Upper bound on save attempts per issued token.
pub const MAX_ISSUE_ATTEMPTS: u32 = 20;

/// Service error for token use-cases.
#[derive(Debug)]
pub enum TokenServiceError {
    /// Every generated value collided with a stored token.
    ExhaustedAttempts(u32),
    /// Persistence-layer failure, including `TokenNotFound`.
    Repo(RepoError),
}

impl Display for TokenServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExhaustedAttempts(attempts) => {
                write!(f, "failed to create a new token after {attempts} attempts")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TokenServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ExhaustedAttempts(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for TokenServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Generates a random token value.
pub fn generate_token_value() -> String {
    Uuid::new_v4().to_string()
}

/// Token issuance facade over repository implementations.
pub struct TokenService<R: TokenRepository> {
    repo: R,
    generate: Box<dyn Fn() -> String>,
}

impl<R: TokenRepository> TokenService<R> {
    /// Creates a service that generates UUID v4 values.
    pub fn new(repo: R) -> Self {
        Self::with_generator(repo, generate_token_value)
    }

    /// Creates a service with a caller-provided value generator.
    pub fn with_generator(repo: R, generate: impl Fn() -> String + 'static) -> Self {
        Self {
            repo,
            generate: Box::new(generate),
        }
    }

    /// Issues one token with a value not shared by any stored token.
    ///
    /// # Errors
    /// - `ExhaustedAttempts` when all attempts collide.
    /// - `Repo` for any non-conflict storage failure.
    pub fn issue_token(&self) -> Result<Token, TokenServiceError> {
        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let token = Token::new((self.generate)());
            match self.repo.save(&token) {
                Ok(id) => {
                    info!("event=token_issue module=service status=ok token_id={id} attempt={attempt}");
                    return Ok(self.repo.get(id)?);
                }
                Err(RepoError::Conflict(_)) => {
                    warn!("event=token_issue module=service status=retry attempt={attempt}");
                }
                Err(err) => {
                    error!(
                        "event=token_issue module=service status=error attempt={attempt} error={err}"
                    );
                    return Err(err.into());
                }
            }
        }

        error!(
            "event=token_issue module=service status=error error_code=exhausted_attempts attempts={MAX_ISSUE_ATTEMPTS}"
        );
        Err(TokenServiceError::ExhaustedAttempts(MAX_ISSUE_ATTEMPTS))
    }

    /// Gets one token by id.
    pub fn get(&self, id: TokenId) -> Result<Token, TokenServiceError> {
        Ok(self.repo.get(id)?)
    }

    /// Gets one token by exact value.
    pub fn find_by_value(&self, value: &str) -> Result<Token, TokenServiceError> {
        Ok(self.repo.find_by_value(value)?)
    }

    /// Deletes token `id`; returns whether a row was removed.
    pub fn revoke(&self, id: TokenId) -> Result<bool, TokenServiceError> {
        let removed = self.repo.delete(id)?;
        info!("event=token_revoke module=service status=ok token_id={id} removed={removed}");
        Ok(removed)
    }
}
