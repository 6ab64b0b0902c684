//! Token gate for mutating entry operations.
//!
//! # Responsibility
//! - Decide whether a presented bearer token may write.
//! - Keep the value comparison in one function (`tokens_match`).
//!
//! # Invariants
//! - Empty tokens are rejected without touching storage.
//! - Authorization has no side effects.
//! - Token values are never logged.
//! - A stored token authorizes only when `tokens_match` confirms the value
//!   returned by the repository lookup.
//!
//! The repository lookup itself (`WHERE value = ?1` in SQLite) is not
//! constant-time; `tokens_match` only covers the final comparison.

use crate::repo::entry_repo::RepoError;
use crate::repo::token_repo::TokenRepository;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Authorization failure.
#[derive(Debug)]
pub enum AuthError {
    /// Token is empty or unknown.
    InsufficientPrivileges,
    /// Token lookup failed for a reason other than "not found".
    Repo(RepoError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientPrivileges => write!(f, "insufficient privileges"),
            Self::Repo(err) => write!(f, "token lookup failed: {err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InsufficientPrivileges => None,
            Self::Repo(err) => Some(err),
        }
    }
}

/// Compares a stored token value with a presented one in constant time
/// relative to the value contents.
pub fn tokens_match(stored: &str, presented: &str) -> bool {
    let stored = stored.as_bytes();
    let presented = presented.as_bytes();
    if stored.len() != presented.len() {
        return false;
    }

    let mut diff: u8 = 0;
    for (a, b) in stored.iter().zip(presented.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}

/// Write-authorization gate over a token repository.
pub struct TokenGate<T: TokenRepository> {
    tokens: T,
}

impl<T: TokenRepository> TokenGate<T> {
    pub fn new(tokens: T) -> Self {
        Self { tokens }
    }

    /// Confirms that `token` is a stored token.
    ///
    /// # Errors
    /// - `InsufficientPrivileges` for an empty or unknown token.
    /// - `Repo` when storage fails during lookup.
    pub fn authorize(&self, token: &str) -> Result<(), AuthError> {
        if token.is_empty() {
            warn!("event=auth module=auth status=error error_code=empty_token");
            return Err(AuthError::InsufficientPrivileges);
        }

        match self.tokens.find_by_value(token) {
            Ok(stored) if tokens_match(&stored.value, token) => {
                debug!("event=auth module=auth status=ok token_id={}", stored.id);
                Ok(())
            }
            Ok(_) | Err(RepoError::TokenNotFound) => {
                warn!("event=auth module=auth status=error error_code=unknown_token");
                Err(AuthError::InsufficientPrivileges)
            }
            Err(err) => {
                warn!(
                    "event=auth module=auth status=error error_code=token_lookup_failed error={err}"
                );
                Err(AuthError::Repo(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{tokens_match, AuthError, TokenGate};
    use crate::model::token::{Token, TokenId};
    use crate::repo::entry_repo::{RepoError, RepoResult};
    use crate::repo::memory::MemoryTokenRepository;
    use crate::repo::token_repo::TokenRepository;

    // Lookup that ignores ASCII case, like a NOCASE column collation would.
    struct CaseInsensitiveTokens(Token);

    impl TokenRepository for CaseInsensitiveTokens {
        fn get(&self, _id: TokenId) -> RepoResult<Token> {
            Ok(self.0.clone())
        }

        fn find_by_value(&self, value: &str) -> RepoResult<Token> {
            if self.0.value.eq_ignore_ascii_case(value) {
                Ok(self.0.clone())
            } else {
                Err(RepoError::TokenNotFound)
            }
        }

        fn save(&self, _token: &Token) -> RepoResult<TokenId> {
            Err(RepoError::Conflict("tokens.value"))
        }

        fn update(&self, _token: &Token) -> RepoResult<()> {
            Ok(())
        }

        fn delete(&self, _id: TokenId) -> RepoResult<bool> {
            Ok(false)
        }
    }

    #[test]
    fn tokens_match_requires_equal_length_and_bytes() {
        assert!(tokens_match("foo", "foo"));
        assert!(!tokens_match("foo", "fo"));
        assert!(!tokens_match("foo", "fob"));
        assert!(!tokens_match("", "foo"));
    }

    #[test]
    fn known_token_is_authorized() {
        let repo = MemoryTokenRepository::with_values(["foo"]).unwrap();
        let gate = TokenGate::new(&repo);
        assert!(gate.authorize("foo").is_ok());
    }

    #[test]
    fn empty_and_unknown_tokens_are_rejected() {
        let repo = MemoryTokenRepository::with_values(["foo"]).unwrap();
        let gate = TokenGate::new(&repo);
        assert!(matches!(
            gate.authorize(""),
            Err(AuthError::InsufficientPrivileges)
        ));
        assert!(matches!(
            gate.authorize("bar"),
            Err(AuthError::InsufficientPrivileges)
        ));
    }

    #[test]
    fn lookup_hit_with_different_value_is_rejected() {
        let gate = TokenGate::new(CaseInsensitiveTokens(Token::new("Foo")));
        assert!(gate.authorize("Foo").is_ok());
        assert!(matches!(
            gate.authorize("foo"),
            Err(AuthError::InsufficientPrivileges)
        ));
    }
}
