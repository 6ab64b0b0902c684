//! Token domain model.
//!
//! Tokens are opaque bearer credentials with a single privilege level: a
//! caller either presents a stored value or it does not.

use serde::{Deserialize, Serialize};

/// Datastore-assigned token identifier.
pub type TokenId = i64;

/// Opaque write credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// `0` until the token is persisted.
    pub id: TokenId,
    pub value: String,
    /// Unix epoch milliseconds, assigned by storage.
    pub created_at: i64,
    /// Unix epoch milliseconds, assigned by storage.
    pub updated_at: i64,
}

impl Token {
    /// Creates an unsaved token carrying `value`.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: 0,
            value: value.into(),
            created_at: 0,
            updated_at: 0,
        }
    }
}

// Value is redacted so tokens never end up in logs through `{:?}`.
impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("id", &self.id)
            .field("value", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Token;

    #[test]
    fn debug_output_redacts_value() {
        let token = Token::new("secret-value");
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
