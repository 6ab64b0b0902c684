//! Process configuration resolved once at startup.
//!
//! # Responsibility
//! - Collect storage, logging and credential settings into `LumberConfig`.
//! - Read environment variables in one place, with documented defaults.
//!
//! # Invariants
//! - Core constructors receive configuration explicitly; nothing else in the
//!   core reads the environment.
//! - Empty or whitespace-only variables count as unset.
//!
//! # Variables
//! | Variable | Default |
//! |---|---|
//! | `LUMBER_DB_PATH` | `<temp_dir>/lumber.sqlite3` |
//! | `LUMBER_LOG_LEVEL` | `debug` in debug builds, `info` otherwise |
//! | `LUMBER_LOG_DIR` | unset: file logging disabled |
//! | `LUMBER_SESSION_TOKEN` | unset |
//! | `LUMBER_BUSY_TIMEOUT_MS` | `5000` |
//! | `LUMBER_DERIVE_PRIVATE_FROM_TITLE` | `false` |

use crate::db::{DbOptions, DEFAULT_BUSY_TIMEOUT_MS};
use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "LUMBER_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "LUMBER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LUMBER_LOG_DIR";
pub const ENV_SESSION_TOKEN: &str = "LUMBER_SESSION_TOKEN";
pub const ENV_BUSY_TIMEOUT_MS: &str = "LUMBER_BUSY_TIMEOUT_MS";
pub const ENV_DERIVE_PRIVATE_FROM_TITLE: &str = "LUMBER_DERIVE_PRIVATE_FROM_TITLE";

const DEFAULT_DB_FILE_NAME: &str = "lumber.sqlite3";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub message: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid `{}`: {}", self.variable, self.message)
    }
}

impl Error for ConfigError {}

/// Resolved process configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct LumberConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<String>,
    /// Session token used for write operations.
    pub token: Option<String>,
    pub busy_timeout_ms: u64,
    /// Applies the `[wip]` title rule before posting.
    pub derive_private_from_title: bool,
}

impl Default for LumberConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            token: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            derive_private_from_title: false,
        }
    }
}

impl std::fmt::Debug for LumberConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LumberConfig")
            .field("db_path", &self.db_path)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .field("derive_private_from_title", &self.derive_private_from_title)
            .finish()
    }
}

impl LumberConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = read(ENV_LOG_DIR);
        config.token = read(ENV_SESSION_TOKEN);
        if let Some(raw) = read(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout_ms = raw.parse().map_err(|_| ConfigError {
                variable: ENV_BUSY_TIMEOUT_MS,
                message: format!("expected milliseconds, got `{raw}`"),
            })?;
        }
        if let Some(raw) = read(ENV_DERIVE_PRIVATE_FROM_TITLE) {
            config.derive_private_from_title = parse_flag(ENV_DERIVE_PRIVATE_FROM_TITLE, &raw)?;
        }

        Ok(config)
    }

    /// Connection options derived from this configuration.
    pub fn db_options(&self) -> DbOptions {
        DbOptions::with_busy_timeout_ms(self.busy_timeout_ms)
    }
}

fn parse_flag(variable: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            variable,
            message: format!("expected a boolean, got `{raw}`"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        LumberConfig, ENV_BUSY_TIMEOUT_MS, ENV_DB_PATH, ENV_DERIVE_PRIVATE_FROM_TITLE,
        ENV_SESSION_TOKEN,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = LumberConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, LumberConfig::default());
        assert!(config.token.is_none());
        assert!(!config.derive_private_from_title);
        assert_eq!(config.db_options().busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn variables_override_defaults() {
        let config = LumberConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/var/lib/lumber.db"),
            (ENV_SESSION_TOKEN, " foo "),
            (ENV_BUSY_TIMEOUT_MS, "250"),
            (ENV_DERIVE_PRIVATE_FROM_TITLE, "YES"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/lumber.db"));
        assert_eq!(config.token.as_deref(), Some("foo"));
        assert_eq!(config.busy_timeout_ms, 250);
        assert!(config.derive_private_from_title);
    }

    #[test]
    fn blank_token_counts_as_unset() {
        let config = LumberConfig::from_lookup(lookup(&[(ENV_SESSION_TOKEN, "   ")])).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = LumberConfig::from_lookup(lookup(&[(ENV_BUSY_TIMEOUT_MS, "soon")])).unwrap_err();
        assert_eq!(err.variable, ENV_BUSY_TIMEOUT_MS);

        let err = LumberConfig::from_lookup(lookup(&[(ENV_DERIVE_PRIVATE_FROM_TITLE, "maybe")]))
            .unwrap_err();
        assert_eq!(err.variable, ENV_DERIVE_PRIVATE_FROM_TITLE);
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = LumberConfig::from_lookup(lookup(&[(ENV_SESSION_TOKEN, "secret")])).unwrap();
        assert!(!format!("{config:?}").contains("secret"));
    }
}
