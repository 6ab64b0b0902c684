//! Command handlers for the `lumber` CLI.
//!
//! # Responsibility
//! - Open storage from `LumberConfig` and drive the core lifecycle services.
//! - Print JSON responses shaped like the entry HTTP API.
//!
//! # Invariants
//! - Write commands fail with `MissingToken` before opening storage when no
//!   token is configured.
//! - Token values are printed only by `token new`.

use crate::args::{Commands, TokenCommands};
use lumber_core::db::{open_db, DbError};
use lumber_core::{
    derive_status_from_title, extract_title_and_content, EntryElement, EntryId, EntryService,
    EntryTitle, EntryValidationError, ErrorKind, LifecycleError, LumberConfig, RepoError,
    SqliteEntryRepository, SqliteTokenRepository, TokenService, TokenServiceError,
};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const EXIT_ERROR: u8 = 11;
pub const EXIT_INVALID_INPUT: u8 = 13;
pub const EXIT_SETUP_ERROR: u8 = 14;
pub const EXIT_UNAUTHORIZED: u8 = 15;
pub const EXIT_NOT_FOUND: u8 = 16;
pub const EXIT_CONFLICT: u8 = 17;

/// Failure of one CLI command.
#[derive(Debug)]
pub enum CliError {
    /// A write command ran without a configured token.
    MissingToken,
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },
    Markdown(EntryValidationError),
    Db(DbError),
    Repo(RepoError),
    Lifecycle(LifecycleError),
    Token(TokenServiceError),
    Output(std::io::Error),
}

impl CliError {
    /// Core failure class; `None` for failures raised by the CLI itself.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::MissingToken => Some(ErrorKind::Unauthorized),
            Self::ReadInput { .. } | Self::Db(_) | Self::Output(_) => None,
            Self::Markdown(_) => Some(ErrorKind::Validation),
            Self::Repo(err) => Some(err.kind()),
            Self::Lifecycle(err) => Some(err.kind()),
            Self::Token(err) => Some(err.kind()),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match (self, self.kind()) {
            (Self::ReadInput { .. }, _) => EXIT_INVALID_INPUT,
            (Self::Db(_), _) => EXIT_SETUP_ERROR,
            (_, Some(ErrorKind::Validation)) => EXIT_INVALID_INPUT,
            (_, Some(ErrorKind::Unauthorized)) => EXIT_UNAUTHORIZED,
            (_, Some(ErrorKind::NotFound)) => EXIT_NOT_FOUND,
            (_, Some(ErrorKind::Conflict)) => EXIT_CONFLICT,
            (_, Some(ErrorKind::Storage) | None) => EXIT_ERROR,
        }
    }

    /// Label printed in front of the message on stderr.
    pub fn label(&self) -> &'static str {
        self.kind().map_or("cli", ErrorKind::as_str)
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingToken => write!(
                f,
                "a write token is required; set LUMBER_SESSION_TOKEN or pass --token"
            ),
            Self::ReadInput { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::Markdown(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "failed to open database: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Lifecycle(err) => write!(f, "{err}"),
            Self::Token(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to write output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingToken => None,
            Self::ReadInput { source, .. } => Some(source),
            Self::Markdown(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Lifecycle(err) => Some(err),
            Self::Token(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<LifecycleError> for CliError {
    fn from(value: LifecycleError) -> Self {
        Self::Lifecycle(value)
    }
}

impl From<TokenServiceError> for CliError {
    fn from(value: TokenServiceError) -> Self {
        Self::Token(value)
    }
}

#[derive(Serialize)]
struct IdResponse {
    id: EntryId,
}

#[derive(Serialize)]
struct IdsResponse {
    ids: Vec<EntryId>,
}

#[derive(Serialize)]
struct TitlesResponse {
    data: Vec<EntryTitle>,
}

#[derive(Serialize)]
struct DeletedResponse {
    deleted: bool,
}

#[derive(Serialize)]
struct RenderResponse {
    title: String,
    content: String,
}

/// Runs one command and writes its JSON response to `out`.
pub fn run(
    command: &Commands,
    config: &LumberConfig,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Commands::Render { file } => {
            let (title, content) = extract_title_and_content(&read_input(file)?);
            write_json(out, &RenderResponse { title, content })
        }
        Commands::Post { file, private } => {
            let token = require_token(config)?;
            let mut element = read_element(file)?;
            if *private {
                element.set_private();
            } else if config.derive_private_from_title {
                derive_status_from_title(&mut element);
            }
            let conn = open_storage(config)?;
            let id = entry_service(&conn)?.post(&element, token)?;
            info!("event=cli_post module=cli status=ok entry_id={id}");
            write_json(out, &IdResponse { id })
        }
        Commands::Edit { id, file } => {
            let token = require_token(config)?;
            let element = read_element(file)?;
            let conn = open_storage(config)?;
            entry_service(&conn)?.edit(*id, &element, token)?;
            write_json(out, &IdResponse { id: *id })
        }
        Commands::Get { id } => {
            let conn = open_storage(config)?;
            let entry = entry_service(&conn)?.get(*id)?;
            write_json(out, &entry)
        }
        Commands::Ids => {
            let conn = open_storage(config)?;
            let ids = entry_service(&conn)?.get_ids()?;
            write_json(out, &IdsResponse { ids })
        }
        Commands::Titles { start, n } => {
            let conn = open_storage(config)?;
            let data = entry_service(&conn)?.get_titles(*start, *n)?;
            write_json(out, &TitlesResponse { data })
        }
        Commands::Delete { id } => {
            let token = require_token(config)?;
            let conn = open_storage(config)?;
            let deleted = entry_service(&conn)?.delete(*id, token)?;
            write_json(out, &DeletedResponse { deleted })
        }
        Commands::Token(TokenCommands::New) => {
            let conn = open_storage(config)?;
            let repo = SqliteTokenRepository::try_new(&conn)?;
            let token = TokenService::new(repo).issue_token()?;
            write_json(out, &token)
        }
        Commands::Token(TokenCommands::Revoke { id }) => {
            let conn = open_storage(config)?;
            let repo = SqliteTokenRepository::try_new(&conn)?;
            let deleted = TokenService::new(repo).revoke(*id)?;
            write_json(out, &DeletedResponse { deleted })
        }
    }
}

fn require_token(config: &LumberConfig) -> Result<&str, CliError> {
    config.token.as_deref().ok_or(CliError::MissingToken)
}

fn read_input(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::ReadInput {
        path: path.to_path_buf(),
        source,
    })
}

fn read_element(path: &Path) -> Result<EntryElement, CliError> {
    EntryElement::from_markdown(&read_input(path)?).map_err(CliError::Markdown)
}

fn open_storage(config: &LumberConfig) -> Result<Connection, CliError> {
    Ok(open_db(&config.db_path, &config.db_options())?)
}

fn entry_service(
    conn: &Connection,
) -> Result<EntryService<SqliteEntryRepository<'_>, SqliteTokenRepository<'_>>, CliError> {
    Ok(EntryService::new(
        SqliteEntryRepository::try_new(conn)?,
        SqliteTokenRepository::try_new(conn)?,
    ))
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> Result<(), CliError> {
    serde_json::to_writer(&mut *out, value).map_err(|err| CliError::Output(err.into()))?;
    writeln!(out).map_err(CliError::Output)
}

#[cfg(test)]
mod tests {
    use super::{
        run, CliError, EXIT_CONFLICT, EXIT_ERROR, EXIT_INVALID_INPUT, EXIT_NOT_FOUND,
        EXIT_UNAUTHORIZED,
    };
    use lumber_core::{RepoError, TokenServiceError};
    use crate::args::{Cli, Commands};
    use clap::Parser;
    use lumber_core::LumberConfig;
    use serde_json::Value;
    use std::path::Path;

    fn parse(args: &[&str]) -> Commands {
        let mut argv = vec!["lumber"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    fn config_in(dir: &Path, token: Option<&str>) -> LumberConfig {
        LumberConfig {
            db_path: dir.join("lumber.sqlite3"),
            token: token.map(str::to_string),
            ..LumberConfig::default()
        }
    }

    fn run_json(command: &Commands, config: &LumberConfig) -> Result<Value, CliError> {
        let mut out = Vec::new();
        run(command, config, &mut out)?;
        Ok(serde_json::from_slice(&out).unwrap())
    }

    fn issue_token(config: &LumberConfig) -> String {
        let token = run_json(&parse(&["token", "new"]), config).unwrap();
        token["value"].as_str().unwrap().to_string()
    }

    #[test]
    fn post_get_edit_delete_through_cli() {
        let dir = tempfile::tempdir().unwrap();
        let admin = config_in(dir.path(), None);
        let config = config_in(dir.path(), Some(&issue_token(&admin)));

        let first = dir.path().join("first.md");
        std::fs::write(&first, "# title\n\n## content").unwrap();
        let posted = run_json(&parse(&["post", first.to_str().unwrap()]), &config).unwrap();
        let id = posted["id"].as_i64().unwrap();
        assert!(id > 0);

        let entry = run_json(&parse(&["get", &id.to_string()]), &config).unwrap();
        assert_eq!(entry["title"], "title");
        assert_eq!(entry["content"], "<h2>content</h2>");
        assert_eq!(entry["status"], 0);

        let second = dir.path().join("second.md");
        std::fs::write(&second, "# renamed\n\nbody").unwrap();
        run_json(
            &parse(&["edit", &id.to_string(), second.to_str().unwrap()]),
            &config,
        )
        .unwrap();
        let titles = run_json(&parse(&["titles", "0"]), &config).unwrap();
        assert_eq!(titles["data"][0]["title"], "renamed");

        let ids = run_json(&parse(&["ids"]), &config).unwrap();
        assert_eq!(ids["ids"], serde_json::json!([id]));

        let deleted = run_json(&parse(&["delete", &id.to_string()]), &config).unwrap();
        assert_eq!(deleted["deleted"], true);
        let again = run_json(&parse(&["delete", &id.to_string()]), &config).unwrap();
        assert_eq!(again["deleted"], false);

        let missing = run_json(&parse(&["get", &id.to_string()]), &config).unwrap_err();
        assert_eq!(missing.exit_code(), EXIT_NOT_FOUND);
    }

    #[test]
    fn private_flag_and_wip_rule_set_status() {
        let dir = tempfile::tempdir().unwrap();
        let admin = config_in(dir.path(), None);
        let mut config = config_in(dir.path(), Some(&issue_token(&admin)));
        config.derive_private_from_title = true;

        let wip = dir.path().join("wip.md");
        std::fs::write(&wip, "# [WIP] title\n\ncontent").unwrap();
        let posted = run_json(&parse(&["post", wip.to_str().unwrap()]), &config).unwrap();
        let entry = run_json(
            &parse(&["get", &posted["id"].as_i64().unwrap().to_string()]),
            &config,
        )
        .unwrap();
        assert_eq!(entry["status"], 1);

        let plain = dir.path().join("plain.md");
        std::fs::write(&plain, "# title\n\ncontent").unwrap();
        let posted = run_json(
            &parse(&["post", plain.to_str().unwrap(), "--private"]),
            &config,
        )
        .unwrap();
        let entry = run_json(
            &parse(&["get", &posted["id"].as_i64().unwrap().to_string()]),
            &config,
        )
        .unwrap();
        assert_eq!(entry["status"], 1);
    }

    #[test]
    fn writes_require_a_valid_token() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("entry.md");
        std::fs::write(&file, "# title\n\ncontent").unwrap();
        let post = parse(&["post", file.to_str().unwrap()]);

        let missing = run_json(&post, &config_in(dir.path(), None)).unwrap_err();
        assert!(matches!(missing, CliError::MissingToken));
        assert_eq!(missing.exit_code(), EXIT_UNAUTHORIZED);

        let unknown = run_json(&post, &config_in(dir.path(), Some("bogus"))).unwrap_err();
        assert_eq!(unknown.exit_code(), EXIT_UNAUTHORIZED);
    }

    #[test]
    fn empty_markdown_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("empty.md");
        std::fs::write(&file, "").unwrap();

        let err = run_json(
            &parse(&["post", file.to_str().unwrap()]),
            &config_in(dir.path(), Some("foo")),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Markdown(_)));
        assert_eq!(err.exit_code(), EXIT_INVALID_INPUT);
    }

    #[test]
    fn render_does_not_touch_storage() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "# heading\n\n- a\n- b\n").unwrap();
        let config = config_in(dir.path(), None);

        let rendered = run_json(&parse(&["render", file.to_str().unwrap()]), &config).unwrap();
        assert_eq!(rendered["title"], "heading");
        assert!(!config.db_path.exists());
    }

    #[test]
    fn negative_titles_start_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_json(
            &parse(&["titles", "-1", "5"]),
            &config_in(dir.path(), None),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INVALID_INPUT);
    }

    #[test]
    fn error_labels_and_exit_codes_follow_core_kinds() {
        let missing = CliError::MissingToken;
        assert_eq!(missing.label(), "unauthorized");
        assert_eq!(missing.exit_code(), EXIT_UNAUTHORIZED);

        let conflict = CliError::Token(TokenServiceError::Repo(RepoError::Conflict(
            "tokens.value",
        )));
        assert_eq!(conflict.label(), "conflict");
        assert_eq!(conflict.exit_code(), EXIT_CONFLICT);

        let exhausted = CliError::Token(TokenServiceError::ExhaustedAttempts(20));
        assert_eq!(exhausted.label(), "storage");
        assert_eq!(exhausted.exit_code(), EXIT_ERROR);

        let output = CliError::Output(std::io::Error::other("closed"));
        assert_eq!(output.label(), "cli");
        assert_eq!(output.exit_code(), EXIT_ERROR);
    }
}
