use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lumber")]
#[command(about = "Post and manage markdown entries", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite database path (overrides LUMBER_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Write token (overrides LUMBER_SESSION_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an entry from a markdown file
    Post {
        file: PathBuf,

        /// Store the entry as private
        #[arg(long)]
        private: bool,
    },

    /// Replace title and content of an entry from a markdown file
    Edit { id: i64, file: PathBuf },

    /// Print one entry as JSON
    Get { id: i64 },

    /// List all entry ids
    Ids,

    /// List entry titles starting at an id
    #[command(allow_negative_numbers = true)]
    Titles {
        start: i64,

        /// Maximum number of titles; values below 1 use the default
        #[arg(default_value_t = 0)]
        n: i64,
    },

    /// Delete an entry
    #[command(alias = "rm")]
    Delete { id: i64 },

    /// Show the title and content extracted from a markdown file
    Render { file: PathBuf },

    /// Manage write tokens
    #[command(subcommand)]
    Token(TokenCommands),
}

#[derive(Subcommand, Debug)]
pub enum TokenCommands {
    /// Issue a new token
    New,

    /// Delete a token by id
    Revoke { id: i64 },
}
