//! # gamedex CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show record counts
//! - `export` - Export the catalog to a file
//! - `import` - Import a catalog file
//! - `init` - Initialize a new database

mod commands;

use clap::{Parser, Subcommand};
use gamedex_core::CatalogError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// gamedex - Game Catalog Server
///
/// Games, genres and developers behind a REST API with search,
/// guarded deletes and idempotent creation.
#[derive(Parser, Debug)]
#[command(name = "gamedex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the catalog database
    #[arg(short = 'D', long, global = true, default_value = "gamedex.db")]
    pub database: PathBuf,

    /// Storage backend: "memory" (snapshot file, volatile while serving) or "redb" (ACID database)
    #[arg(short = 'B', long, global = true, default_value = "redb")]
    pub backend: String,

    /// Server configuration file (TOML)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set.
    #[must_use]
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "gamedex=debug,tower_http=debug"
        } else {
            "gamedex=info,tower_http=debug"
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides the config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show record counts
    Status,

    /// Export the catalog
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (snapshot, json)
        #[arg(short = 't', long, default_value = "snapshot")]
        format: String,
    },

    /// Import a catalog export (snapshot or json)
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), CatalogError> {
    let backend = cli.backend.as_str();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(&cli.database, backend, cli.config.as_deref(), host, port).await
        }
        Some(Commands::Status) => cmd_status(&cli.database, backend, json_mode),
        Some(Commands::Export { output, format }) => {
            cmd_export(&cli.database, backend, &output, &format)
        }
        Some(Commands::Import { input }) => cmd_import(&cli.database, backend, &input),
        Some(Commands::Init { force }) => cmd_init(&cli.database, backend, force),
        None => cmd_status(&cli.database, backend, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================
