//! # gamedex - Game Catalog Server
//!
//! The main binary for the gamedex catalog.
//!
//! This application provides:
//! - HTTP REST API server (axum-based), with legacy, `/v1` and `/v2` surfaces
//! - CLI interface for catalog maintenance
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 apps/gamedex (THE BINARY)                │
//! │                                                          │
//! │     ┌─────────────┐            ┌──────────────────┐      │
//! │     │    CLI      │            │    HTTP API      │      │
//! │     │   (clap)    │            │ (axum + tower)   │      │
//! │     └──────┬──────┘            └────────┬─────────┘      │
//! │            └──────────────┬─────────────┘                │
//! │                           ▼                              │
//! │                  ┌─────────────────┐                     │
//! │                  │  gamedex-core   │                     │
//! │                  │  (THE LOGIC)    │                     │
//! │                  └─────────────────┘                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! gamedex server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! gamedex status
//! gamedex export -o catalog.gdex
//! gamedex -B memory -D seed.gdex import -i catalog.json
//! ```

use clap::Parser;
use gamedex::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // GAMEDEX_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("GAMEDEX_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.default_log_filter().into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
   ___ _ __ _ _ __  ___ __| |_____ __
  / _` / _` | '  \/ -_) _` / -_) \ /
  \__, \__,_|_|_|_\___\__,_\___/_\_\
  |___/

  Game Catalog Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
