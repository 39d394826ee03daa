// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Triplog - vehicle telemetry to trip sessions.
//!
//! This is the binary entry point for the Triplog command line.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod import;
mod sessions;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use triplog_config::TriplogConfig;
use triplog_core::TriplogError;

use crate::import::ImportArgs;

/// Triplog - vehicle telemetry to trip sessions.
#[derive(Parser, Debug)]
#[command(name = "triplog", version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the XDG hierarchy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colors and progress bars.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a telemetry export as one trip session.
    Import {
        /// CSV export to read.
        file: PathBuf,
        /// Identifier the session uid is derived from.
        #[arg(long)]
        origin: String,
        /// Session start date (RFC 3339), defaults to now.
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// Delete an existing session for the origin first.
        #[arg(long)]
        recreate: bool,
    },
    /// List stored sessions.
    Sessions {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show one session.
    Show {
        /// Session uid.
        uid: String,
        /// Also print the first N samples.
        #[arg(long, value_name = "N")]
        samples: Option<usize>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Validate the configuration and print the effective values.
    CheckConfig,
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("triplog={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// The effective configuration as TOML, with the API key masked.
fn render_config(config: &TriplogConfig) -> Result<String, TriplogError> {
    let mut shown = config.clone();
    if shown.geocode.api_key.is_some() {
        shown.geocode.api_key = Some("********".into());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| TriplogError::Internal(format!("failed to render config: {e}")))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let loaded = match &cli.config {
        Some(path) => triplog_config::load_and_validate_path(path),
        None => triplog_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            triplog_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.log.level);

    let result = match cli.command {
        Some(Commands::Import {
            file,
            origin,
            start,
            recreate,
        }) => {
            let args = ImportArgs {
                file,
                origin,
                start,
                recreate,
            };
            import::run_import(&config, args, cli.plain).await
        }
        Some(Commands::Sessions { json }) => sessions::run_sessions(&config, json, cli.plain).await,
        Some(Commands::Show { uid, samples, json }) => {
            sessions::run_show(&config, &uid, samples, json, cli.plain).await
        }
        Some(Commands::CheckConfig) => render_config(&config).map(|text| {
            println!("triplog: config OK");
            print!("{text}");
        }),
        None => {
            println!("triplog: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("triplog: {e}");
        std::process::exit(1);
    }
}
