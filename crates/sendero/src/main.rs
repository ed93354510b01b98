// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sendero - automated WhatsApp follow-ups for travel agencies.
//!
//! This is the binary entry point for the Sendero engine.

mod serve;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sendero_config::SenderoConfig;

/// Sendero - automated WhatsApp follow-ups for travel agencies.
#[derive(Parser, Debug)]
#[command(name = "sendero", version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file, bypassing the XDG lookup.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the follow-up dispatcher until interrupted.
    Serve,
    /// Show queue counts from the configured database.
    Status {
        /// Output machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Manage Sendero configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Load and validate the configuration, rendering any diagnostics.
    Check,
}

fn load_config(path: Option<&PathBuf>) -> Option<SenderoConfig> {
    let result = match path {
        Some(path) => sendero_config::load_and_validate_path(path),
        None => sendero_config::load_and_validate(),
    };
    match result {
        Ok(config) => Some(config),
        Err(errors) => {
            sendero_config::render_errors(&errors);
            None
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let Some(config) = load_config(cli.config.as_ref()) else {
        std::process::exit(1);
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json }) => status::run_status(&config, json).await,
        Some(Commands::Config {
            action: ConfigAction::Check,
        }) => {
            // Validation already ran during load; reaching here means clean.
            println!("configuration ok");
            Ok(())
        }
        None => {
            println!("sendero: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
