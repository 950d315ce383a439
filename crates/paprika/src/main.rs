// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paprika - the reliability core of a conversational recipe-assistant bot.
//!
//! This is the binary entry point: it loads and validates configuration,
//! then runs the serve loop (dispatch worker + outbox delivery) or the
//! operator status surface.

mod serve;
mod status;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

/// Paprika - reliable conversational messaging backend.
#[derive(Parser, Debug)]
#[command(name = "paprika", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the dispatch worker and outbox delivery loops.
    Serve,
    /// Show ledger and outbox counts, including failed tasks needing
    /// operator attention.
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match paprika_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            paprika_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status) => status::run_status(config).await,
        None => {
            println!("paprika: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
