// SPDX-FileCopyrightText: 2026 Smsgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! smsgate - SMS gateway with durable queueing and provider fallback.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use smsgate_config::model::SmsgateConfig;

use crate::serve::Mode;

/// smsgate - SMS gateway with durable queueing and provider fallback.
#[derive(Parser, Debug)]
#[command(name = "smsgate", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway and the queue consumer.
    Serve,
    /// Run only the HTTP gateway.
    Gateway,
    /// Run only the queue consumer.
    Consume,
    /// Load and validate the configuration, then exit.
    CheckConfig,
    /// Print a message and its event history from the local database.
    Status {
        tracking_id: String,
        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> SmsgateConfig {
    let loaded = match path {
        Some(path) => smsgate_config::load_and_validate_path(path),
        None => smsgate_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            smsgate_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config, Mode::All).await,
        Some(Commands::Gateway) => serve::run_serve(config, Mode::GatewayOnly).await,
        Some(Commands::Consume) => serve::run_serve(config, Mode::ConsumerOnly).await,
        Some(Commands::CheckConfig) => {
            println!(
                "smsgate: configuration OK ({} clients, {} providers, listening on {}:{})",
                config.clients.len(),
                config.providers.iter().filter(|p| p.enabled).count(),
                config.gateway.host,
                config.gateway.port
            );
            Ok(())
        }
        Some(Commands::Status { tracking_id, json }) => {
            status::run_status(&config, &tracking_id, json).await
        }
        None => {
            println!("smsgate: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
