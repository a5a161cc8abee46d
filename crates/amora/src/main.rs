// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Amora - matching backend for a dating service.
//!
//! Binary entry point: loads configuration, wires the engine together,
//! and exposes a few operational subcommands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use amora_cache::MemoryStore;
use amora_config::AmoraConfig;
use amora_core::{AmoraError, CounterStore, NullNotificationSink, UserId};
use amora_engine::MatchingEngine;
use amora_storage::Database;

/// Amora - matching backend for a dating service.
#[derive(Parser, Debug)]
#[command(name = "amora", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the database opens and answers queries.
    Doctor,
    /// Print a user's matching statistics.
    Stats {
        /// User to report on.
        #[arg(long)]
        user: UserId,
    },
    /// Inspect or reset a user's rate-limit violations.
    Violations {
        /// User to inspect.
        #[arg(long)]
        user: UserId,
        /// Clear the counter instead of printing it.
        #[arg(long)]
        reset: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match amora_config::load_and_validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("amora: {e}");
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.service.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(cli, config).await {
        error!(error = %e, "command failed");
        eprintln!("amora: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: AmoraConfig) -> Result<(), AmoraError> {
    match cli.command {
        Some(Commands::Doctor) => {
            let storage =
                Database::open_with(&config.storage.database_path, config.storage.wal_mode)
                    .await?;
            storage.health_check().await?;
            storage.close().await?;
            println!("ok: database at {}", config.storage.database_path);
        }
        Some(Commands::Stats { user }) => {
            let engine = build_engine(&config).await?;
            let stats = engine.get_statistics(user).await?;
            let json = serde_json::to_string_pretty(&stats)
                .map_err(|e| AmoraError::Internal(e.to_string()))?;
            println!("{json}");
        }
        Some(Commands::Violations { user, reset }) => {
            let engine = build_engine(&config).await?;
            if reset {
                engine.reset_rate_violations(user).await?;
                println!("violations for user {user} reset");
            } else {
                println!("{}", engine.rate_violations(user).await?);
            }
        }
        Some(Commands::Config) => {
            let toml = toml_render(&config)?;
            print!("{toml}");
        }
        None => {
            println!("amora: use --help for available commands");
        }
    }
    Ok(())
}

async fn build_engine(config: &AmoraConfig) -> Result<MatchingEngine, AmoraError> {
    let storage = Arc::new(
        Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?,
    );
    let cache: Arc<dyn CounterStore> = Arc::new(MemoryStore::new());
    Ok(MatchingEngine::from_config(
        config,
        storage,
        cache,
        Arc::new(NullNotificationSink),
    ))
}

fn toml_render(config: &AmoraConfig) -> Result<String, AmoraError> {
    toml::to_string_pretty(config).map_err(|e| AmoraError::Config(e.to_string()))
}
