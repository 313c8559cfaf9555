//! # throttlectl
//!
//! Operator tool for throttle windows: hit a limiter, clear a window for a
//! client that got locked out, or print the store key behind an identifier.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use throttle_core::{CounterStore, Identifier, Limit, RateLimiter};
use throttle_infra::InMemoryCounterStore;

mod commands;
mod config;
mod telemetry;

use config::{AppConfig, Backend};

#[derive(Debug, Parser)]
#[command(name = "throttlectl", version, about)]
struct Cli {
    /// Counter store to use (defaults to redis when REDIS_URL is set)
    #[arg(long, value_enum, env = "THROTTLE_BACKEND", global = true)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Count calls against an identifier's window
    Hit {
        identifier: String,
        /// Calls allowed per window
        #[arg(long)]
        max: u64,
        /// Window length in seconds
        #[arg(long, value_name = "SECS")]
        window: u64,
        /// Number of calls to make
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Drop the current window for an identifier
    Clear { identifier: String },
    /// Print the store key derived from an identifier
    Key { identifier: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::from_env().with_backend(cli.backend);

    telemetry::init_tracing(config.json_logs);
    tracing::debug!(backend = ?config.backend, "Configuration loaded");

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Key { identifier } => {
            let Some(key) = Identifier::new(identifier).storage_key() else {
                anyhow::bail!("identifier is blank, nothing is throttled");
            };
            writeln!(stdout, "{key}")?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Hit {
            identifier,
            max,
            window,
            count,
        } => {
            let store = build_store(config.backend).await?;
            let limit = Limit::new(max, Duration::from_secs(window));
            let limiter = RateLimiter::new(store, identifier, limit);

            if commands::hit(&limiter, count, &mut stdout).await? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Clear { identifier } => {
            let store = build_store(config.backend).await?;
            // Clearing ignores the limit
            let limiter = RateLimiter::new(store, identifier, Limit::new(0, Duration::ZERO));

            commands::clear(&limiter, &mut stdout).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn build_store(backend: Backend) -> anyhow::Result<Arc<dyn CounterStore>> {
    match backend {
        Backend::Memory => Ok(Arc::new(InMemoryCounterStore::from_env())),
        #[cfg(feature = "redis")]
        Backend::Redis => {
            let store = throttle_infra::RedisCounterStore::from_env().await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        Backend::Redis => anyhow::bail!("throttlectl was built without the redis feature"),
    }
}
