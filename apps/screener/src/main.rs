mod cli;
mod config;
mod dashboard;
mod errors;
mod extractor;
mod llm_client;
mod models;
mod routes;
mod screening;
mod state;
mod store;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let sources = config::default_sources();

    // Initialize structured logging first so key resolution is traced
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME"),
                config::log_level(&sources)
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    // Every missing key is reported together
    let config = Config::resolve_for(&sources, cli.config_scope())?;
    cli::run(cli, config).await
}
