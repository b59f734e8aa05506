//! Vectory CLI
//!
//! Inspect, manage and search a vector database over its HTTP API.

use anyhow::Result;
use clap::Parser;
use vectory_core::{Config, VectoryClient};

mod app;
mod commands;
mod output;

use app::{Cli, Commands};
use output::Output;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    // Failures are reported, not turned into an exit status
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.connection.overrides())?;
    tracing::debug!("using {}", config.api_url());
    let client = VectoryClient::new(&config)?;
    let out = Output::new(cli.format);

    match cli.command {
        Commands::Health(args) => commands::health::run(args, &client, &out).await,
        Commands::Schema(args) => commands::schema::run(args, &client, &out).await,
        Commands::Collection(args) => commands::collection::run(args, &client, &out).await,
        Commands::Objects(args) => commands::objects::run(args, &client, &out).await,
        Commands::Search(args) => commands::search::run(args, &client, &out).await,
    }
}
