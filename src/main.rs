//! Climate Data Service - Main
//!
//! Serves the Honolulu, Hawaii climate dataset over a small read-only JSON
//! API. Each request opens its own database connection, runs one query and
//! closes it.
//!
//! Usage:
//!   cargo run --release                        # Serve on the port from climate.toml (default 5000)
//!   cargo run --release -- --port 8080         # Override the port
//!   cargo run --release -- --config other.toml # Use another configuration file
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string (overrides climate.toml)
//!   RUST_LOG     - log filter (default: info)

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use climate_service::config::{self, Overrides, DEFAULT_CONFIG_PATH};
use climate_service::db::{self, PgConnector};
use climate_service::endpoint::{EndpointServer, Router};
use log::{error, info};

#[derive(Debug, Parser)]
#[command(version, about = "Read-only HTTP API over the Hawaii climate dataset", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Address to bind, overrides server.host
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overrides server.port
    #[arg(long)]
    port: Option<u16>,

    /// PostgreSQL connection string, overrides DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Reject malformed start/end dates with 400
    #[arg(long)]
    strict_dates: bool,

    /// Start without checking that the climate tables exist
    #[arg(long)]
    skip_schema_check: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        error!("\n❌ {}\n", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    info!("🌦  Climate Data Service");

    let mut config = config::load_config_or_default(&cli.config)?;
    config.apply_env();

    config.apply_overrides(Overrides {
        host: cli.host,
        port: cli.port,
        database_url: cli.database_url,
        strict_dates: cli.strict_dates,
    });

    let database_url = config.database_url()?.to_string();

    if cli.skip_schema_check {
        info!("📊 Skipping schema check");
    } else {
        info!("📊 Validating database...");
        // Dropped right away: requests open their own connections.
        db::connect_and_verify(&database_url)?;
        info!("✓ Database ready");
    }

    let router = Router::new(PgConnector::new(database_url)?)
        .with_strict_dates(config.server.strict_dates);
    let server = EndpointServer::bind(&config.server.bind_addr(), router, config.server.workers)?;

    info!(
        "🚀 Serving with {} workers{}",
        config.server.workers,
        if config.server.strict_dates { ", strict date validation" } else { "" }
    );
    server.run();

    Ok(())
}
