//! tgcasino server binary
//!
//! `serve` runs the HTTP API with the settlement scheduler; `settle` runs one
//! settlement pass against the database and exits.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tgcasino::{
    api::ApiServer,
    common::{StaticMembership, SystemClock},
    config::ConfigLoader,
    metrics::CasinoMetrics,
    settlement::spawn_scheduler,
    CasinoConfig, CasinoService, Storage,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tgcasino")]
#[command(about = "Telegram Mini App casino backend", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<String>,

    /// API server host
    #[arg(long)]
    host: Option<String>,

    /// API server port
    #[arg(long)]
    port: Option<u16>,

    /// Database directory
    #[arg(long)]
    db_path: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Settle every battle round past its deadline, then exit
    Settle,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_path(path);
    }
    let mut config = loader.load()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(db_path) = args.db_path {
        config.storage.data_directory = db_path;
    }
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.monitoring.log_filter.clone().into()),
        )
        .init();

    let service = Arc::new(build_service(config)?);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let poll = service.config().settlement_poll_interval();
            let scheduler = spawn_scheduler(service.clone(), poll);
            let result = ApiServer::new(service).run().await;
            scheduler.abort();
            result
        }
        Command::Settle => {
            let settled = service.process_battles()?;
            info!("Settled {} battle round(s)", settled.len());
            for round in settled {
                info!(
                    "   {}: {} participants, {} winners, {} coins",
                    round.round_id, round.participants, round.winners, round.coins_awarded
                );
            }
            Ok(())
        }
    }
}

fn build_service(config: CasinoConfig) -> Result<CasinoService, Box<dyn std::error::Error>> {
    info!("Opening database: {}", config.storage.data_directory);
    let storage = Storage::open_with_config(&config.storage)?;
    let metrics = Arc::new(CasinoMetrics::new()?);
    let membership = Arc::new(StaticMembership::new(config.rewards.channel_members.clone()));

    Ok(CasinoService::new(
        storage,
        Arc::new(config),
        Arc::new(SystemClock),
        metrics,
        membership,
    ))
}
