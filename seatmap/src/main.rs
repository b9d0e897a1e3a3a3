//! SeatMap CLI

mod cli;

use std::process::ExitCode;

use clap::Parser;
use seatmap_lib::core::config::resolve_data_dir;
use seatmap_lib::{AppConfig, logging};

use cli::{Cli, Reported};

async fn start(cli: Cli) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir);
    let _guard = logging::init_tracing(&data_dir.join("logs"), cli.verbose)?;
    tracing::info!(data_dir = %data_dir.display(), "SeatMap starting");

    let mut config = AppConfig::load_from_dir(&data_dir)?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    tracing::debug!(api = %config.api_base_url, routing = %config.routing_url, "Configuration loaded");

    cli::run(cli.command, config, &data_dir).await
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match start(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        // Already printed as a notice
        Err(e) if e.is::<Reported>() => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
