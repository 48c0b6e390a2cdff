//! Main entry point for the tabular-scraper CLI

use clap::Parser;
use tabular_scraper::cli::{Cli, Commands};
use tabular_scraper::CancelSignal;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tabular_scraper=info"));

    // Logs go to stderr; stdout carries fetched bodies and export paths.
    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run(cli: &Cli, cancel: CancelSignal) -> anyhow::Result<()> {
    if let Some(addr) = cli.metrics_addr {
        tabular_scraper::metrics::init_metrics(addr)?;
    }

    match &cli.command {
        Commands::Fetch(args) => args.execute(cli, cancel).await?,
        Commands::Export(args) => {
            args.execute(cli, cancel).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let cancel = CancelSignal::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - cancelling pending requests...");
                cancel.cancel();
            }
        }
    });

    if let Err(e) = run(&cli, cancel).await {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
}
