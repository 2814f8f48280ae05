use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use engine::{Config, RunOptions};

/// Seed-space maintenance companion for a Transmission daemon.
///
/// Run it from cron for maintenance ticks, and as the daemon's
/// script-torrent-done hook (selected automatically through the
/// `TR_TORRENT_ID` environment variable) for placement of finished
/// downloads.
#[derive(Parser)]
#[command(name = "seedwarden", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Report actions without changing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    engine::run(
        &config,
        RunOptions {
            dry_run: cli.dry_run,
        },
    )
    .await?;

    Ok(())
}
