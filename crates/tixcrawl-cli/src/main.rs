use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod pipeline;

#[derive(Debug, Parser)]
#[command(name = "tixcrawl")]
#[command(about = "Ticket-resale event and listing crawler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Full pipeline: discover events for every sweep point, then walk each
    /// event's ticket listings.
    Run {
        /// JSON file of {latitude, longitude, state} sweep points.
        #[arg(long, default_value = "us-cities.json")]
        locations: PathBuf,
    },
    /// Search phase only: discover event URLs and write the event snapshots.
    Events {
        #[arg(long, default_value = "us-cities.json")]
        locations: PathBuf,
    },
    /// Listing phase only, from a previously written event snapshot.
    Listings {
        /// Event snapshot to read. Defaults to event_urls.json in the
        /// configured output directory.
        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// Delete a profile on the browser-automation service.
    DropProfile {
        #[arg(long)]
        profile: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = tixcrawl_core::load_app_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { locations } => pipeline::run(&config, &locations).await,
        Commands::Events { locations } => pipeline::events(&config, &locations).await,
        Commands::Listings { events } => pipeline::listings(&config, events.as_deref()).await,
        Commands::DropProfile { profile } => pipeline::drop_profile(&config, &profile).await,
    }
}
