mod lookup;
mod map;

use clap::{Parser, Subcommand};
use fsamaps_client::FsaClient;
use fsamaps_core::{LatLng, RatingFilter};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fsamaps-cli")]
#[command(about = "Food hygiene ratings on the map, from the command line")]
struct Cli {
    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the businesses visible in a map view centred on a point
    Viewport {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, default_value = "17")]
        zoom: u8,
        /// Comma-separated rating filters (e.g. `5,4,pass`)
        #[arg(long)]
        ratings: Option<RatingFilter>,
    },
    /// Search businesses by name and/or address fragment
    Search {
        #[arg(long)]
        name: Option<String>,
        /// Address or postcode fragment
        #[arg(long)]
        location: Option<String>,
        /// Comma-separated rating filters (e.g. `5,4,pass`)
        #[arg(long)]
        ratings: Option<RatingFilter>,
        /// Fly to the n-th result (1-based) and show its popup
        #[arg(long)]
        open: Option<usize>,
    },
    /// Show provenance of the served dataset
    Metadata {
        /// Show the last N imports instead of the current one
        #[arg(long)]
        history: Option<u32>,
    },
    /// Check whether the API is reachable
    Health,
    /// Resolve a rating value and/or rating key offline
    Rating {
        #[arg(long)]
        value: Option<String>,
        #[arg(long)]
        key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("fsamaps-cli: run with --help to list commands");
        return Ok(());
    };

    if let Commands::Rating { value, key } = &command {
        init_tracing("info")?;
        return lookup::run_rating(value.as_deref(), key.as_deref(), cli.json);
    }

    let config = fsamaps_core::load_app_config()?;
    init_tracing(&config.log_level)?;
    tracing::debug!(?config, "configuration loaded");

    let client = FsaClient::new(
        &config.api_url,
        config.request_timeout_secs,
        &config.user_agent,
    )
    .map_err(|e| anyhow::anyhow!("failed to build API client: {e}"))?;

    match command {
        Commands::Viewport {
            lat,
            lng,
            zoom,
            ratings,
        } => {
            map::run_viewport(
                client,
                &config,
                LatLng::new(lat, lng),
                zoom,
                ratings.unwrap_or_default(),
                cli.json,
            )
            .await
        }
        Commands::Search {
            name,
            location,
            ratings,
            open,
        } => {
            let query = fsamaps_core::SearchQuery {
                name,
                location,
                ratings: ratings.unwrap_or_default(),
            };
            map::run_search(client, &config, &query, open, cli.json).await
        }
        Commands::Metadata { history: None } => lookup::run_metadata(&client, cli.json).await,
        Commands::Metadata {
            history: Some(limit),
        } => lookup::run_metadata_history(&client, limit, cli.json).await,
        Commands::Health => lookup::run_health(&client).await,
        Commands::Rating { .. } => Ok(()),
    }
}

/// Installs the fmt subscriber, preferring `RUST_LOG` over `default_level`.
fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
