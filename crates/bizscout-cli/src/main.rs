mod search;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bizscout_client::SearchClient;
use bizscout_core::ItemId;

use crate::search::SearchArgs;

#[derive(Debug, Parser)]
#[command(name = "bizscout")]
#[command(about = "Browse business listings from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search listings and print the visible list
    Search(SearchArgs),
    /// Print the reviews of one listing
    Reviews {
        /// Listing id as returned by `search`
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = bizscout_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(env = %config.env, base_url = %config.api_base_url, "configuration loaded");

    let client = SearchClient::from_config(&config)?;
    match cli.command {
        Commands::Search(args) => search::run_search(&client, &config, &args).await,
        Commands::Reviews { id } => search::run_reviews(&client, &ItemId::new(id)).await,
    }
}
