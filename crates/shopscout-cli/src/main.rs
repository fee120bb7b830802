mod search;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shopscout_core::Site;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shopscout-cli")]
#[command(about = "Search storefronts from the command line; results are printed as JSON")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Text search across sites
    Search {
        query: String,
        /// Site to search; repeat for several. Defaults to every site.
        #[arg(long = "site")]
        sites: Vec<Site>,
        #[arg(long)]
        pretty: bool,
    },
    /// Image search across sites that support it
    Image {
        path: PathBuf,
        /// Site to search; repeat for several. Defaults to every site.
        #[arg(long = "site")]
        sites: Vec<Site>,
        #[arg(long)]
        pretty: bool,
    },
    /// List registered sites and the ones that failed to initialize
    Sites {
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = shopscout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let aggregator = search::build_aggregator(&config);

    match cli.command {
        Commands::Search {
            query,
            sites,
            pretty,
        } => search::run_search(&aggregator, &query, sites, pretty).await,
        Commands::Image {
            path,
            sites,
            pretty,
        } => search::run_image_search(&aggregator, &path, sites, pretty).await,
        Commands::Sites { pretty } => search::run_sites(&aggregator, pretty),
    }
}
