mod logging;
mod scrape;
mod zips;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use scrape::Site;

#[derive(Debug, Parser)]
#[command(name = "zipcrawl-cli")]
#[command(about = "Build a ZIP code list and scrape provider locators for every ZIP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the ZIP code list (skipped when the list already exists)
    Zips,
    /// Scrape one locator site for every ZIP code in the list
    Scrape {
        #[arg(value_enum)]
        site: Site,
        /// Only scrape the first N locations
        #[arg(long)]
        limit: Option<usize>,
        /// Result CSV path (default: `<output_dir>/<site>.csv`)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = zipcrawl_core::load_app_config()?;

    match cli.command {
        Commands::Zips => {
            logging::init_tracing(&config.log_level, &config.log_path("zipcodes"))?;
            zips::run_zips(&config).await
        }
        Commands::Scrape {
            site,
            limit,
            output,
        } => {
            logging::init_tracing(&config.log_level, &config.log_path(site.name()))?;
            scrape::run_scrape(&config, site, limit, output).await
        }
    }
}
