mod bookings;
mod map;
mod search;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::search::ViewArgs;

#[derive(Debug, Parser)]
#[command(name = "voltspot-cli")]
#[command(about = "Find EV charging stations around a point or an address")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search for stations around a coordinate
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Geocode an address and search for stations around it
    Locate {
        address: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Group a JSON booking export into upcoming/active/past/cancelled
    Bookings { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Nearby { lat, lng, view }) => {
            let config = load_config()?;
            search::run_nearby(&config, lat, lng, &view).await
        }
        Some(Commands::Locate { address, view }) => {
            let config = load_config()?;
            search::run_locate(&config, &address, &view).await
        }
        Some(Commands::Bookings { path }) => {
            init_tracing("info")?;
            bookings::run_bookings(&path)
        }
        None => {
            println!("voltspot-cli: run with --help for available commands");
            Ok(())
        }
    }
}

fn load_config() -> anyhow::Result<voltspot_core::AppConfig> {
    let config = voltspot_core::load_app_config()?;
    init_tracing(&config.log_level)?;
    tracing::debug!(env = %config.env, "configuration loaded");
    Ok(config)
}

fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}
