mod commands;
mod providers;

use clap::{Parser, Subcommand};

use lamap_core::{Category, Coordinate};

#[derive(Debug, Parser)]
#[command(name = "lamap-cli")]
#[command(about = "LA interactive map command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the configured zones.
    Zones,
    /// Resolve which zone contains a coordinate.
    Locate {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Fetch POIs for a zone from Overpass.
    Pois {
        zone: String,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    /// Search for a place near a coordinate via Nominatim.
    Search {
        query: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Run a full map session: locate, resolve the home zone, fetch and
    /// filter POIs. Omitting --lat/--lon exercises the fallback path.
    Session {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
        #[arg(long)]
        zone: Option<String>,
        #[arg(long)]
        category: Option<Category>,
    },
}

fn pair_to_coordinate(lat: Option<f64>, lon: Option<f64>) -> anyhow::Result<Option<Coordinate>> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok(Some(Coordinate::new(lat, lon))),
        (None, None) => Ok(None),
        _ => anyhow::bail!("--lat and --lon must be provided together"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = lamap_core::load_app_config()?;
    let cli = Cli::parse();
    match cli.command {
        Commands::Zones => commands::zones(&config)?,
        Commands::Locate { lat, lon } => commands::locate(&config, lat, lon)?,
        Commands::Pois {
            zone,
            category,
            lat,
            lon,
        } => {
            let user = pair_to_coordinate(lat, lon)?;
            commands::pois(&config, &zone, category, user).await?;
        }
        Commands::Search { query, lat, lon } => {
            commands::search(&config, &query, lat, lon).await?;
        }
        Commands::Session {
            lat,
            lon,
            zone,
            category,
        } => {
            let user = pair_to_coordinate(lat, lon)?;
            commands::session(&config, user, zone, category).await?;
        }
    }

    Ok(())
}
