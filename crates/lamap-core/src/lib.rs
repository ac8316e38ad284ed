//! Domain logic for the LA interactive map: geometry utilities, zone
//! resolution, POI categorization, and application configuration.
//!
//! Everything here is pure and synchronous; HTTP clients live in
//! `lamap-osm` and session state in `lamap-session`.

use thiserror::Error;

mod app_config;
pub mod config;
pub mod geo;
pub mod poi;
pub mod zones;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{closest_index, haversine_km, point_in_ring, Coordinate};
pub use poi::{filter_by_category, Category, Place, Poi, TagFilter};
pub use zones::{
    builtin_zones, load_zones, resolve_zone, zone_by_name, Zone, FALLBACK_ZONE, LA_CENTER,
};

/// Errors from loading configuration: env vars or the zones YAML file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read zones file {path}: {source}")]
    ZonesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse zones file {path}: {source}")]
    ZonesFileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid zones: {0}")]
    InvalidZones(String),
}
