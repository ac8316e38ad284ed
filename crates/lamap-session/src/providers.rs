//! Provider traits for the session's external collaborators.
//!
//! The coordinator only sees these seams; production wiring adapts the
//! OSM clients and local zone data onto them, tests use fakes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use lamap_core::{Category, Coordinate, Place, Poi, Zone};

/// Why geolocation produced no coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("geolocation capability unavailable")]
    Unavailable,
    #[error("geolocation denied or timed out: {0}")]
    Denied(String),
}

/// Failure of a backend call, erased to a message at the provider seam.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// Source of the user's physical position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}

/// Zone lookup: which zone contains a coordinate, and the full zone list
/// for rendering.
#[async_trait]
pub trait ZoneDirectory: Send + Sync {
    /// Name of the zone containing `point`, or `Ok(None)` when no zone
    /// does. Errors are recoverable; the caller falls back.
    async fn detect_zone(&self, point: Coordinate) -> Result<Option<String>, ProviderError>;

    async fn list_zones(&self) -> Result<Vec<Zone>, ProviderError>;
}

/// Source of POIs for a zone, grouped by category.
#[async_trait]
pub trait PoiProvider: Send + Sync {
    /// Fetches the full unfiltered POI set for `zone`. `categories` may
    /// narrow server-side, but the client-side filter must keep working
    /// regardless of whether the server filtered.
    async fn fetch_pois(
        &self,
        zone: &str,
        categories: &[Category],
        user: Option<Coordinate>,
    ) -> Result<BTreeMap<Category, Vec<Poi>>, ProviderError>;
}

/// Free-text place search near a coordinate.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// `Ok(None)` means the query matched nothing.
    async fn search(&self, query: &str, user: Coordinate)
        -> Result<Option<Place>, ProviderError>;
}
