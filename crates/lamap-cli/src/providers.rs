//! Production adapters wiring the session provider traits onto local
//! zone data and the OSM clients.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use lamap_core::{resolve_zone, zone_by_name, Category, Coordinate, Place, Poi, Zone};
use lamap_osm::{NominatimClient, OverpassClient};
use lamap_session::{
    LocationError, LocationProvider, PoiProvider, ProviderError, SearchProvider, ZoneDirectory,
};

/// A position supplied on the command line, or nothing at all — the
/// latter exercises the coordinator's geolocation fallback.
pub struct FixedLocation(pub Option<Coordinate>);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        self.0.ok_or(LocationError::Unavailable)
    }
}

/// Zone directory backed by locally loaded zone polygons.
pub struct LocalZoneDirectory {
    zones: Vec<Zone>,
}

impl LocalZoneDirectory {
    #[must_use]
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }
}

#[async_trait]
impl ZoneDirectory for LocalZoneDirectory {
    async fn detect_zone(&self, point: Coordinate) -> Result<Option<String>, ProviderError> {
        Ok(resolve_zone(point, &self.zones).map(|z| z.name.clone()))
    }

    async fn list_zones(&self) -> Result<Vec<Zone>, ProviderError> {
        Ok(self.zones.clone())
    }
}

/// POI provider backed by the Overpass client; zone names are resolved
/// against the local zone polygons before querying.
pub struct OverpassPoiProvider {
    client: Arc<OverpassClient>,
    zones: Vec<Zone>,
}

impl OverpassPoiProvider {
    #[must_use]
    pub fn new(client: Arc<OverpassClient>, zones: Vec<Zone>) -> Self {
        Self { client, zones }
    }
}

#[async_trait]
impl PoiProvider for OverpassPoiProvider {
    async fn fetch_pois(
        &self,
        zone: &str,
        categories: &[Category],
        user: Option<Coordinate>,
    ) -> Result<BTreeMap<Category, Vec<Poi>>, ProviderError> {
        let zone = zone_by_name(zone, &self.zones)
            .ok_or_else(|| ProviderError(format!("unknown zone: {zone}")))?;
        self.client
            .pois_in_zone(zone, categories, user)
            .await
            .map_err(|e| ProviderError(e.to_string()))
    }
}

/// Search provider backed by the Nominatim client.
pub struct NominatimSearchProvider {
    client: Arc<NominatimClient>,
}

impl NominatimSearchProvider {
    #[must_use]
    pub fn new(client: Arc<NominatimClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchProvider for NominatimSearchProvider {
    async fn search(
        &self,
        query: &str,
        user: Coordinate,
    ) -> Result<Option<Place>, ProviderError> {
        self.client
            .search(query, user)
            .await
            .map_err(|e| ProviderError(e.to_string()))
    }
}
