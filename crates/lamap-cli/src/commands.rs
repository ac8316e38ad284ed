//! Command handlers: each subcommand exercises one slice of the stack.

use std::sync::Arc;

use lamap_core::{AppConfig, Category, Coordinate, Zone, FALLBACK_ZONE};
use lamap_osm::{NominatimClient, OverpassClient};
use lamap_session::Coordinator;

use crate::providers::{
    FixedLocation, LocalZoneDirectory, NominatimSearchProvider, OverpassPoiProvider,
};

pub fn load_zones(config: &AppConfig) -> anyhow::Result<Vec<Zone>> {
    Ok(match &config.zones_path {
        Some(path) => lamap_core::load_zones(path)?,
        None => lamap_core::builtin_zones(),
    })
}

fn overpass_client(config: &AppConfig) -> anyhow::Result<OverpassClient> {
    Ok(OverpassClient::with_base_url(
        config.overpass_timeout_secs,
        &config.http_user_agent,
        &config.overpass_base_url,
    )?
    .with_retry(config.http_max_retries, config.http_retry_backoff_base_ms)
    .with_cache_ttl(config.poi_cache_ttl_secs))
}

fn nominatim_client(config: &AppConfig) -> anyhow::Result<NominatimClient> {
    Ok(NominatimClient::with_base_url(
        config.nominatim_timeout_secs,
        &config.http_user_agent,
        &config.nominatim_base_url,
    )?
    .with_retry(config.http_max_retries, config.http_retry_backoff_base_ms))
}

pub fn zones(config: &AppConfig) -> anyhow::Result<()> {
    for zone in load_zones(config)? {
        let vertices = zone.coordinates.first().map_or(0, Vec::len);
        println!("{:<16} {}  ({vertices} vertices)", zone.name, zone.color);
    }
    Ok(())
}

pub fn locate(config: &AppConfig, lat: f64, lon: f64) -> anyhow::Result<()> {
    let point = Coordinate::new(lat, lon);
    anyhow::ensure!(point.is_valid(), "coordinates out of range: {point}");

    let zones = load_zones(config)?;
    match lamap_core::resolve_zone(point, &zones) {
        Some(zone) => println!("{point} is in {}", zone.name),
        None => println!("{point} is outside every zone (fallback: {FALLBACK_ZONE})"),
    }
    Ok(())
}

pub async fn pois(
    config: &AppConfig,
    zone_name: &str,
    category: Option<Category>,
    user: Option<Coordinate>,
) -> anyhow::Result<()> {
    let zones = load_zones(config)?;
    let zone = lamap_core::zone_by_name(zone_name, &zones)
        .ok_or_else(|| anyhow::anyhow!("unknown zone: {zone_name}"))?;

    let categories: Vec<Category> = category.into_iter().collect();
    let groups = overpass_client(config)?
        .pois_in_zone(zone, &categories, user)
        .await?;

    for (category, pois) in &groups {
        println!("{category} ({})", pois.len());
        for poi in pois {
            match poi.distance_km {
                Some(km) => println!("  {} — {} ({km} km)", poi.name, poi.description),
                None => println!("  {} — {}", poi.name, poi.description),
            }
        }
    }
    Ok(())
}

pub async fn search(config: &AppConfig, query: &str, lat: f64, lon: f64) -> anyhow::Result<()> {
    let user = Coordinate::new(lat, lon);
    anyhow::ensure!(user.is_valid(), "coordinates out of range: {user}");

    match nominatim_client(config)?.search(query, user).await? {
        Some(place) => {
            println!("{}", place.name);
            println!("  {}", place.description);
            println!("  ({:.4}, {:.4})", place.lat, place.lon);
        }
        None => println!("No places found for query: {query}"),
    }
    Ok(())
}

/// Drives a full coordinator session: locate, optional zone override,
/// optional category filter, then print the visible POIs.
pub async fn session(
    config: &AppConfig,
    user: Option<Coordinate>,
    zone: Option<String>,
    category: Option<Category>,
) -> anyhow::Result<()> {
    let zones = load_zones(config)?;
    let overpass = Arc::new(overpass_client(config)?);
    let nominatim = Arc::new(nominatim_client(config)?);

    let mut coordinator = Coordinator::new(
        Arc::new(FixedLocation(user)),
        Arc::new(LocalZoneDirectory::new(zones.clone())),
        Arc::new(OverpassPoiProvider::new(overpass, zones)),
        Arc::new(NominatimSearchProvider::new(nominatim)),
    );

    let legend = coordinator.zones().await?;
    println!(
        "zones: {}",
        legend
            .iter()
            .map(|z| z.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    coordinator.locate().await;
    if let Some(error) = &coordinator.state().error {
        println!("! {error}");
    }
    if let Some(position) = coordinator.state().user {
        println!("position: {position}");
    }
    if let Some(home) = &coordinator.state().home_zone {
        println!("home zone: {home}");
    }

    if let Some(zone) = zone {
        coordinator.select_zone(&zone).await;
        if let Some(error) = &coordinator.state().error {
            println!("! {error}");
        }
    }
    if let Some(category) = category {
        coordinator.set_category(category);
    }

    let state = coordinator.state();
    println!(
        "current zone: {} (category: {})",
        state.current_zone().unwrap_or("none"),
        state.category
    );

    let visible = state.visible_pois();
    println!("{} of {} POIs visible:", visible.len(), state.pois.len());
    for poi in visible.iter().take(15) {
        match poi.distance_km {
            Some(km) => println!("  {} ({km} km)", poi.name),
            None => println!("  {}", poi.name),
        }
    }
    Ok(())
}
