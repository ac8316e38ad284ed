//! Zone model and resolution: named, colored polygon regions with a
//! first-match containment scan, plus the built-in LA zone set and the
//! YAML loader for custom zone files.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo::{point_in_ring, Coordinate};
use crate::ConfigError;

/// Zone name used when detection yields nothing or fails. Presentation
/// policy: the resolver itself returns `None` and callers apply this.
pub const FALLBACK_ZONE: &str = "Downtown LA";

/// City-center coordinate used when geolocation is unavailable.
pub const LA_CENTER: Coordinate = Coordinate::new(34.0522, -118.2437);

/// A named polygonal region with a display color.
///
/// `coordinates` holds polygon rings of `[lon, lat]` vertex pairs; ring 0
/// is the outer boundary and is the only ring consulted for containment
/// (holes are not modeled). Rings are implicitly closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub color: String,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl Zone {
    /// Whether the outer ring contains `point`.
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        self.coordinates
            .first()
            .is_some_and(|ring| point_in_ring(point, ring))
    }
}

/// First zone in list order whose outer ring contains `point`.
///
/// When zones overlap, list order decides the winner; callers must not
/// read semantic meaning into that order.
#[must_use]
pub fn resolve_zone(point: Coordinate, zones: &[Zone]) -> Option<&Zone> {
    zones.iter().find(|zone| zone.contains(point))
}

/// Case-insensitive zone lookup by name.
#[must_use]
pub fn zone_by_name<'a>(name: &str, zones: &'a [Zone]) -> Option<&'a Zone> {
    zones.iter().find(|zone| zone.name.eq_ignore_ascii_case(name))
}

/// The default LA zones: simplified rectangles around four neighborhoods.
#[must_use]
pub fn builtin_zones() -> Vec<Zone> {
    vec![
        Zone {
            name: "Downtown LA".to_owned(),
            color: "#FF6B6B".to_owned(),
            coordinates: vec![vec![
                [-118.2600, 34.0400],
                [-118.2400, 34.0400],
                [-118.2400, 34.0600],
                [-118.2600, 34.0600],
                [-118.2600, 34.0400],
            ]],
        },
        Zone {
            name: "Hollywood".to_owned(),
            color: "#4ECDC4".to_owned(),
            coordinates: vec![vec![
                [-118.3600, 34.0800],
                [-118.3200, 34.0800],
                [-118.3200, 34.1100],
                [-118.3600, 34.1100],
                [-118.3600, 34.0800],
            ]],
        },
        Zone {
            name: "Santa Monica".to_owned(),
            color: "#45B7D1".to_owned(),
            coordinates: vec![vec![
                [-118.5000, 34.0100],
                [-118.4800, 34.0100],
                [-118.4800, 34.0300],
                [-118.5000, 34.0300],
                [-118.5000, 34.0100],
            ]],
        },
        Zone {
            name: "Pasadena".to_owned(),
            color: "#96CEB4".to_owned(),
            coordinates: vec![vec![
                [-118.1600, 34.1300],
                [-118.1200, 34.1300],
                [-118.1200, 34.1600],
                [-118.1600, 34.1600],
                [-118.1600, 34.1300],
            ]],
        },
    ]
}

#[derive(Debug, Deserialize)]
struct ZonesFile {
    zones: Vec<Zone>,
}

/// Load and validate zone definitions from a YAML file of the shape
/// `{ zones: [{ name, color, coordinates }] }`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or if any
/// zone fails validation (empty/duplicate name, missing outer ring,
/// fewer than 3 distinct vertices, out-of-range coordinates).
pub fn load_zones(path: &Path) -> Result<Vec<Zone>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ZonesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let file: ZonesFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ZonesFileParse {
            path: path.display().to_string(),
            source: e,
        })?;
    validate_zones(&file.zones)?;
    Ok(file.zones)
}

fn validate_zones(zones: &[Zone]) -> Result<(), ConfigError> {
    if zones.is_empty() {
        return Err(ConfigError::InvalidZones("no zones defined".to_owned()));
    }

    let mut seen = HashSet::new();
    for zone in zones {
        if zone.name.trim().is_empty() {
            return Err(ConfigError::InvalidZones("zone with empty name".to_owned()));
        }
        if !seen.insert(zone.name.to_lowercase()) {
            return Err(ConfigError::InvalidZones(format!(
                "duplicate zone name: {}",
                zone.name
            )));
        }

        let Some(outer) = zone.coordinates.first() else {
            return Err(ConfigError::InvalidZones(format!(
                "zone {} has no rings",
                zone.name
            )));
        };

        let distinct: HashSet<_> = outer
            .iter()
            .map(|v| (v[0].to_bits(), v[1].to_bits()))
            .collect();
        if distinct.len() < 3 {
            return Err(ConfigError::InvalidZones(format!(
                "zone {} outer ring needs at least 3 distinct vertices",
                zone.name
            )));
        }

        for v in zone.coordinates.iter().flatten() {
            if !Coordinate::new(v[1], v[0]).is_valid() {
                return Err(ConfigError::InvalidZones(format!(
                    "zone {} has out-of-range vertex [{}, {}]",
                    zone.name, v[0], v[1]
                )));
            }
        }
    }
    Ok(())
}
