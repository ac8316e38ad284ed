//! Geographic primitives: coordinates, great-circle distance, and the
//! ray-casting point-in-polygon test used for zone containment.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers, used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both components are inside the valid WGS84 range.
    #[must_use]
    pub fn is_valid(self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

/// Great-circle distance between two coordinates in kilometers.
///
/// Haversine formula over a spherical Earth of radius
/// [`EARTH_RADIUS_KM`]. Symmetric, and zero for identical points.
#[must_use]
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * h.sqrt().asin()
}

/// Ray-casting containment test against a single polygon ring.
///
/// `ring` is an ordered sequence of `[lon, lat]` vertices and is treated
/// as implicitly closed. A crossing is counted when the point's latitude
/// lies strictly above the edge's lower latitude, at or below its upper
/// latitude, and the edge's intersection with the horizontal ray sits at
/// or beyond the point's longitude; crossing parity decides containment.
///
/// Degenerate or self-intersecting rings are not guarded against. Rings
/// with fewer than 3 vertices never contain anything.
#[must_use]
pub fn point_in_ring(point: Coordinate, ring: &[[f64; 2]]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let x = point.lon;
    let y = point.lat;
    let mut inside = false;

    let mut p1 = ring[0];
    for i in 1..=ring.len() {
        let p2 = ring[i % ring.len()];
        let (p1x, p1y) = (p1[0], p1[1]);
        let (p2x, p2y) = (p2[0], p2[1]);

        // Horizontal edges (p1y == p2y) can never satisfy the strict
        // lower bound together with the inclusive upper bound.
        if y > p1y.min(p2y) && y <= p1y.max(p2y) && x <= p1x.max(p2x) {
            let vertical = (p1x - p2x).abs() < f64::EPSILON;
            let x_intersect = (y - p1y) * (p2x - p1x) / (p2y - p1y) + p1x;
            if vertical || x <= x_intersect {
                inside = !inside;
            }
        }
        p1 = p2;
    }

    inside
}

/// Index of the point in `points` closest to `origin`, by great-circle
/// distance. `None` for an empty slice.
#[must_use]
pub fn closest_index(origin: Coordinate, points: &[Coordinate]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let d = haversine_km(origin, *p);
        if best.is_none_or(|(_, min)| d < min) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}
