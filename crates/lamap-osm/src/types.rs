//! Wire types for the Overpass and Nominatim JSON responses.

use std::collections::HashMap;

use serde::Deserialize;

/// Top-level Overpass envelope: `{ "elements": [...] }`.
#[derive(Debug, Deserialize)]
pub(crate) struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

/// A single Overpass element. Nodes carry `lat`/`lon` directly; ways and
/// relations carry a `center` when the query asks for `out center`.
#[derive(Debug, Deserialize)]
pub(crate) struct OverpassElement {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub center: Option<OverpassCenter>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverpassCenter {
    pub lat: f64,
    pub lon: f64,
}

/// A single Nominatim search result. `lat`/`lon` arrive as strings.
#[derive(Debug, Deserialize)]
pub(crate) struct NominatimResult {
    #[serde(default)]
    pub display_name: Option<String>,
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NominatimAddress {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}
