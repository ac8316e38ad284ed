//! HTTP client for the Nominatim geocoding API.
//!
//! Searches free-text queries and returns the single result closest to
//! the user's coordinate, the way the map's search box behaves. Nominatim
//! requires an identifying user-agent on every request.

use std::time::Duration;

use reqwest::{Client, Url};

use lamap_core::{closest_index, Coordinate, Place};

use crate::error::OsmError;
use crate::retry::retry_with_backoff;
use crate::types::NominatimResult;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;
const DEFAULT_RESULT_LIMIT: usize = 5;

/// Client for the Nominatim search endpoint.
pub struct NominatimClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl NominatimClient {
    /// Creates a new client pointed at the public Nominatim instance.
    ///
    /// # Errors
    ///
    /// Returns [`OsmError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, OsmError> {
        Self::with_base_url(timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`OsmError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`OsmError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, OsmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so
        // joining "search" appends a path segment instead of replacing one.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|_| OsmError::InvalidBaseUrl(base_url.to_owned()))?;

        Ok(Self {
            client,
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the retry policy.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Searches for `query` and returns the result closest to `user`,
    /// or `Ok(None)` when nothing matches.
    ///
    /// # Errors
    ///
    /// - [`OsmError::Http`] on network failure or non-2xx status (5xx
    ///   and connection errors are retried first).
    /// - [`OsmError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn search(
        &self,
        query: &str,
        user: Coordinate,
    ) -> Result<Option<Place>, OsmError> {
        let url = self
            .base_url
            .join("search")
            .map_err(|_| OsmError::InvalidBaseUrl(self.base_url.to_string()))?;

        let results = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_search(url.clone(), query)
        })
        .await?;

        // Results whose lat/lon strings fail to parse are skipped rather
        // than failing the whole search.
        let candidates: Vec<(Coordinate, &NominatimResult)> = results
            .iter()
            .filter_map(|r| {
                let lat = r.lat.parse::<f64>().ok()?;
                let lon = r.lon.parse::<f64>().ok()?;
                Some((Coordinate::new(lat, lon), r))
            })
            .collect();

        let coords: Vec<Coordinate> = candidates.iter().map(|(c, _)| *c).collect();
        let Some(index) = closest_index(user, &coords) else {
            return Ok(None);
        };
        let (coordinate, result) = &candidates[index];

        Ok(Some(Place {
            name: result
                .display_name
                .clone()
                .unwrap_or_else(|| "Unknown Place".to_owned()),
            lat: coordinate.lat,
            lon: coordinate.lon,
            description: format_description(result),
        }))
    }

    async fn request_search(
        &self,
        url: Url,
        query: &str,
    ) -> Result<Vec<NominatimResult>, OsmError> {
        let limit = DEFAULT_RESULT_LIMIT.to_string();
        let response = self
            .client
            .get(url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("addressdetails", "1"),
                ("extratags", "1"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| OsmError::Deserialize {
            context: format!("Nominatim search(query={query})"),
            source: e,
        })
    }
}

/// Builds a ` | `-joined description from the result's category, type
/// and address, falling back to `"Location found"`.
fn format_description(result: &NominatimResult) -> String {
    let mut parts = Vec::new();
    if let Some(category) = &result.category {
        parts.push(format!("Category: {category}"));
    }
    if let Some(kind) = &result.kind {
        parts.push(format!("Type: {kind}"));
    }
    if let Some(address) = &result.address {
        if let Some(city) = &address.city {
            parts.push(format!("City: {city}"));
        }
        if let Some(state) = &address.state {
            parts.push(format!("State: {state}"));
        }
    }
    if parts.is_empty() {
        "Location found".to_owned()
    } else {
        parts.join(" | ")
    }
}
