//! HTTP client for the Overpass API.
//!
//! Builds an Overpass QL query from a zone's polygon rings, fetches the
//! matching nodes/ways/relations, and turns them into categorized
//! [`Poi`] groups. Results are cached in memory with a TTL; empty
//! results are never cached so a transient upstream hiccup does not
//! pin an empty zone for an hour.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use reqwest::{Client, Url};

use lamap_core::{haversine_km, Category, Coordinate, Poi, Zone};

use crate::error::OsmError;
use crate::retry::retry_with_backoff;
use crate::types::{OverpassElement, OverpassResponse};

const DEFAULT_BASE_URL: &str = "https://overpass-api.de/api/interpreter";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;
const DEFAULT_CACHE_TTL_SECS: u64 = 3_600;

/// Client for the Overpass interpreter endpoint.
///
/// Use [`OverpassClient::new`] for production or
/// [`OverpassClient::with_base_url`] to point at a mock server in tests.
pub struct OverpassClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
    cache_ttl: Duration,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    stored_at: Instant,
    groups: BTreeMap<Category, Vec<Poi>>,
}

impl OverpassClient {
    /// Creates a new client pointed at the public Overpass instance.
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
        let base_url = Url::parse(base_url)
            .map_err(|_| OsmError::InvalidBaseUrl(base_url.to_owned()))?;

        Ok(Self {
            client,
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Overrides the retry policy.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Overrides the cache TTL. A TTL of zero disables caching.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl_secs: u64) -> Self {
        self.cache_ttl = Duration::from_secs(ttl_secs);
        self
    }

    /// Fetches POIs inside `zone`, grouped by category.
    ///
    /// `categories` narrows the query; an empty slice or any occurrence
    /// of [`Category::All`] fetches every fetchable category. Every
    /// requested category is present in the result, possibly empty.
    /// When `user` is given, each POI is annotated with its distance in
    /// kilometers (2 decimals) and each group is sorted nearest-first.
    ///
    /// # Errors
    ///
    /// - [`OsmError::Http`] on network failure or non-2xx status (5xx
    ///   and connection errors are retried first).
    /// - [`OsmError::UnexpectedPayload`] if the body is not an Overpass
    ///   JSON envelope (e.g. an HTML rate-limit page).
    /// - [`OsmError::Deserialize`] if the envelope does not match the
    ///   expected element shape.
    pub async fn pois_in_zone(
        &self,
        zone: &Zone,
        categories: &[Category],
        user: Option<Coordinate>,
    ) -> Result<BTreeMap<Category, Vec<Poi>>, OsmError> {
        let wanted = normalize_categories(categories);
        let cache_key = cache_key(&zone.name, &wanted);

        let mut groups = match self.cache_get(&cache_key) {
            Some(hit) => hit,
            None => {
                let query = build_overpass_query(zone, &wanted);
                tracing::debug!(zone = %zone.name, query = %query, "built Overpass query");

                let response = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                    self.request_elements(&query)
                })
                .await?;

                tracing::info!(
                    zone = %zone.name,
                    elements = response.elements.len(),
                    "Overpass query returned"
                );

                let groups = categorize_elements(response.elements, &wanted);
                let total: usize = groups.values().map(Vec::len).sum();
                if total > 0 {
                    self.cache_store(cache_key, &groups);
                }
                groups
            }
        };

        if let Some(origin) = user {
            annotate_distances(&mut groups, origin);
        }
        Ok(groups)
    }

    async fn request_elements(&self, query: &str) -> Result<OverpassResponse, OsmError> {
        let response = self
            .client
            .post(self.base_url.clone())
            .form(&[("data", query)])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|_| OsmError::UnexpectedPayload {
                service: "Overpass",
                detail: snippet(&body),
            })?;
        if value.get("elements").is_none_or(|e| !e.is_array()) {
            return Err(OsmError::UnexpectedPayload {
                service: "Overpass",
                detail: "missing elements array".to_owned(),
            });
        }
        serde_json::from_value(value).map_err(|e| OsmError::Deserialize {
            context: "Overpass interpreter response".to_owned(),
            source: e,
        })
    }

    fn cache_get(&self, key: &str) -> Option<BTreeMap<Category, Vec<Poi>>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        match cache.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.cache_ttl => {
                tracing::debug!(key, "Overpass cache hit");
                Some(entry.groups.clone())
            }
            Some(_) => {
                cache.remove(key);
                None
            }
            None => None,
        }
    }

    fn cache_store(&self, key: String, groups: &BTreeMap<Category, Vec<Poi>>) {
        if self.cache_ttl.is_zero() {
            return;
        }
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                groups: groups.clone(),
            },
        );
    }
}

/// Resolves the category selection to concrete fetchable categories.
fn normalize_categories(categories: &[Category]) -> Vec<Category> {
    if categories.is_empty() || categories.contains(&Category::All) {
        return Category::FETCHABLE.to_vec();
    }
    let mut wanted: Vec<Category> = categories.to_vec();
    wanted.sort_unstable();
    wanted.dedup();
    wanted
}

fn cache_key(zone_name: &str, categories: &[Category]) -> String {
    let mut labels: Vec<String> = categories.iter().map(ToString::to_string).collect();
    labels.sort_unstable();
    format!("{zone_name}_{}", labels.join(","))
}

/// Builds the Overpass QL query: one `poly` clause per element kind per
/// tag filter, over the zone's rings flattened to a `lat lon` sequence,
/// closed explicitly.
fn build_overpass_query(zone: &Zone, categories: &[Category]) -> String {
    let mut coords: Vec<String> = Vec::new();
    for ring in &zone.coordinates {
        for v in ring {
            coords.push(format!("{} {}", v[1], v[0]));
        }
    }
    if let (Some(first), Some(last)) = (coords.first(), coords.last()) {
        if first != last {
            coords.push(first.clone());
        }
    }
    let poly = coords.join(" ");

    let mut parts = Vec::new();
    for category in categories {
        for tag in category.tag_filters() {
            for element in ["node", "way", "relation"] {
                parts.push(format!(
                    "{element}[\"{}\"=\"{}\"](poly:\"{poly}\");",
                    tag.key, tag.value
                ));
            }
        }
    }

    format!(
        "[out:json][timeout:25];\n(\n{}\n);\nout center meta;",
        parts.join("\n")
    )
}

/// Turns raw elements into POIs grouped under the requested categories.
/// Every requested category is present in the output, possibly empty.
fn categorize_elements(
    elements: Vec<OverpassElement>,
    categories: &[Category],
) -> BTreeMap<Category, Vec<Poi>> {
    let mut groups: BTreeMap<Category, Vec<Poi>> =
        categories.iter().map(|c| (*c, Vec::new())).collect();

    for element in elements {
        let Some(category) = Category::from_tags(&element.tags) else {
            continue;
        };
        let Some(poi) = extract_poi(element) else {
            continue;
        };
        if let Some(group) = groups.get_mut(&category) {
            group.push(poi);
        }
    }
    groups
}

/// Extracts a [`Poi`] from an element, or `None` when it has no usable
/// coordinates. Unnamed features fall back to `Unnamed (<kind>)`.
fn extract_poi(element: OverpassElement) -> Option<Poi> {
    let tags = element.tags;

    let (lat, lon) = match element.kind.as_str() {
        "node" => (element.lat?, element.lon?),
        "way" | "relation" => {
            let center = element.center?;
            (center.lat, center.lon)
        }
        _ => return None,
    };

    let name = tags
        .get("name")
        .or_else(|| tags.get("brand"))
        .or_else(|| tags.get("operator"))
        .cloned()
        .unwrap_or_else(|| {
            let kind = tags
                .get("amenity")
                .or_else(|| tags.get("tourism"))
                .or_else(|| tags.get("shop"))
                .map_or("POI", String::as_str);
            format!("Unnamed ({kind})")
        });

    let mut description_parts = Vec::new();
    for (key, label) in [
        ("amenity", "Amenity"),
        ("tourism", "Tourism"),
        ("historic", "Historic"),
    ] {
        if let Some(value) = tags.get(key) {
            description_parts.push(format!("{label}: {value}"));
        }
    }
    let description = if description_parts.is_empty() {
        "POI".to_owned()
    } else {
        description_parts.join(" | ")
    };

    let address_parts: Vec<&str> = ["addr:street", "addr:city", "addr:state"]
        .iter()
        .filter_map(|k| tags.get(*k).map(String::as_str))
        .collect();
    let address = if address_parts.is_empty() {
        None
    } else {
        Some(address_parts.join(", "))
    };

    let amenity_type = tags
        .get("amenity")
        .or_else(|| tags.get("tourism"))
        .or_else(|| tags.get("historic"))
        .cloned();

    Some(Poi {
        name,
        lat,
        lon,
        amenity_type,
        description,
        address,
        distance_km: None,
        tags: Some(tags),
    })
}

/// Annotates every POI with its distance from `origin` (kilometers,
/// 2 decimals) and sorts each group nearest-first.
fn annotate_distances(groups: &mut BTreeMap<Category, Vec<Poi>>, origin: Coordinate) {
    for group in groups.values_mut() {
        for poi in group.iter_mut() {
            let km = haversine_km(origin, poi.coordinate());
            poi.distance_km = Some((km * 100.0).round() / 100.0);
        }
        group.sort_by(|a, b| {
            let da = a.distance_km.unwrap_or(f64::INFINITY);
            let db = b.distance_km.unwrap_or(f64::INFINITY);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_owned(),
    }
}
