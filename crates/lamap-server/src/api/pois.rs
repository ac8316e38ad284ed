use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use lamap_core::{Category, Coordinate, Poi};

use crate::middleware::RequestId;

use super::{map_osm_error, validate_coordinate, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct PoisQuery {
    /// Comma-separated category names to narrow the upstream query.
    pub categories: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct PoisData {
    pub zone: String,
    pub pois: BTreeMap<String, Vec<Poi>>,
    pub total_count: usize,
}

pub(super) async fn list_zone_pois(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(zone_name): Path<String>,
    Query(query): Query<PoisQuery>,
) -> Result<Json<ApiResponse<PoisData>>, ApiError> {
    let Some(zone) = lamap_core::zone_by_name(&zone_name, &state.zones) else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("unknown zone: {zone_name}"),
        ));
    };

    let categories = parse_categories(&req_id.0, query.categories.as_deref())?;
    let user = parse_user(&req_id.0, query.lat, query.lon)?;

    let groups = state
        .overpass
        .pois_in_zone(zone, &categories, user)
        .await
        .map_err(|e| map_osm_error(req_id.0.clone(), &e))?;

    let total_count = groups.values().map(Vec::len).sum();
    let pois: BTreeMap<String, Vec<Poi>> = groups
        .into_iter()
        .map(|(category, pois)| (category.to_string(), pois))
        .collect();

    Ok(Json(ApiResponse {
        data: PoisData {
            zone: zone.name.clone(),
            pois,
            total_count,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Parses a comma-separated category list; unknown names are rejected.
fn parse_categories(request_id: &str, raw: Option<&str>) -> Result<Vec<Category>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Category>().map_err(|e| {
                ApiError::new(request_id.to_owned(), "validation_error", e)
            })
        })
        .collect()
}

/// Both of `lat`/`lon` or neither; one alone is a caller mistake.
fn parse_user(
    request_id: &str,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<Option<Coordinate>, ApiError> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => validate_coordinate(request_id, lat, lon).map(Some),
        (None, None) => Ok(None),
        _ => Err(ApiError::new(
            request_id.to_owned(),
            "validation_error",
            "lat and lon must be provided together",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_categories_accepts_known_names() {
        let parsed = parse_categories("req", Some("bars, utilities")).expect("should parse");
        assert_eq!(parsed, vec![Category::Bars, Category::Utilities]);
    }

    #[test]
    fn parse_categories_none_means_all() {
        assert!(parse_categories("req", None).expect("should parse").is_empty());
    }

    #[test]
    fn parse_categories_rejects_unknown_names() {
        let result = parse_categories("req", Some("bars,plumbing"));
        assert!(result.is_err(), "unknown category must be rejected");
    }

    #[test]
    fn parse_user_requires_both_or_neither() {
        assert!(parse_user("req", Some(34.05), None).is_err());
        assert!(parse_user("req", None, Some(-118.25)).is_err());
        assert!(parse_user("req", None, None).expect("ok").is_none());
        assert!(parse_user("req", Some(34.05), Some(-118.25)).expect("ok").is_some());
    }
}
