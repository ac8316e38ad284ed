use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use lamap_core::{Zone, FALLBACK_ZONE};

use crate::middleware::RequestId;

use super::{validate_coordinate, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ZonesData {
    pub zones: Vec<Zone>,
}

pub(super) async fn list_zones(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ZonesData>> {
    Json(ApiResponse {
        data: ZonesData {
            zones: state.zones.as_ref().clone(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[derive(Debug, Deserialize)]
pub(super) struct ResolveQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct ResolvedZone {
    pub zone: String,
    pub color: Option<String>,
    /// False when no zone contains the point and the fallback applies.
    pub detected: bool,
}

pub(super) async fn resolve_zone(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<ApiResponse<ResolvedZone>>, ApiError> {
    let point = validate_coordinate(&req_id.0, query.lat, query.lon)?;

    let data = match lamap_core::resolve_zone(point, &state.zones) {
        Some(zone) => ResolvedZone {
            zone: zone.name.clone(),
            color: Some(zone.color.clone()),
            detected: true,
        },
        None => ResolvedZone {
            zone: FALLBACK_ZONE.to_owned(),
            color: lamap_core::zone_by_name(FALLBACK_ZONE, &state.zones)
                .map(|z| z.color.clone()),
            detected: false,
        },
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
