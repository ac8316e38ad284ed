use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::checkins::{CheckIn, NewCheckIn, TopLocation};
use crate::middleware::RequestId;

use super::{normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct FeedQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct FeedData {
    pub zone: String,
    pub checkins: Vec<CheckIn>,
}

pub(super) async fn list_zone_checkins(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(zone): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Json<ApiResponse<FeedData>> {
    let checkins = state
        .checkins
        .recent(&zone, normalize_limit(query.limit, 20))
        .await;
    Json(ApiResponse {
        data: FeedData { zone, checkins },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[derive(Debug, Serialize)]
pub(super) struct TopData {
    pub zone: String,
    pub locations: Vec<TopLocation>,
}

pub(super) async fn list_top_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(zone): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Json<ApiResponse<TopData>> {
    let locations = state
        .checkins
        .top(&zone, normalize_limit(query.limit, 10))
        .await;
    Json(ApiResponse {
        data: TopData { zone, locations },
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn create_checkin(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(new): Json<NewCheckIn>,
) -> Result<(StatusCode, Json<ApiResponse<CheckIn>>), ApiError> {
    if new.user_name.trim().is_empty() || new.poi_name.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "user_name and poi_name are required",
        ));
    }
    if !lamap_core::Coordinate::new(new.lat, new.lon).is_valid() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("coordinates out of range: ({}, {})", new.lat, new.lon),
        ));
    }

    let checkin = state.checkins.add(new).await;
    tracing::info!(zone = %checkin.zone_name, poi = %checkin.poi_name, "check-in recorded");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: checkin,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
