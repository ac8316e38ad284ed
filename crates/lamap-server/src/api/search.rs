use axum::{
    extract::State,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use lamap_core::Place;

use crate::middleware::RequestId;

use super::{map_osm_error, validate_coordinate, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SearchRequest {
    pub query: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchData {
    #[serde(flatten)]
    pub place: Place,
}

pub(super) async fn search_places(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    let user = validate_coordinate(&req_id.0, request.lat, request.lon)?;

    let place = state
        .nominatim
        .search(&request.query, user)
        .await
        .map_err(|e| map_osm_error(req_id.0.clone(), &e))?;

    let Some(place) = place else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("No places found for query: {}", request.query),
        ));
    };

    Ok(Json(ApiResponse {
        data: SearchData { place },
        meta: ResponseMeta::new(req_id.0),
    }))
}
