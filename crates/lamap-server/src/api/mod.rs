mod checkins;
mod pois;
mod search;
mod zones;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use lamap_core::Zone;
use lamap_osm::{NominatimClient, OverpassClient};

use crate::checkins::CheckinStore;
use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub zones: Arc<Vec<Zone>>,
    pub overpass: Arc<OverpassClient>,
    pub nominatim: Arc<NominatimClient>,
    pub checkins: CheckinStore,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    zones: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Maps an upstream OSM client failure onto the error envelope.
pub(super) fn map_osm_error(request_id: String, error: &lamap_osm::OsmError) -> ApiError {
    tracing::error!(error = %error, "upstream OSM request failed");
    ApiError::new(request_id, "bad_gateway", "upstream service failed")
}

/// Rejects out-of-range coordinates before they reach a backend call.
pub(super) fn validate_coordinate(
    request_id: &str,
    lat: f64,
    lon: f64,
) -> Result<lamap_core::Coordinate, ApiError> {
    let coordinate = lamap_core::Coordinate::new(lat, lon);
    if coordinate.is_valid() {
        Ok(coordinate)
    } else {
        Err(ApiError::new(
            request_id.to_owned(),
            "validation_error",
            format!("coordinates out of range: ({lat}, {lon})"),
        ))
    }
}

pub(super) fn normalize_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, 100)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/zones", get(zones::list_zones))
        .route("/api/v1/zones/resolve", get(zones::resolve_zone))
        .route("/api/v1/search", post(search::search_places))
        .route("/api/v1/pois/{zone}", get(pois::list_zone_pois))
        .route(
            "/api/v1/checkins",
            post(checkins::create_checkin),
        )
        .route("/api/v1/checkins/{zone}", get(checkins::list_zone_checkins))
        .route(
            "/api/v1/checkins/{zone}/top",
            get(checkins::list_top_locations),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData {
                status: "ok",
                zones: state.zones.len(),
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}
