//! HTTP request handlers for the elevation service.
//!
//! Lookups may open, fetch or unpack tiles, so they run on the blocking
//! thread pool.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geoel::{Axis, GeoCoord, ParseError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;

/// Zoom used when a request does not name one.
pub const DEFAULT_ZOOM: u32 = 12;

fn default_zoom() -> u32 {
    DEFAULT_ZOOM
}

/// Query parameters for the elevation endpoint.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ElevationQuery {
    /// Latitude, e.g. `47:30:00 N`, `47°30'N` or `47.5`. A bare integer of
    /// three or more digits reads as degrees and minutes.
    pub lat: String,
    /// Longitude, e.g. `008:15:00 E`, `8°15'E` or `8.25`. Write 120° as
    /// `120.0`, since `120` reads as 1°20'.
    pub lon: String,
    /// Zoom level selecting the preferred dataset (default 12).
    #[serde(default = "default_zoom")]
    pub zoom: u32,
}

/// Successful elevation response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ElevationResponse {
    /// Elevation in whole metres.
    pub elevation: f32,
    /// Latitude in canonical `DD:MM:SS H` form.
    pub lat: String,
    /// Longitude in canonical `DDD:MM:SS H` form.
    pub lon: String,
    pub zoom: u32,
    /// Dataset preferred for this zoom. Coarser data may have answered.
    pub dataset: String,
}

/// One point of a batch request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct Point {
    pub lat: String,
    pub lon: String,
}

/// Batch elevation request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchRequest {
    pub points: Vec<Point>,
    #[serde(default = "default_zoom")]
    pub zoom: u32,
}

/// Batch elevation response, one entry per requested point.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchResponse {
    /// Elevation in whole metres, `null` where no dataset had data.
    pub elevations: Vec<Option<f32>>,
    pub zoom: u32,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Cache statistics for one dataset.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatasetStats {
    pub dataset: String,
    /// Number of tiles in cache, including ones marked unavailable.
    pub cached_tiles: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
    /// Maximum cached tiles, `null` when unbounded.
    pub capacity: Option<u64>,
}

/// Cache statistics response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub datasets: Vec<DatasetStats>,
    pub srtm1_enabled: bool,
}

fn parse_point(lat: &str, lon: &str) -> Result<(GeoCoord, GeoCoord), ParseError> {
    Ok((
        GeoCoord::parse(Axis::Latitude, lat)?,
        GeoCoord::parse(Axis::Longitude, lon)?,
    ))
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Get elevation for one coordinate.
#[utoipa::path(
    get,
    path = "/elevation",
    tag = "elevation",
    params(ElevationQuery),
    responses(
        (status = 200, description = "Elevation found", body = ElevationResponse),
        (status = 400, description = "Malformed coordinate", body = ErrorResponse),
        (status = 404, description = "No dataset has data here", body = ErrorResponse),
    )
)]
pub async fn get_elevation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ElevationQuery>,
) -> Response {
    tracing::debug!(lat = %query.lat, lon = %query.lon, zoom = query.zoom, "Elevation query");

    let (lat, lon) = match parse_point(&query.lat, &query.lon) {
        Ok(point) => point,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let zoom = query.zoom;
    let lookup = {
        let state = Arc::clone(&state);
        tokio::task::spawn_blocking(move || state.layer.elevation(&lat, &lon, zoom))
    };
    let elevation = match lookup.await {
        Ok(elevation) => elevation,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    match elevation {
        Some(metres) => {
            tracing::info!(%lat, %lon, zoom, elevation = metres, "Elevation found");
            Json(ElevationResponse {
                elevation: metres.floor(),
                lat: lat.to_string(),
                lon: lon.to_string(),
                zoom,
                dataset: state.layer.dataset_for_zoom(zoom).name().to_string(),
            })
            .into_response()
        }
        None => {
            tracing::warn!(%lat, %lon, zoom, "No elevation data");
            error_response(
                StatusCode::NOT_FOUND,
                format!("no elevation data at {lat}, {lon}"),
            )
        }
    }
}

/// Get elevations for many coordinates.
#[utoipa::path(
    post,
    path = "/elevation",
    tag = "elevation",
    request_body = BatchRequest,
    responses(
        (status = 200, description = "One elevation per point", body = BatchResponse),
        (status = 400, description = "Malformed coordinate", body = ErrorResponse),
    )
)]
pub async fn post_elevation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Response {
    let mut points = Vec::with_capacity(request.points.len());
    for (index, point) in request.points.iter().enumerate() {
        match parse_point(&point.lat, &point.lon) {
            Ok(parsed) => points.push(parsed),
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, format!("point {index}: {e}"))
            }
        }
    }

    let zoom = request.zoom;
    let count = points.len();
    let lookup = tokio::task::spawn_blocking(move || {
        points
            .iter()
            .map(|(lat, lon)| state.layer.elevation(lat, lon, zoom).map(f32::floor))
            .collect::<Vec<_>>()
    });

    match lookup.await {
        Ok(elevations) => {
            tracing::info!(points = count, zoom, "Batch elevation query");
            Json(BatchResponse { elevations, zoom }).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Tile cache statistics per dataset.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "system",
    responses((status = 200, description = "Cache statistics", body = StatsResponse))
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let datasets = state
        .layer
        .cache_stats()
        .into_iter()
        .map(|(dataset, stats)| DatasetStats {
            dataset: dataset.name().to_string(),
            cached_tiles: stats.entry_count,
            cache_hits: stats.hit_count,
            cache_misses: stats.miss_count,
            hit_rate: stats.hit_rate(),
            capacity: stats.capacity,
        })
        .collect();

    Json(StatsResponse {
        datasets,
        srtm1_enabled: state.layer.srtm1_enabled(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevation_query_defaults_zoom() {
        let json = r#"{"lat": "47:30:00 N", "lon": "8.25"}"#;
        let query: ElevationQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.lat, "47:30:00 N");
        assert_eq!(query.zoom, DEFAULT_ZOOM);
    }

    #[test]
    fn test_parse_point() {
        let (lat, lon) = parse_point("47:30:00 N", "8.25").unwrap();
        assert_eq!(lat.to_string(), "47:30:00 N");
        assert_eq!(lon.to_string(), "008:15:00 E");
        assert!(parse_point("somewhere", "8.25").is_err());
        assert!(parse_point("8:00:00 E", "8.25").is_err());
    }

    #[test]
    fn test_batch_response_serialize() {
        let response = BatchResponse {
            elevations: vec![Some(603.0), None],
            zoom: 3,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"elevations":[603.0,null],"zoom":3}"#);
    }
}
