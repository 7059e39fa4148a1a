//! Local HTTP proxy in front of the prediction and generative-text services.
//!
//! Metrics and projections always answer 200: upstream failures come back as
//! tagged placeholder records. Only `/api/policies` can fail, with a 500 and a
//! JSON error body.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domain::{Coordinate, MetricsReading, PolicyList, ProjectionSeries};
use crate::error::{AppError, FetchError};
use crate::fetch::FetchOrchestrator;
use crate::policy::PolicyAdvisor;

/// Body of a failed `/api/policies` call.
pub const POLICY_FAILURE_MESSAGE: &str = "Failed to generate policies.";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<FetchOrchestrator>,
    pub advisor: Arc<PolicyAdvisor>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/metrics", get(get_metrics))
        .route("/api/projections", get(get_projections))
        .route("/api/policies", get(get_policies))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind `port` on all interfaces and serve until the process is stopped.
pub async fn serve(state: AppState, port: u16) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::new(4, format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("server listening on http://{addr}");

    axum::serve(listener, create_router(state))
        .await
        .map_err(|e| AppError::new(4, format!("Server error: {e}")))
}

/// Query strings are taken raw so that a malformed value degrades to
/// "no coordinate" instead of a 400.
#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    lat: Option<String>,
    lng: Option<String>,
}

impl LocationQuery {
    pub fn coordinate(&self) -> Option<Coordinate> {
        let lat = self.lat.as_deref()?.trim().parse::<f64>().ok()?;
        let lng = self.lng.as_deref()?.trim().parse::<f64>().ok()?;
        match Coordinate::new(lat, lng) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::debug!("ignoring query coordinate: {e}");
                None
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PolicyQuery {
    co2_level: Option<String>,
}

impl PolicyQuery {
    pub fn co2_level(&self) -> Option<f64> {
        self.co2_level.as_deref()?.trim().parse::<f64>().ok()
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn get_metrics(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Json<MetricsReading> {
    Json(state.orchestrator.metrics_for(query.coordinate()).await)
}

async fn get_projections(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Json<ProjectionSeries> {
    Json(state.orchestrator.projections_for(query.coordinate()).await)
}

async fn get_policies(
    State(state): State<AppState>,
    Query(query): Query<PolicyQuery>,
) -> Result<Json<PolicyList>, ApiError> {
    let policies = state.advisor.recommend(query.co2_level()).await?;
    Ok(Json(policies))
}

#[derive(Debug)]
pub struct ApiError(FetchError);

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self.0 {
            FetchError::NoSelection => (StatusCode::BAD_REQUEST, self.0.to_string()),
            FetchError::Network(_) => (StatusCode::BAD_GATEWAY, self.0.to_string()),
            FetchError::PolicyGeneration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                POLICY_FAILURE_MESSAGE.to_string(),
            ),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
