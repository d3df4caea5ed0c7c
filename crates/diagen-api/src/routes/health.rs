use std::collections::HashMap;
use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{error::ApiResult, models::HealthResponse, state::AppState};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let mut services = HashMap::new();

    // Listing an unknown owner is a cheap round trip to the backend
    let storage = match state.documents.list_documents("_health_check").await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            "disconnected"
        }
    };
    services.insert(
        "storage".to_string(),
        format!("{:?}: {}", state.config.storage.backend, storage).to_lowercase(),
    );
    services.insert(
        "sessions".to_string(),
        state.relay.sessions().len().await.to_string(),
    );

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    }))
}
