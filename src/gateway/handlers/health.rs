//! Health check handler

use std::sync::Arc;

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiError, RequestContext, error_kinds, ok};

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_i64)]
    pub timestamp_ms: i64,
}

/// Health check endpoint
///
/// - Healthy: 200 OK + {code: 0, data: {timestamp_ms}}
/// - Unhealthy: 503 Service Unavailable (database configured but unreachable)
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
        (status = 503, description = "Service unavailable")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    if let Some(db) = &state.pg_db
        && let Err(e) = db.health_check().await
    {
        tracing::warn!("Health check failed: {}", e);
        return ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_kinds::SERVICE_UNAVAILABLE,
            "unavailable",
        )
        .respond(&ctx);
    }

    ok(
        &ctx,
        StatusCode::OK,
        HealthResponse {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        },
    )
}
