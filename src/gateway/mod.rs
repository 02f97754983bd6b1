//! HTTP gateway
//!
//! Routes:
//! - `GET  /api/v1/health`
//! - `POST /transaction/transfer/{user_id}` (bearer auth)
//! - `GET  /transaction/history/{user_id}` (bearer auth)
//! - `/docs` Swagger UI

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::{Next, from_fn, from_fn_with_state},
    response::Response,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::user_auth::jwt_auth_middleware;
use openapi::ApiDoc;
use state::AppState;
use types::RequestContext;

/// Stamp the arrival time before anything else runs
async fn request_context_middleware(mut request: Request<Body>, next: Next) -> Response {
    request.extensions_mut().insert(RequestContext::now());
    next.run(request).await
}

pub fn router(state: Arc<AppState>) -> Router {
    let transaction_routes = Router::new()
        .route("/transaction/transfer/{user_id}", post(handlers::create_transfer))
        .route("/transaction/history/{user_id}", get(handlers::get_history))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .merge(transaction_routes)
        .layer(from_fn(request_context_middleware))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}

pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> std::io::Result<()> {
    let app = router(state);
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("Swagger UI: http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
