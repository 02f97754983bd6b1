use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::gateway::{
    state::AppState,
    types::{ApiError, RequestContext, error_kinds},
};

/// Bearer-token auth. On success the verified `CallerIdentity` is inserted
/// into the request extensions; handlers trust it without re-verifying.
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .copied()
        .unwrap_or_else(RequestContext::now);

    // 1. Extract Authorization header
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::UNAUTHORIZED,
                error_kinds::MISSING_AUTH,
                "Missing Authorization header",
            )
            .respond(&ctx)
        })?
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::UNAUTHORIZED,
                error_kinds::AUTH_FAILED,
                "Invalid token format",
            )
            .respond(&ctx)
        })?;

    // 2. Verify Token
    match state.token_verifier.verify_token(token) {
        Ok(caller) => {
            // 3. Inject caller identity
            request.extensions_mut().insert(caller);
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::debug!("Token rejected: {}", e);
            Err(ApiError::new(
                StatusCode::UNAUTHORIZED,
                error_kinds::AUTH_FAILED,
                "Invalid or expired token",
            )
            .respond(&ctx))
        }
    }
}
