//! API Response types and error kinds
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `ApiError`: structured error (HTTP status + stable kind + message)
//! - `RequestContext`: per-request values threaded through handlers

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::transfer::TransferError;

pub const API_VERSION: &str = "1.0";

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ============================================================================
// Request Context
// ============================================================================

/// Inserted into request extensions by the outermost middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    /// Arrival time, unix milliseconds
    pub received_ms: i64,
}

impl RequestContext {
    pub fn now() -> Self {
        Self {
            received_ms: now_ms(),
        }
    }
}

// ============================================================================
// Unified API Response Format
// ============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResponseMeta {
    #[schema(example = "1.0")]
    pub version: &'static str,
    /// Request arrival, unix ms
    #[schema(example = 1703494800000_i64)]
    pub received: i64,
    /// Response creation, unix ms
    #[schema(example = 1703494800042_i64)]
    pub executed: i64,
}

impl ResponseMeta {
    pub fn for_request(ctx: &RequestContext) -> Self {
        Self {
            version: API_VERSION,
            received: ctx.received_ms,
            executed: now_ms(),
        }
    }
}

/// Unified API response wrapper
///
/// - code: 0 = success, otherwise the HTTP status
/// - msg: short message description
/// - error: stable error kind (errors only)
/// - data: payload
/// - meta: version and request timing
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = 0)]
    pub code: i32,
    #[schema(example = "ok")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "INSUFFICIENT_BALANCE")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub meta: ResponseMeta,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T, ctx: &RequestContext) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            error: None,
            data: Some(data),
            meta: ResponseMeta::for_request(ctx),
        }
    }
}

/// Success response with an explicit status
pub fn ok<T: Serialize>(ctx: &RequestContext, status: StatusCode, data: T) -> Response {
    (status, Json(ApiResponse::success(data, ctx))).into_response()
}

// ============================================================================
// Errors
// ============================================================================

/// Error kinds owned by the HTTP layer (transfer kinds come from `TransferError::code`)
pub mod error_kinds {
    pub const MISSING_AUTH: &str = "MISSING_AUTH";
    pub const AUTH_FAILED: &str = "AUTH_FAILED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const INVALID_BODY: &str = "INVALID_BODY";
    pub const AMBIGUOUS_OUTCOME: &str = "AMBIGUOUS_OUTCOME";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub msg: String,
    pub data: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            msg: msg.into(),
            data: None,
        }
    }

    pub fn forbidden() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            error_kinds::FORBIDDEN,
            "User ID mismatch - forbidden",
        )
    }

    pub fn with_data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_value(data).ok();
        self
    }

    pub fn respond(self, ctx: &RequestContext) -> Response {
        let body = ApiResponse {
            code: i32::from(self.status.as_u16()),
            msg: self.msg,
            error: Some(self.kind.to_string()),
            data: self.data,
            meta: ResponseMeta::for_request(ctx),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        // Backend details stay in the logs
        let msg = match &e {
            TransferError::Directory(_) => "Account directory unavailable, please try again".to_string(),
            TransferError::Ledger(_) => "Transaction history unavailable, please try again".to_string(),
            other => other.to_string(),
        };
        Self::new(status, e.code(), msg)
    }
}
