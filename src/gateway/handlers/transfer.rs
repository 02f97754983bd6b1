//! Transaction handlers: cross-exchange transfer and history

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};

use super::super::state::AppState;
use super::super::types::{ApiError, RequestContext, error_kinds, ok};
use crate::account::UserId;
use crate::transfer::api::AmbiguousTransferData;
use crate::transfer::{
    TransferApiRequest, TransferApiResponse, TransferError, TransferOutcome,
    parse_transfer_request,
};
use crate::user_auth::CallerIdentity;

/// `:user_id` must name the verified caller
fn authorize_path(user_id: &str, caller: &CallerIdentity) -> Result<UserId, ApiError> {
    match user_id.parse::<UserId>() {
        Ok(id) if id == caller.user_id => Ok(id),
        _ => Err(ApiError::forbidden()),
    }
}

/// Map a terminal transfer outcome to the HTTP answer
pub(crate) fn outcome_response(outcome: TransferOutcome, ctx: &RequestContext) -> Response {
    match outcome {
        TransferOutcome::Settled {
            transaction_id,
            provider_tx_id,
            recording_warning,
        } => ok(
            ctx,
            StatusCode::CREATED,
            TransferApiResponse {
                success: true,
                transaction_id,
                provider_tx_id,
                recording_warning,
            },
        ),
        TransferOutcome::Rejected(e) => ApiError::from(e).respond(ctx),
        TransferOutcome::Ambiguous {
            transaction_id,
            provider,
            ..
        } => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_kinds::AMBIGUOUS_OUTCOME,
            "Transfer outcome is unknown and has been flagged for reconciliation; do not retry",
        )
        .with_data(AmbiguousTransferData {
            transaction_id,
            provider,
        })
        .respond(ctx),
    }
}

/// Transfer funds to another user through the sender's exchange
///
/// POST /transaction/transfer/{user_id}
#[utoipa::path(
    post,
    path = "/transaction/transfer/{user_id}",
    params(("user_id" = i64, Path, description = "Caller's user id")),
    request_body = TransferApiRequest,
    responses(
        (status = 201, description = "Transfer settled", body = TransferApiResponse, content_type = "application/json"),
        (status = 400, description = "Malformed JSON body"),
        (status = 401, description = "Authentication failed"),
        (status = 403, description = "Path user or sender is not the caller"),
        (status = 422, description = "Validation failure or provider rejection"),
        (status = 500, description = "Outcome unknown (AMBIGUOUS_OUTCOME)"),
        (status = 503, description = "Account directory unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Transaction"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(caller): Extension<CallerIdentity>,
    Path(user_id): Path<String>,
    body: Result<Json<TransferApiRequest>, JsonRejection>,
) -> Response {
    // 1. Path user must be the caller
    if let Err(e) = authorize_path(&user_id, &caller) {
        return e.respond(&ctx);
    }

    // 2. Parse and shape-check the body
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return ApiError::new(
                StatusCode::BAD_REQUEST,
                error_kinds::INVALID_BODY,
                rejection.body_text(),
            )
            .respond(&ctx);
        }
    };
    let req = match parse_transfer_request(&body) {
        Ok(req) => req,
        Err(e) => return ApiError::from(TransferError::from(e)).respond(&ctx),
    };

    // 3. Callers only move their own funds
    if req.sender != caller.user_id {
        return ApiError::forbidden().respond(&ctx);
    }

    // 4. Run the FSM
    let outcome = state.coordinator.execute(req).await;
    outcome_response(outcome, &ctx)
}

/// Transfers sent and received by the caller, newest first
///
/// GET /transaction/history/{user_id}
#[utoipa::path(
    get,
    path = "/transaction/history/{user_id}",
    params(("user_id" = i64, Path, description = "Caller's user id")),
    responses(
        (status = 200, description = "Transaction history", body = crate::transfer::TransactionHistory, content_type = "application/json"),
        (status = 401, description = "Authentication failed"),
        (status = 403, description = "Path user is not the caller"),
        (status = 422, description = "User does not exist"),
        (status = 500, description = "Ledger unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Transaction"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(caller): Extension<CallerIdentity>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = match authorize_path(&user_id, &caller) {
        Ok(id) => id,
        Err(e) => return e.respond(&ctx),
    };

    match state.coordinator.history(user_id).await {
        Ok(history) => ok(&ctx, StatusCode::OK, history),
        Err(e) => {
            tracing::error!(user_id = user_id, "History lookup failed: {}", e);
            ApiError::from(e).respond(&ctx)
        }
    }
}
