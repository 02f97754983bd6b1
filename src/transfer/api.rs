//! Transfer API Layer
//!
//! Wire DTOs and request-shape parsing. Shape checks (presence, numeric
//! amount, distinct parties) run here, before any directory lookup.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

use super::error::{Party, ValidationError};
use super::types::{TransactionId, TransferRequest};
use crate::account::UserId;

// ============================================================================
// API Request/Response Types
// ============================================================================

/// JSON scalar accepted for ids and amounts: `5`, `"5"`, `0.25` or `"0.25"`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    fn text(&self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.trim().to_string(),
        }
    }
}

/// Body of `POST /transaction/transfer/{user_id}`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TransferApiRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "1")]
    pub sender: Option<Scalar>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "2")]
    pub recipient: Option<Scalar>,
    /// Sender's provider label, e.g. "binance"
    #[serde(default)]
    #[schema(example = "binance")]
    pub sender_service: Option<String>,
    #[serde(default)]
    #[schema(example = "coinbase")]
    pub recipient_service: Option<String>,
    #[serde(default)]
    #[schema(example = "BTC")]
    pub currency: Option<String>,
    /// Decimal amount, number or string
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "0.5")]
    pub amount: Option<Scalar>,
}

/// Settled transfer
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferApiResponse {
    pub success: bool,
    #[serde(rename = "transactionId")]
    #[schema(value_type = String)]
    pub transaction_id: TransactionId,
    pub provider_tx_id: String,
    /// Present when the ledger write failed after settlement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_warning: Option<String>,
}

/// Attached to the error response of an ambiguous transfer
#[derive(Debug, Serialize, ToSchema)]
pub struct AmbiguousTransferData {
    #[serde(rename = "transactionId")]
    #[schema(value_type = String)]
    pub transaction_id: TransactionId,
    pub provider: String,
}

// ============================================================================
// Parsing
// ============================================================================

fn present_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn present_scalar(value: &Option<Scalar>) -> Option<String> {
    value.as_ref().map(Scalar::text).filter(|s| !s.is_empty())
}

/// Decimal places the ledger's `NUMERIC(38, 18)` columns hold exactly
pub const MAX_AMOUNT_SCALE: u32 = 18;

/// Parse amount: plain or scientific decimal notation, strictly positive,
/// at most [`MAX_AMOUNT_SCALE`] significant decimal places
pub fn parse_amount(s: &str) -> Result<Decimal, ValidationError> {
    let amount = Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|_| ValidationError::InvalidAmount)?
        .normalize();
    if amount <= Decimal::ZERO || amount.scale() > MAX_AMOUNT_SCALE {
        return Err(ValidationError::InvalidAmount);
    }
    Ok(amount)
}

fn parse_user_id(s: &str, party: Party) -> Result<UserId, ValidationError> {
    // An id that cannot be parsed cannot name an existing user
    s.parse::<UserId>().map_err(|_| ValidationError::NotFound(party))
}

/// Shape-check the body and normalize labels (lowercase) and currency (uppercase)
pub fn parse_transfer_request(body: &TransferApiRequest) -> Result<TransferRequest, ValidationError> {
    let sender = present_scalar(&body.sender);
    let recipient = present_scalar(&body.recipient);
    let sender_service = present_text(&body.sender_service);
    let recipient_service = present_text(&body.recipient_service);
    let currency = present_text(&body.currency);
    let amount = present_scalar(&body.amount);

    let missing: Vec<String> = [
        ("sender", sender.is_none()),
        ("recipient", recipient.is_none()),
        ("sender_service", sender_service.is_none()),
        ("recipient_service", recipient_service.is_none()),
        ("currency", currency.is_none()),
        ("amount", amount.is_none()),
    ]
    .into_iter()
    .filter(|(_, absent)| *absent)
    .map(|(name, _)| name.to_string())
    .collect();

    let (
        Some(sender),
        Some(recipient),
        Some(sender_service),
        Some(recipient_service),
        Some(currency),
        Some(amount),
    ) = (sender, recipient, sender_service, recipient_service, currency, amount)
    else {
        return Err(ValidationError::MissingFields(missing));
    };

    let amount = parse_amount(&amount)?;
    let sender = parse_user_id(&sender, Party::Sender)?;
    let recipient = parse_user_id(&recipient, Party::Recipient)?;
    if sender == recipient {
        return Err(ValidationError::SameParty);
    }

    Ok(TransferRequest {
        sender,
        recipient,
        sender_service: sender_service.to_ascii_lowercase(),
        recipient_service: recipient_service.to_ascii_lowercase(),
        currency: currency.to_ascii_uppercase(),
        amount,
    })
}
