//! Transfer Core Types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::account::{Currency, ExchangeService, User, UserId, Wallet};

/// Transfer attempt identifier - ULID
///
/// Generated before dispatch. Doubles as the provider idempotency key and the
/// ledger primary key, so one attempt can never produce two rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(ulid::Ulid);

impl TransactionId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

impl Serialize for TransactionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

/// Parsed transfer request (caller identity already checked)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub sender: UserId,
    pub recipient: UserId,
    /// Provider label, lowercase
    pub sender_service: String,
    /// Provider label, lowercase
    pub recipient_service: String,
    /// Currency symbol, uppercase
    pub currency: String,
    pub amount: Decimal,
}

/// Everything the validator resolved, handed to dispatch and recording
/// so nothing is queried twice.
#[derive(Debug, Clone)]
pub struct ValidatedTransfer {
    pub sender: User,
    pub recipient: User,
    pub sender_service: ExchangeService,
    pub recipient_service: ExchangeService,
    pub sender_wallet: Wallet,
    pub recipient_wallet: Wallet,
    pub currency: String,
    pub amount: Decimal,
    /// Price record, if the currency is listed
    pub currency_info: Option<Currency>,
}

impl ValidatedTransfer {
    /// USD value at the listed price, `None` when no price is known
    pub fn amount_usd(&self) -> Option<Decimal> {
        let price = self.currency_info.as_ref()?.price_usd?;
        self.amount.checked_mul(price)
    }
}

/// Provider confirmation handed to the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub transaction_id: TransactionId,
    pub provider: String,
    pub provider_tx_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Settled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Settled => "settled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "settled" => Some(TransactionStatus::Settled),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable ledger row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TransactionRecord {
    #[schema(value_type = String, example = "01HV6Z2K6Y3D9G4Q8M7N5P1R2S")]
    pub transaction_id: TransactionId,
    #[schema(value_type = i64)]
    pub sender: UserId,
    /// Exchange service id of the sender
    pub sender_service: i64,
    #[schema(value_type = i64)]
    pub recipient: UserId,
    pub recipient_service: i64,
    #[schema(example = "BTC")]
    pub currency: String,
    #[schema(value_type = String, example = "0.5")]
    pub amount: Decimal,
    #[schema(value_type = Option<String>, example = "32500.00")]
    pub amount_usd: Option<Decimal>,
    pub status: TransactionStatus,
    #[schema(example = "coinbase")]
    pub provider: String,
    pub provider_tx_id: String,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn settled(transfer: &ValidatedTransfer, settlement: &Settlement) -> Self {
        Self {
            transaction_id: settlement.transaction_id,
            sender: transfer.sender.user_id,
            sender_service: transfer.sender_service.service_id,
            recipient: transfer.recipient.user_id,
            recipient_service: transfer.recipient_service.service_id,
            currency: transfer.currency.clone(),
            amount: transfer.amount,
            amount_usd: transfer.amount_usd(),
            status: TransactionStatus::Settled,
            provider: settlement.provider.clone(),
            provider_tx_id: settlement.provider_tx_id.clone(),
            created_at: Utc::now(),
        }
    }
}

/// A user's ledger view, each list newest first
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct TransactionHistory {
    pub transactions_sent: Vec<TransactionRecord>,
    pub transactions_received: Vec<TransactionRecord>,
}
