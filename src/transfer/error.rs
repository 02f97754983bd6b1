//! Transfer Error Types
//!
//! `ValidationError` is client-fixable and raised before any side effect.
//! `TransferError` is everything the transfer endpoints can answer with.

use std::fmt;
use thiserror::Error;

use super::ledger::LedgerError;
use crate::account::DirectoryError;

/// Which side of the transfer a validation failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Sender,
    Recipient,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Sender => f.write_str("Sender"),
            Party::Recipient => f.write_str("Recipient"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Amount must be a number greater than zero with at most 18 decimal places")]
    InvalidAmount,

    #[error("Sender and recipient must be different users")]
    SameParty,

    #[error("{0} does not exist")]
    NotFound(Party),

    #[error("{party} does not have {service} service")]
    ServiceNotConfigured { party: Party, service: String },

    #[error("{party} does not have {currency} wallet")]
    WalletNotConfigured { party: Party, currency: String },

    #[error("{party} {currency} wallet is disabled")]
    WalletDisabled { party: Party, currency: String },

    #[error("Sender does not have enough balance")]
    InsufficientBalance,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingFields(_) => "MISSING_FIELDS",
            ValidationError::InvalidAmount => "INVALID_AMOUNT",
            ValidationError::SameParty => "SAME_PARTY",
            ValidationError::NotFound(_) => "NOT_FOUND",
            ValidationError::ServiceNotConfigured { .. } => "SERVICE_NOT_CONFIGURED",
            ValidationError::WalletNotConfigured { .. } => "WALLET_NOT_CONFIGURED",
            ValidationError::WalletDisabled { .. } => "WALLET_DISABLED",
            ValidationError::InsufficientBalance => "INSUFFICIENT_BALANCE",
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum TransferError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Account directory unavailable: {0}")]
    Directory(#[from] DirectoryError),

    #[error("No provider integration for service {0}")]
    UnsupportedProvider(String),

    /// Explicit provider decline. Carries the provider's message only.
    #[error("Provider rejected the transfer: {0}")]
    ProviderRejected(String),

    #[error("User not authenticated")]
    Unauthorized,

    #[error("User ID mismatch - forbidden")]
    Forbidden,

    #[error("User does not exist")]
    UserNotFound,

    #[error("Ledger unavailable: {0}")]
    Ledger(#[from] LedgerError),
}

impl TransferError {
    /// Stable error kind for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::Validation(e) => e.code(),
            TransferError::Directory(_) => "DIRECTORY_UNAVAILABLE",
            TransferError::UnsupportedProvider(_) => "UNSUPPORTED_PROVIDER",
            TransferError::ProviderRejected(_) => "PROVIDER_REJECTED",
            TransferError::Unauthorized => "UNAUTHORIZED",
            TransferError::Forbidden => "FORBIDDEN",
            TransferError::UserNotFound => "USER_NOT_FOUND",
            TransferError::Ledger(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::Unauthorized => 401,
            TransferError::Forbidden => 403,
            TransferError::Validation(_)
            | TransferError::UnsupportedProvider(_)
            | TransferError::ProviderRejected(_)
            | TransferError::UserNotFound => 422,
            TransferError::Ledger(_) => 500,
            TransferError::Directory(_) => 503,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err: TransferError = ValidationError::InsufficientBalance.into();
        assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
        assert_eq!(
            TransferError::ProviderRejected("no".into()).code(),
            "PROVIDER_REJECTED"
        );
        assert_eq!(
            TransferError::Directory(DirectoryError::Backend("down".into())).code(),
            "DIRECTORY_UNAVAILABLE"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(TransferError::Unauthorized.http_status(), 401);
        assert_eq!(TransferError::Forbidden.http_status(), 403);
        assert_eq!(
            TransferError::from(ValidationError::NotFound(Party::Recipient)).http_status(),
            422
        );
        assert_eq!(
            TransferError::UnsupportedProvider("kraken".into()).http_status(),
            422
        );
        assert_eq!(
            TransferError::Ledger(LedgerError::Persistence("x".into())).http_status(),
            500
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ValidationError::NotFound(Party::Sender).to_string(),
            "Sender does not exist"
        );
        assert_eq!(
            ValidationError::ServiceNotConfigured {
                party: Party::Recipient,
                service: "coinbase".into()
            }
            .to_string(),
            "Recipient does not have coinbase service"
        );
        assert_eq!(
            ValidationError::MissingFields(vec!["sender".into(), "amount".into()]).to_string(),
            "Missing required fields: sender, amount"
        );
        let wrapped: TransferError = ValidationError::InsufficientBalance.into();
        assert_eq!(wrapped.to_string(), "Sender does not have enough balance");
    }
}
