//! Transfer Validator
//!
//! Read-only, fail-fast. Checks run in a fixed order and the first failure
//! wins:
//!
//! sender exists → recipient exists → sender service/wallet → sender
//! balance ≥ amount → recipient service/wallet
//!
//! The wallet balance is the last known custodial balance, so passing here
//! is an optimistic pre-check only; the provider decides at withdraw time.

use std::sync::Arc;

use super::api::MAX_AMOUNT_SCALE;
use super::error::{Party, TransferError, ValidationError};
use super::types::{TransferRequest, ValidatedTransfer};
use crate::account::{AccountDirectory, ExchangeService, User, Wallet};

pub struct TransferValidator {
    directory: Arc<dyn AccountDirectory>,
}

impl TransferValidator {
    pub fn new(directory: Arc<dyn AccountDirectory>) -> Self {
        Self { directory }
    }

    pub async fn validate(&self, req: &TransferRequest) -> Result<ValidatedTransfer, TransferError> {
        // Re-checked here so internal callers cannot skip the API layer's parsing
        if req.amount <= rust_decimal::Decimal::ZERO
            || req.amount.normalize().scale() > MAX_AMOUNT_SCALE
        {
            return Err(ValidationError::InvalidAmount.into());
        }
        if req.sender == req.recipient {
            return Err(ValidationError::SameParty.into());
        }

        let sender = self
            .directory
            .find_user_by_id(req.sender)
            .await?
            .ok_or(ValidationError::NotFound(Party::Sender))?;
        let recipient = self
            .directory
            .find_user_by_id(req.recipient)
            .await?
            .ok_or(ValidationError::NotFound(Party::Recipient))?;

        let (sender_service, sender_wallet) = self
            .resolve_wallet(Party::Sender, &sender, &req.sender_service, &req.currency)
            .await?;
        if sender_wallet.balance < req.amount {
            return Err(ValidationError::InsufficientBalance.into());
        }

        let (recipient_service, recipient_wallet) = self
            .resolve_wallet(
                Party::Recipient,
                &recipient,
                &req.recipient_service,
                &req.currency,
            )
            .await?;

        let currency_info = self.directory.find_currency_by_symbol(&req.currency).await?;

        Ok(ValidatedTransfer {
            sender,
            recipient,
            sender_service,
            recipient_service,
            sender_wallet,
            recipient_wallet,
            currency: req.currency.clone(),
            amount: req.amount,
            currency_info,
        })
    }

    /// user → service (by label) → wallet (by currency), plus the disabled flag
    async fn resolve_wallet(
        &self,
        party: Party,
        user: &User,
        label: &str,
        currency: &str,
    ) -> Result<(ExchangeService, Wallet), TransferError> {
        let service_not_configured = || ValidationError::ServiceNotConfigured {
            party,
            service: label.to_string(),
        };
        let wallet_not_configured = || ValidationError::WalletNotConfigured {
            party,
            currency: currency.to_string(),
        };

        let service_id = user.service_id(label).ok_or_else(service_not_configured)?;
        let service = self
            .directory
            .find_exchange_service_by_id(service_id)
            .await?
            .filter(|s| s.user_id == user.user_id)
            .ok_or_else(service_not_configured)?;

        let wallet_id = service.wallet_id(currency).ok_or_else(wallet_not_configured)?;
        let wallet = self
            .directory
            .find_wallet_by_id(wallet_id)
            .await?
            .ok_or_else(wallet_not_configured)?;

        if wallet.disabled {
            return Err(ValidationError::WalletDisabled {
                party,
                currency: currency.to_string(),
            }
            .into());
        }

        Ok((service, wallet))
    }
}
