//! Account Directory - read-only lookup facade over users, services and wallets

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Currency, ExchangeService, ExchangeServiceId, User, UserId, Wallet, WalletId};

/// Transport/backend failure. "Not found" is `Ok(None)`, never an error.
#[derive(Error, Debug, Clone)]
pub enum DirectoryError {
    #[error("Directory backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for DirectoryError {
    fn from(e: sqlx::Error) -> Self {
        DirectoryError::Backend(e.to_string())
    }
}

#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_user_by_id(&self, user_id: UserId) -> Result<Option<User>, DirectoryError>;

    async fn find_exchange_service_by_id(
        &self,
        service_id: ExchangeServiceId,
    ) -> Result<Option<ExchangeService>, DirectoryError>;

    async fn find_wallet_by_id(&self, wallet_id: WalletId)
    -> Result<Option<Wallet>, DirectoryError>;

    async fn find_currency_by_symbol(
        &self,
        symbol: &str,
    ) -> Result<Option<Currency>, DirectoryError>;
}
