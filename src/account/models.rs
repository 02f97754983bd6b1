//! Data models for users, exchange services and wallets

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub type UserId = i64;
pub type ExchangeServiceId = i64;
pub type WalletId = i64;

/// User identity plus its provider bindings, keyed by provider label
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub services: BTreeMap<String, ExchangeServiceId>,
}

impl User {
    pub fn service_id(&self, label: &str) -> Option<ExchangeServiceId> {
        self.services.get(label).copied()
    }
}

/// Provider API credentials.
///
/// `Debug` is redacted and the type is not `Serialize`.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    api_key: String,
    api_secret: String,
}

impl ProviderCredentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .finish()
    }
}

/// One user's binding to a named external provider ("binance", "coinbase", ...)
#[derive(Debug, Clone)]
pub struct ExchangeService {
    pub service_id: ExchangeServiceId,
    pub user_id: UserId,
    pub label: String,
    pub credentials: ProviderCredentials,
    /// Currency symbol -> wallet
    pub wallets: BTreeMap<String, WalletId>,
}

impl ExchangeService {
    pub fn wallet_id(&self, symbol: &str) -> Option<WalletId> {
        self.wallets.get(symbol).copied()
    }
}

/// Last known custodial balance for one currency under one exchange service.
///
/// The balance is advisory: the provider is the source of truth.
#[derive(Debug, Clone, Serialize)]
pub struct Wallet {
    pub wallet_id: WalletId,
    pub user_id: UserId,
    pub service_id: ExchangeServiceId,
    pub label: String,
    pub address: String,
    pub balance: Decimal,
    pub symbol: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Currency {
    pub symbol: String,
    pub label: String,
    pub price_usd: Option<Decimal>,
}
