//! In-memory Account Directory
//!
//! Backs development mode (no `postgres_url`) and the orchestrator tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock};

use super::directory::{AccountDirectory, DirectoryError};
use super::models::{
    Currency, ExchangeService, ExchangeServiceId, ProviderCredentials, User, UserId, Wallet,
    WalletId,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    services: HashMap<ExchangeServiceId, ExchangeService>,
    wallets: HashMap<WalletId, Wallet>,
    currencies: HashMap<String, Currency>,
}

pub struct InMemoryAccountDirectory {
    tables: RwLock<Tables>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
}

impl Default for InMemoryAccountDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicI64::new(1),
            unavailable: AtomicBool::new(false),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn add_user(&self, username: &str) -> UserId {
        let user_id = self.next_id();
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.users.insert(
            user_id,
            User {
                user_id,
                username: username.to_string(),
                services: BTreeMap::new(),
            },
        );
        user_id
    }

    /// Bind a provider to a user. Returns `None` if the user does not exist.
    pub fn add_service(
        &self,
        user_id: UserId,
        label: &str,
        credentials: ProviderCredentials,
    ) -> Option<ExchangeServiceId> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let service_id = self.next_id();
        tables
            .users
            .get_mut(&user_id)?
            .services
            .insert(label.to_string(), service_id);
        tables.services.insert(
            service_id,
            ExchangeService {
                service_id,
                user_id,
                label: label.to_string(),
                credentials,
                wallets: BTreeMap::new(),
            },
        );
        Some(service_id)
    }

    /// Attach a wallet to a service. Returns `None` if the service does not exist.
    pub fn add_wallet(
        &self,
        service_id: ExchangeServiceId,
        symbol: &str,
        address: &str,
        balance: Decimal,
    ) -> Option<WalletId> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let wallet_id = self.next_id();
        let service = tables.services.get_mut(&service_id)?;
        service.wallets.insert(symbol.to_string(), wallet_id);
        let user_id = service.user_id;
        tables.wallets.insert(
            wallet_id,
            Wallet {
                wallet_id,
                user_id,
                service_id,
                label: format!("{} wallet", symbol),
                address: address.to_string(),
                balance,
                symbol: symbol.to_string(),
                disabled: false,
            },
        );
        Some(wallet_id)
    }

    pub fn set_wallet_disabled(&self, wallet_id: WalletId, disabled: bool) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(wallet) = tables.wallets.get_mut(&wallet_id) {
            wallet.disabled = disabled;
        }
    }

    /// Map `label` on a user to an existing service record, whoever owns it
    pub fn link_service(&self, user_id: UserId, label: &str, service_id: ExchangeServiceId) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(user) = tables.users.get_mut(&user_id) {
            user.services.insert(label.to_string(), service_id);
        }
    }

    /// Drop the wallet record while leaving the service's mapping in place
    pub fn remove_wallet_record(&self, wallet_id: WalletId) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.wallets.remove(&wallet_id);
    }

    pub fn set_currency(&self, symbol: &str, label: &str, price_usd: Option<Decimal>) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.currencies.insert(
            symbol.to_string(),
            Currency {
                symbol: symbol.to_string(),
                label: label.to_string(),
                price_usd,
            },
        );
    }

    /// Simulate a backend outage: every lookup fails with `DirectoryError::Backend`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), DirectoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DirectoryError::Backend("in-memory directory offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find_user_by_id(&self, user_id: UserId) -> Result<Option<User>, DirectoryError> {
        self.check_available()?;
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.users.get(&user_id).cloned())
    }

    async fn find_exchange_service_by_id(
        &self,
        service_id: ExchangeServiceId,
    ) -> Result<Option<ExchangeService>, DirectoryError> {
        self.check_available()?;
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.services.get(&service_id).cloned())
    }

    async fn find_wallet_by_id(
        &self,
        wallet_id: WalletId,
    ) -> Result<Option<Wallet>, DirectoryError> {
        self.check_available()?;
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.wallets.get(&wallet_id).cloned())
    }

    async fn find_currency_by_symbol(
        &self,
        symbol: &str,
    ) -> Result<Option<Currency>, DirectoryError> {
        self.check_available()?;
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.currencies.get(symbol).cloned())
    }
}
