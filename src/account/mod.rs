//! Account Directory
//!
//! Resolves users, exchange-service bindings, wallets and currency prices.
//! Read-only from the transfer path; records are created by signup and
//! provider-linking flows elsewhere.

pub mod directory;
pub mod memory;
pub mod models;
pub mod repository;

pub use directory::{AccountDirectory, DirectoryError};
pub use memory::InMemoryAccountDirectory;
pub use models::{
    Currency, ExchangeService, ExchangeServiceId, ProviderCredentials, User, UserId, Wallet,
    WalletId,
};
pub use repository::PgAccountDirectory;
