//! Cha Ching - cross-exchange transfer backend
//!
//! Moves funds between users whose money sits on custodial exchanges
//! (Binance, Coinbase) and keeps an immutable record of every settled
//! transfer.
//!
//! # Modules
//!
//! - [`account`] - Users, exchange-service bindings, wallets, prices
//! - [`provider`] - Withdraw adapters per exchange, selected by label
//! - [`transfer`] - Validation, the transfer FSM, ledger and journal
//! - [`user_auth`] - Bearer token verification
//! - [`gateway`] - HTTP routes, response envelope, OpenAPI
//! - [`config`] / [`logging`] / [`db`] - Process plumbing

pub mod account;
pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod provider;
pub mod transfer;
pub mod user_auth;

// Convenient re-exports at crate root
pub use account::{AccountDirectory, InMemoryAccountDirectory, PgAccountDirectory, UserId};
pub use config::AppConfig;
pub use provider::{ProviderAdapter, ProviderRegistry, WithdrawOutcome};
pub use transfer::{
    LedgerRecorder, TransactionId, TransferCoordinator, TransferError, TransferOutcome,
    TransferRequest, TransferState,
};
