//! Provider Adapters
//!
//! Uniform `withdraw` capability over external custodial exchanges. Each
//! variant owns its wire protocol and credential handling; callers select a
//! variant once through [`ProviderRegistry`] and never branch on provider
//! identity afterwards.
//!
//! # Outcome classification
//!
//! - `Accepted`: the provider confirmed the withdrawal and returned its id
//! - `Rejected`: explicit decline; nothing moved
//! - `Unavailable`: transport failure, timeout or server error; the outcome
//!   is unknown and MUST NOT be treated as success or failure

pub mod binance;
pub mod coinbase;
pub mod registry;
pub mod signing;

pub use binance::BinanceAdapter;
pub use coinbase::CoinbaseAdapter;
pub use registry::{ProviderError, ProviderFactory, ProviderRegistry};

use async_trait::async_trait;
use rust_decimal::Decimal;

/// Result of a single provider withdraw call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawOutcome {
    /// Provider accepted the withdrawal
    Accepted { provider_tx_id: String },
    /// Provider explicitly declined (safe: no funds moved)
    Rejected(String),
    /// Outcome unknown (timeout, network, 5xx)
    Unavailable(String),
}

impl WithdrawOutcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, WithdrawOutcome::Accepted { .. })
    }

    pub fn provider_transaction_id(&self) -> Option<&str> {
        match self {
            WithdrawOutcome::Accepted { provider_tx_id } => Some(provider_tx_id),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            WithdrawOutcome::Accepted { .. } => None,
            WithdrawOutcome::Rejected(msg) | WithdrawOutcome::Unavailable(msg) => Some(msg),
        }
    }
}

/// Withdraw capability of one external provider, bound to one user's credentials.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider label for logging
    fn name(&self) -> &'static str;

    /// Send `amount` of `asset` to `destination`.
    ///
    /// `client_ref` is forwarded as the provider's idempotency key where the
    /// provider supports one. This call is externally irreversible: callers
    /// invoke it at most once per transfer attempt.
    async fn withdraw(
        &self,
        client_ref: &str,
        asset: &str,
        amount: Decimal,
        destination: &str,
    ) -> WithdrawOutcome;
}


#[cfg(test)]
pub use mock::MockAdapter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_views() {
        let accepted = WithdrawOutcome::Accepted {
            provider_tx_id: "abc".into(),
        };
        assert!(accepted.is_success());
        assert_eq!(accepted.provider_transaction_id(), Some("abc"));
        assert_eq!(accepted.message(), None);

        let unavailable = WithdrawOutcome::Unavailable("timeout".into());
        assert!(!unavailable.is_success());
        assert_eq!(unavailable.provider_transaction_id(), None);
        assert_eq!(unavailable.message(), Some("timeout"));
    }
}
