//! Provider registry: label -> adapter factory
//!
//! Adding a provider means registering a factory here; the transfer
//! coordinator only ever sees `Arc<dyn ProviderAdapter>`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::ProviderAdapter;
use super::binance::BinanceAdapter;
use super::coinbase::CoinbaseAdapter;
use crate::account::ProviderCredentials;
use crate::config::{BinanceConfig, CoinbaseConfig, ProvidersConfig};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Builds an adapter bound to one exchange service's credentials
pub trait ProviderFactory: Send + Sync {
    fn connect(&self, credentials: &ProviderCredentials) -> Arc<dyn ProviderAdapter>;
}

impl<F> ProviderFactory for F
where
    F: Fn(&ProviderCredentials) -> Arc<dyn ProviderAdapter> + Send + Sync,
{
    fn connect(&self, credentials: &ProviderCredentials) -> Arc<dyn ProviderAdapter> {
        self(credentials)
    }
}

struct BinanceFactory {
    http: reqwest::Client,
    config: BinanceConfig,
}

impl ProviderFactory for BinanceFactory {
    fn connect(&self, credentials: &ProviderCredentials) -> Arc<dyn ProviderAdapter> {
        Arc::new(BinanceAdapter::new(
            self.http.clone(),
            self.config.clone(),
            credentials.clone(),
        ))
    }
}

struct CoinbaseFactory {
    http: reqwest::Client,
    config: CoinbaseConfig,
}

impl ProviderFactory for CoinbaseFactory {
    fn connect(&self, credentials: &ProviderCredentials) -> Arc<dyn ProviderAdapter> {
        Arc::new(CoinbaseAdapter::new(
            self.http.clone(),
            self.config.clone(),
            credentials.clone(),
        ))
    }
}

#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the Binance and Coinbase variants sharing one HTTP client.
    ///
    /// `timeout` bounds each HTTP request; the coordinator applies its own
    /// deadline around the whole withdraw call as well.
    pub fn from_config(config: &ProvidersConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::HttpClient(e.to_string()))?;

        let mut registry = Self::new();
        registry.register(
            BinanceAdapter::LABEL,
            BinanceFactory {
                http: http.clone(),
                config: config.binance.clone(),
            },
        );
        registry.register(
            CoinbaseAdapter::LABEL,
            CoinbaseFactory {
                http,
                config: config.coinbase.clone(),
            },
        );
        Ok(registry)
    }

    pub fn register(&mut self, label: &str, factory: impl ProviderFactory + 'static) {
        self.factories
            .insert(label.to_ascii_lowercase(), Arc::new(factory));
    }

    pub fn supports(&self, label: &str) -> bool {
        self.factories.contains_key(&label.to_ascii_lowercase())
    }

    /// Adapter for `label` bound to `credentials`, or `None` for unknown providers
    pub fn adapter_for(
        &self,
        label: &str,
        credentials: &ProviderCredentials,
    ) -> Option<Arc<dyn ProviderAdapter>> {
        self.factories
            .get(&label.to_ascii_lowercase())
            .map(|factory| factory.connect(credentials))
    }

    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.factories.keys().cloned().collect();
        labels.sort();
        labels
    }
}
