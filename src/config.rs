use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL. In-memory stores are used when absent.
    #[serde(default)]
    pub postgres_url: Option<String>,
    /// HS256 secret shared with the token issuer. `JWT_SECRET` overrides it.
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransferConfig {
    /// Upper bound on a single provider withdraw call. Expiry means Ambiguous.
    pub provider_timeout_ms: u64,
    /// Reconciliation journal (JSON lines) for ambiguous and unrecorded transfers
    pub journal_path: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: 15_000,
            journal_path: "./data/reconciliation.jsonl".to_string(),
        }
    }
}

impl TransferConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub binance: BinanceConfig,
    #[serde(default)]
    pub coinbase: CoinbaseConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BinanceConfig {
    pub base_url: String,
    pub recv_window_ms: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            recv_window_ms: 5_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CoinbaseConfig {
    pub base_url: String,
    /// Value of the `CB-VERSION` header
    pub api_version: String,
}

impl Default for CoinbaseConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coinbase.com".to_string(),
            api_version: "2021-06-01".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            config.jwt_secret = secret;
        }
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.transfer.provider_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "transfer.provider_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
