//! Binance withdraw client
//!
//! `POST /sapi/v1/capital/withdraw/apply`, HMAC-SHA256 signed query string,
//! API key in `X-MBX-APIKEY`. Binance documents 5XX responses and error
//! code -1007 as "execution status unknown"; both map to `Unavailable`.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use super::signing::hmac_sha256_hex;
use super::{ProviderAdapter, WithdrawOutcome};
use crate::account::ProviderCredentials;
use crate::config::BinanceConfig;

const WITHDRAW_PATH: &str = "/sapi/v1/capital/withdraw/apply";

/// "Timeout waiting for response from backend server. Send status unknown"
const CODE_STATUS_UNKNOWN: i64 = -1007;

#[derive(Debug, Deserialize)]
struct WithdrawAccepted {
    id: String,
}

#[derive(Debug, Deserialize)]
struct BinanceErrorBody {
    code: i64,
    msg: String,
}

pub struct BinanceAdapter {
    http: reqwest::Client,
    config: BinanceConfig,
    credentials: ProviderCredentials,
}

impl BinanceAdapter {
    pub const LABEL: &'static str = "binance";

    pub fn new(http: reqwest::Client, config: BinanceConfig, credentials: ProviderCredentials) -> Self {
        Self {
            http,
            config,
            credentials,
        }
    }

    /// Signed withdraw URL. The signature covers the exact encoded query.
    fn signed_withdraw_url(
        &self,
        client_ref: &str,
        asset: &str,
        amount: Decimal,
        destination: &str,
        timestamp_ms: i64,
    ) -> Result<Url, String> {
        let mut url = Url::parse(&format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            WITHDRAW_PATH
        ))
        .map_err(|e| format!("invalid Binance base url: {}", e))?;

        url.query_pairs_mut()
            .append_pair("coin", asset)
            .append_pair("address", destination)
            .append_pair("amount", &amount.normalize().to_string())
            .append_pair("withdrawOrderId", client_ref)
            .append_pair("recvWindow", &self.config.recv_window_ms.to_string())
            .append_pair("timestamp", &timestamp_ms.to_string());

        let query = url.query().unwrap_or_default().to_string();
        let signature = hmac_sha256_hex(self.credentials.api_secret(), &query)
            .map_err(|_| "request signing failed".to_string())?;
        url.query_pairs_mut().append_pair("signature", &signature);
        Ok(url)
    }
}

/// Map a Binance HTTP response to a withdraw outcome
pub fn classify_response(status: StatusCode, body: &str) -> WithdrawOutcome {
    if status.is_success() {
        return match serde_json::from_str::<WithdrawAccepted>(body) {
            Ok(accepted) => WithdrawOutcome::Accepted {
                provider_tx_id: accepted.id,
            },
            // 2xx without an id: the withdrawal may exist, cannot confirm
            Err(_) => WithdrawOutcome::Unavailable(format!(
                "binance returned {} without a withdrawal id",
                status
            )),
        };
    }

    if status.is_server_error() {
        return WithdrawOutcome::Unavailable(format!("binance returned {}", status));
    }

    match serde_json::from_str::<BinanceErrorBody>(body) {
        Ok(err) if err.code == CODE_STATUS_UNKNOWN => {
            WithdrawOutcome::Unavailable(format!("binance {}: {}", err.code, err.msg))
        }
        Ok(err) => WithdrawOutcome::Rejected(format!("binance {}: {}", err.code, err.msg)),
        Err(_) => WithdrawOutcome::Rejected(format!("binance returned {}", status)),
    }
}

#[async_trait]
impl ProviderAdapter for BinanceAdapter {
    fn name(&self) -> &'static str {
        Self::LABEL
    }

    async fn withdraw(
        &self,
        client_ref: &str,
        asset: &str,
        amount: Decimal,
        destination: &str,
    ) -> WithdrawOutcome {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let url =
            match self.signed_withdraw_url(client_ref, asset, amount, destination, timestamp_ms) {
                Ok(url) => url,
                // Nothing has been sent yet
                Err(e) => return WithdrawOutcome::Rejected(e),
            };

        debug!(client_ref = client_ref, asset = asset, amount = %amount, "Binance withdraw");

        let response = match self
            .http
            .post(url)
            .header("X-MBX-APIKEY", self.credentials.api_key())
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                // The URL carries the signed query
                let e = e.without_url();
                warn!(client_ref = client_ref, error = %e, "Binance withdraw transport failure");
                return WithdrawOutcome::Unavailable(format!("binance request failed: {}", e));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return WithdrawOutcome::Unavailable(format!(
                    "binance response unreadable ({}): {}",
                    status,
                    e.without_url()
                ));
            }
        };

        classify_response(status, &body)
    }
}
