//! Coinbase send client
//!
//! Sending is a two-step protocol: resolve the sender's account for the
//! currency (`GET /v2/accounts`), then `POST /v2/accounts/{id}/transactions`
//! with `type = "send"`. Requests carry `CB-ACCESS-*` headers signed over
//! `timestamp + METHOD + path + body`.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::signing::hmac_sha256_hex;
use super::{ProviderAdapter, WithdrawOutcome};
use crate::account::ProviderCredentials;
use crate::config::CoinbaseConfig;

const ACCOUNTS_PATH: &str = "/v2/accounts?limit=100";
const MAX_ACCOUNT_PAGES: usize = 10;
const SEND_DESCRIPTION: &str = "Transaction permitted by Cha Ching.";
/// Caller-facing reason when the account lookup never reached Coinbase
const UNREACHABLE: &str = "coinbase unreachable";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AccountCurrency {
    Object { code: String },
    Code(String),
}

impl AccountCurrency {
    fn code(&self) -> &str {
        match self {
            AccountCurrency::Object { code } | AccountCurrency::Code(code) => code,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Account {
    id: String,
    currency: AccountCurrency,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    next_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountsPage {
    #[serde(default)]
    pagination: Pagination,
    data: Vec<Account>,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    to: &'a str,
    amount: String,
    currency: &'a str,
    description: &'a str,
    idem: &'a str,
}

#[derive(Debug, Deserialize)]
struct SentTransaction {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    data: SentTransaction,
}

#[derive(Debug, Deserialize)]
struct CoinbaseErrorDetail {
    #[serde(default)]
    id: Option<String>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CoinbaseErrorBody {
    errors: Vec<CoinbaseErrorDetail>,
}

/// Failure while resolving the sending account. No funds have moved yet.
#[derive(Debug)]
enum LookupFailure {
    Rejected(String),
    Transport(String),
}

pub struct CoinbaseAdapter {
    http: reqwest::Client,
    config: CoinbaseConfig,
    credentials: ProviderCredentials,
}

impl CoinbaseAdapter {
    pub const LABEL: &'static str = "coinbase";

    pub fn new(
        http: reqwest::Client,
        config: CoinbaseConfig,
        credentials: ProviderCredentials,
    ) -> Self {
        Self {
            http,
            config,
            credentials,
        }
    }

    fn signature(&self, timestamp: i64, method: &Method, path: &str, body: &str) -> Option<String> {
        let prehash = format!("{}{}{}{}", timestamp, method.as_str(), path, body);
        hmac_sha256_hex(self.credentials.api_secret(), &prehash).ok()
    }

    async fn send_signed(
        &self,
        method: Method,
        path: &str,
        body: String,
    ) -> Result<(StatusCode, String), String> {
        let timestamp = chrono::Utc::now().timestamp();
        let signature = self
            .signature(timestamp, &method, path, &body)
            .ok_or_else(|| "request signing failed".to_string())?;
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);

        let mut request = self
            .http
            .request(method, url)
            .header("CB-ACCESS-KEY", self.credentials.api_key())
            .header("CB-ACCESS-SIGN", signature)
            .header("CB-ACCESS-TIMESTAMP", timestamp.to_string())
            .header("CB-VERSION", &self.config.api_version);
        if !body.is_empty() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("coinbase request failed: {}", e.without_url()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            format!("coinbase response unreadable ({}): {}", status, e.without_url())
        })?;
        Ok((status, text))
    }

    /// Walk the account pages until one holds `asset`
    async fn find_account(&self, asset: &str) -> Result<String, LookupFailure> {
        let mut path = ACCOUNTS_PATH.to_string();
        for _ in 0..MAX_ACCOUNT_PAGES {
            let (status, body) = self
                .send_signed(Method::GET, &path, String::new())
                .await
                .map_err(LookupFailure::Transport)?;
            if !status.is_success() {
                return Err(LookupFailure::Rejected(error_message(status, &body)));
            }

            let page: AccountsPage = serde_json::from_str(&body).map_err(|e| {
                LookupFailure::Rejected(format!("coinbase accounts unreadable: {}", e))
            })?;
            if let Some(id) = account_for_currency(&page.data, asset) {
                return Ok(id.to_string());
            }
            match page.pagination.next_uri {
                Some(next) if !next.is_empty() => path = next,
                _ => break,
            }
        }
        Err(LookupFailure::Rejected(format!(
            "coinbase: no {} account for these credentials",
            asset
        )))
    }
}

fn account_for_currency<'a>(accounts: &'a [Account], asset: &str) -> Option<&'a str> {
    accounts
        .iter()
        .find(|account| account.currency.code().eq_ignore_ascii_case(asset))
        .map(|account| account.id.as_str())
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<CoinbaseErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => {
            let detail = &parsed.errors[0];
            match &detail.id {
                Some(id) => format!("coinbase {}: {}", id, detail.message),
                None => format!("coinbase: {}", detail.message),
            }
        }
        _ => format!("coinbase returned {}", status),
    }
}

/// Map a Coinbase send response to a withdraw outcome
pub fn classify_send_response(status: StatusCode, body: &str) -> WithdrawOutcome {
    if status.is_success() {
        return match serde_json::from_str::<SendResponse>(body) {
            Ok(sent) => WithdrawOutcome::Accepted {
                provider_tx_id: sent.data.id,
            },
            Err(_) => WithdrawOutcome::Unavailable(format!(
                "coinbase returned {} without a transaction id",
                status
            )),
        };
    }
    if status.is_server_error() {
        return WithdrawOutcome::Unavailable(format!("coinbase returned {}", status));
    }
    WithdrawOutcome::Rejected(error_message(status, body))
}

#[async_trait]
impl ProviderAdapter for CoinbaseAdapter {
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
        let account_id = match self.find_account(asset).await {
            Ok(id) => id,
            // The send has not been issued, so every lookup failure is a clean decline
            Err(LookupFailure::Rejected(msg)) => {
                warn!(client_ref = client_ref, asset = asset, reason = %msg, "Coinbase account lookup failed");
                return WithdrawOutcome::Rejected(msg);
            }
            Err(LookupFailure::Transport(detail)) => {
                warn!(client_ref = client_ref, asset = asset, error = %detail, "Coinbase account lookup transport failure");
                return WithdrawOutcome::Rejected(UNREACHABLE.to_string());
            }
        };

        let payload = SendRequest {
            kind: "send",
            to: destination,
            amount: amount.normalize().to_string(),
            currency: asset,
            description: SEND_DESCRIPTION,
            idem: client_ref,
        };
        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(e) => return WithdrawOutcome::Rejected(format!("coinbase payload: {}", e)),
        };

        debug!(client_ref = client_ref, asset = asset, amount = %amount, "Coinbase send");

        let path = format!("/v2/accounts/{}/transactions", account_id);
        match self.send_signed(Method::POST, &path, body).await {
            Ok((status, body)) => classify_send_response(status, &body),
            Err(e) => {
                warn!(client_ref = client_ref, error = %e, "Coinbase send transport failure");
                WithdrawOutcome::Unavailable(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_currency_shapes() {
        let page: AccountsPage = serde_json::from_str(
            r#"{
                "pagination": {"next_uri": null},
                "data": [
                    {"id": "acc-eth", "currency": "ETH"},
                    {"id": "acc-btc", "currency": {"code": "BTC", "name": "Bitcoin"}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(account_for_currency(&page.data, "btc"), Some("acc-btc"));
        assert_eq!(account_for_currency(&page.data, "ETH"), Some("acc-eth"));
        assert_eq!(account_for_currency(&page.data, "LTC"), None);
        assert!(page.pagination.next_uri.is_none());
    }

    #[test]
    fn test_send_payload_shape() {
        let payload = SendRequest {
            kind: "send",
            to: "bc1qbob",
            amount: Decimal::new(5000, 2).normalize().to_string(),
            currency: "BTC",
            description: SEND_DESCRIPTION,
            idem: "01HREF",
        };
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "send");
        assert_eq!(json["amount"], "50");
        assert_eq!(json["idem"], "01HREF");
    }

    #[test]
    fn test_signature_covers_request_parts() {
        let adapter = CoinbaseAdapter::new(
            reqwest::Client::new(),
            CoinbaseConfig::default(),
            ProviderCredentials::new("key", "secret"),
        );
        let sig = adapter
            .signature(1_700_000_000, &Method::POST, "/v2/accounts/a/transactions", "{}")
            .unwrap();
        assert_eq!(
            sig,
            hmac_sha256_hex("secret", "1700000000POST/v2/accounts/a/transactions{}").unwrap()
        );
    }

    #[test]
    fn test_classify_send_response() {
        assert_eq!(
            classify_send_response(StatusCode::CREATED, r#"{"data":{"id":"tx123","status":"pending"}}"#)
                .provider_transaction_id(),
            Some("tx123")
        );
        assert_eq!(
            classify_send_response(
                StatusCode::BAD_REQUEST,
                r#"{"errors":[{"id":"validation_error","message":"Insufficient funds"}]}"#
            ),
            WithdrawOutcome::Rejected("coinbase validation_error: Insufficient funds".into())
        );
        assert!(matches!(
            classify_send_response(StatusCode::SERVICE_UNAVAILABLE, ""),
            WithdrawOutcome::Unavailable(_)
        ));
        assert!(matches!(
            classify_send_response(StatusCode::OK, "not json"),
            WithdrawOutcome::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_hides_request_url() {
        let adapter = CoinbaseAdapter::new(
            reqwest::Client::new(),
            CoinbaseConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                ..CoinbaseConfig::default()
            },
            ProviderCredentials::new("key", "secret"),
        );
        let outcome = adapter
            .withdraw("01HREF", "BTC", Decimal::ONE, "bc1qbob")
            .await;
        assert_eq!(outcome, WithdrawOutcome::Rejected(UNREACHABLE.into()));

        let err = adapter
            .send_signed(Method::GET, ACCOUNTS_PATH, String::new())
            .await
            .unwrap_err();
        assert!(!err.contains("http://"));
        assert!(!err.contains("127.0.0.1"));
    }
}
