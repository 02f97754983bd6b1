//! Reconciliation journal
//!
//! Append-only JSON lines. One entry per transfer whose external effect is
//! not reflected in the ledger: ambiguous provider outcomes and settled
//! transfers whose ledger write failed. Operators work through this file
//! out of band.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::types::{Settlement, TransactionId, ValidatedTransfer};
use crate::account::UserId;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Journal encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalKind {
    /// Provider outcome unknown; funds may or may not have moved
    Ambiguous,
    /// Provider accepted but the ledger row is missing
    Unrecorded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub kind: JournalKind,
    pub transaction_id: String,
    pub sender: UserId,
    pub sender_service: String,
    pub recipient: UserId,
    pub recipient_service: String,
    pub currency: String,
    pub amount: Decimal,
    pub destination: String,
    pub provider: String,
    pub provider_tx_id: Option<String>,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

impl JournalEntry {
    fn base(
        kind: JournalKind,
        transfer: &ValidatedTransfer,
        transaction_id: TransactionId,
        provider: &str,
        reason: &str,
    ) -> Self {
        Self {
            kind,
            transaction_id: transaction_id.to_string(),
            sender: transfer.sender.user_id,
            sender_service: transfer.sender_service.label.clone(),
            recipient: transfer.recipient.user_id,
            recipient_service: transfer.recipient_service.label.clone(),
            currency: transfer.currency.clone(),
            amount: transfer.amount,
            destination: transfer.recipient_wallet.address.clone(),
            provider: provider.to_string(),
            provider_tx_id: None,
            reason: reason.to_string(),
            recorded_at: Utc::now(),
        }
    }

    pub fn ambiguous(
        transfer: &ValidatedTransfer,
        transaction_id: TransactionId,
        provider: &str,
        reason: &str,
    ) -> Self {
        Self::base(JournalKind::Ambiguous, transfer, transaction_id, provider, reason)
    }

    pub fn unrecorded(transfer: &ValidatedTransfer, settlement: &Settlement, reason: &str) -> Self {
        let mut entry = Self::base(
            JournalKind::Unrecorded,
            transfer,
            settlement.transaction_id,
            &settlement.provider,
            reason,
        );
        entry.provider_tx_id = Some(settlement.provider_tx_id.clone());
        entry
    }
}

pub struct ReconciliationJournal {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ReconciliationJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.sync_data().await?;
        Ok(())
    }

    /// All entries, oldest first. A missing file is an empty journal.
    pub async fn entries(&self) -> Result<Vec<JournalEntry>, JournalError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut entries = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            entries.push(serde_json::from_str(line)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{ExchangeService, ProviderCredentials, User, Wallet};
    use std::collections::BTreeMap;

    fn transfer() -> ValidatedTransfer {
        let user = |id: UserId| User {
            user_id: id,
            username: format!("u{}", id),
            services: BTreeMap::new(),
        };
        let service = |id, user_id, label: &str| ExchangeService {
            service_id: id,
            user_id,
            label: label.to_string(),
            credentials: ProviderCredentials::new("key", "top-secret"),
            wallets: BTreeMap::new(),
        };
        let wallet = |user_id, address: &str| Wallet {
            wallet_id: user_id * 10,
            user_id,
            service_id: user_id,
            label: "BTC wallet".to_string(),
            address: address.to_string(),
            balance: Decimal::from(100),
            symbol: "BTC".to_string(),
            disabled: false,
        };
        ValidatedTransfer {
            sender: user(1),
            recipient: user(2),
            sender_service: service(1, 1, "binance"),
            recipient_service: service(2, 2, "coinbase"),
            sender_wallet: wallet(1, "bc1qalice"),
            recipient_wallet: wallet(2, "bc1qbob"),
            currency: "BTC".to_string(),
            amount: Decimal::from(50),
            currency_info: None,
        }
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let journal = ReconciliationJournal::new(dir.path().join("nested/reconciliation.jsonl"));
        assert!(journal.entries().await.unwrap().is_empty());

        let t = transfer();
        let id = TransactionId::new();
        journal
            .append(&JournalEntry::ambiguous(&t, id, "binance", "timed out"))
            .await
            .unwrap();
        let settlement = Settlement {
            transaction_id: TransactionId::new(),
            provider: "binance".to_string(),
            provider_tx_id: "wd-1".to_string(),
        };
        journal
            .append(&JournalEntry::unrecorded(&t, &settlement, "db down"))
            .await
            .unwrap();

        let entries = journal.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, JournalKind::Ambiguous);
        assert_eq!(entries[0].transaction_id, id.to_string());
        assert_eq!(entries[0].destination, "bc1qbob");
        assert_eq!(entries[0].provider_tx_id, None);
        assert_eq!(entries[1].kind, JournalKind::Unrecorded);
        assert_eq!(entries[1].provider_tx_id.as_deref(), Some("wd-1"));
    }

    #[tokio::test]
    async fn test_entries_never_carry_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let journal = ReconciliationJournal::new(dir.path().join("j.jsonl"));
        journal
            .append(&JournalEntry::ambiguous(&transfer(), TransactionId::new(), "binance", "5xx"))
            .await
            .unwrap();
        let raw = std::fs::read_to_string(journal.path()).unwrap();
        assert!(!raw.contains("top-secret"));
        assert_eq!(raw.lines().count(), 1);
    }
}
