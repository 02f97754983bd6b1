//! Integration Tests for the transfer FSM
//!
//! Full coordinator runs against the in-memory directory and ledger, with
//! call-counting mock adapters standing in for the providers.

#[cfg(test)]
mod integration_tests {
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::account::{InMemoryAccountDirectory, ProviderCredentials, UserId};
    use crate::provider::{MockAdapter, ProviderAdapter, ProviderRegistry, WithdrawOutcome};
    use crate::transfer::coordinator::{TransferCoordinator, TransferOutcome};
    use crate::transfer::error::{Party, TransferError, ValidationError};
    use crate::transfer::journal::{JournalKind, ReconciliationJournal};
    use crate::transfer::ledger::InMemoryLedger;
    use crate::transfer::state::TransferState;
    use crate::transfer::types::{TransactionStatus, TransferRequest};

    const TIMEOUT: Duration = Duration::from_millis(100);

    struct TestHarness {
        coordinator: TransferCoordinator,
        directory: Arc<InMemoryAccountDirectory>,
        ledger: Arc<InMemoryLedger>,
        journal: Arc<ReconciliationJournal>,
        binance: Arc<MockAdapter>,
        coinbase: Arc<MockAdapter>,
        alice: UserId,
        bob: UserId,
        _dir: tempfile::TempDir,
    }

    fn mock_factory(
        adapter: Arc<MockAdapter>,
    ) -> impl Fn(&ProviderCredentials) -> Arc<dyn ProviderAdapter> + Send + Sync {
        move |_: &ProviderCredentials| adapter.clone() as Arc<dyn ProviderAdapter>
    }

    impl TestHarness {
        /// alice: binance + coinbase, 100 BTC on each. bob: coinbase + binance BTC wallets.
        fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let journal = Arc::new(ReconciliationJournal::new(tmp.path().join("recon.jsonl")));
            Self::with_journal(journal, tmp)
        }

        fn with_journal(journal: Arc<ReconciliationJournal>, tmp: tempfile::TempDir) -> Self {
            let directory = Arc::new(InMemoryAccountDirectory::new());
            let alice = directory.add_user("alice");
            let bob = directory.add_user("bob");
            for (user, address) in [(alice, "bc1qalice"), (bob, "bc1qbob")] {
                for label in ["binance", "coinbase"] {
                    let svc = directory
                        .add_service(user, label, ProviderCredentials::new("key", "secret"))
                        .unwrap();
                    let balance = if user == alice { Decimal::from(100) } else { Decimal::ZERO };
                    directory
                        .add_wallet(svc, "BTC", &format!("{}-{}", address, label), balance)
                        .unwrap();
                }
            }
            directory.set_currency("BTC", "Bitcoin", Some(Decimal::from(60_000)));

            let binance = Arc::new(MockAdapter::accepting("binance", "bn-1"));
            let coinbase = Arc::new(MockAdapter::accepting("coinbase", "tx123"));
            let mut registry = ProviderRegistry::new();
            registry.register("binance", mock_factory(binance.clone()));
            registry.register("coinbase", mock_factory(coinbase.clone()));

            let ledger = Arc::new(InMemoryLedger::new());
            let coordinator = TransferCoordinator::new(
                directory.clone(),
                Arc::new(registry),
                ledger.clone(),
                journal.clone(),
                TIMEOUT,
            );

            Self {
                coordinator,
                directory,
                ledger,
                journal,
                binance,
                coinbase,
                alice,
                bob,
                _dir: tmp,
            }
        }

        fn request(&self, service: &str, amount: i64) -> TransferRequest {
            TransferRequest {
                sender: self.alice,
                recipient: self.bob,
                sender_service: service.to_string(),
                recipient_service: "coinbase".to_string(),
                currency: "BTC".to_string(),
                amount: Decimal::from(amount),
            }
        }

        fn total_calls(&self) -> usize {
            self.binance.withdraw_count() + self.coinbase.withdraw_count()
        }
    }

    fn rejection(outcome: TransferOutcome) -> TransferError {
        match outcome {
            TransferOutcome::Rejected(e) => e,
            other => panic!("expected Rejected, got {:?}", other.state()),
        }
    }

    // ========================================================================
    // Validation short-circuits
    // ========================================================================

    #[tokio::test]
    async fn test_unknown_party_rejected_without_records() {
        let h = TestHarness::new();

        let mut req = h.request("coinbase", 10);
        req.sender = 4242;
        let err = rejection(h.coordinator.execute(req).await);
        assert!(matches!(
            err,
            TransferError::Validation(ValidationError::NotFound(Party::Sender))
        ));

        let mut req = h.request("coinbase", 10);
        req.recipient = 4242;
        let err = rejection(h.coordinator.execute(req).await);
        assert!(matches!(
            err,
            TransferError::Validation(ValidationError::NotFound(Party::Recipient))
        ));

        assert!(h.ledger.is_empty());
        assert_eq!(h.total_calls(), 0);
    }

    /// Balance 100 BTC, request 150: rejected, zero external calls
    #[tokio::test]
    async fn test_insufficient_balance_never_dispatches() {
        let h = TestHarness::new();
        let outcome = h.coordinator.execute(h.request("coinbase", 150)).await;

        assert_eq!(outcome.state(), TransferState::Rejected);
        assert_eq!(rejection(outcome).code(), "INSUFFICIENT_BALANCE");
        assert_eq!(h.total_calls(), 0);
        assert!(h.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_directory_outage_is_not_a_validation_failure() {
        let h = TestHarness::new();
        h.directory.set_unavailable(true);
        let err = rejection(h.coordinator.execute(h.request("coinbase", 10)).await);
        assert!(matches!(err, TransferError::Directory(_)));
        assert_eq!(h.total_calls(), 0);
    }

    // ========================================================================
    // Settlement
    // ========================================================================

    /// Balance 100, send 50 via Coinbase, provider answers "tx123"
    #[tokio::test]
    async fn test_coinbase_settlement_records_once() {
        let h = TestHarness::new();
        let outcome = h.coordinator.execute(h.request("coinbase", 50)).await;

        let TransferOutcome::Settled {
            transaction_id,
            provider_tx_id,
            recording_warning,
        } = outcome
        else {
            panic!("expected Settled");
        };
        assert_eq!(provider_tx_id, "tx123");
        assert!(recording_warning.is_none());

        let records = h.ledger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transaction_id, transaction_id);
        assert_eq!(records[0].status, TransactionStatus::Settled);
        assert_eq!(records[0].provider_tx_id, "tx123");
        assert_eq!(records[0].amount_usd, Some(Decimal::from(3_000_000)));

        assert_eq!(h.coinbase.withdraw_count(), 1);
        assert_eq!(h.binance.withdraw_count(), 0);
        assert!(h.journal.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_uses_sender_provider_and_attempt_id() {
        let h = TestHarness::new();
        let outcome = h.coordinator.execute(h.request("binance", 25)).await;
        let TransferOutcome::Settled { transaction_id, .. } = outcome else {
            panic!("expected Settled");
        };

        // Cross-exchange: binance sender, coinbase recipient wallet
        let calls = h.binance.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, transaction_id.to_string());
        assert_eq!(calls[0].1, "BTC");
        assert_eq!(calls[0].2, Decimal::from(25));
        assert_eq!(calls[0].3, "bc1qbob-coinbase");
        assert_eq!(h.coinbase.withdraw_count(), 0);
    }

    #[tokio::test]
    async fn test_ledger_failure_still_settles_and_flags() {
        let h = TestHarness::new();
        h.ledger.set_fail_writes(true);

        let outcome = h.coordinator.execute(h.request("coinbase", 50)).await;
        let TransferOutcome::Settled {
            transaction_id,
            recording_warning,
            ..
        } = outcome
        else {
            panic!("expected Settled");
        };
        assert!(recording_warning.is_some());
        assert_eq!(h.coinbase.withdraw_count(), 1, "withdraw must not be retried");

        let entries = h.journal.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, JournalKind::Unrecorded);
        assert_eq!(entries[0].transaction_id, transaction_id.to_string());
        assert_eq!(entries[0].provider_tx_id.as_deref(), Some("tx123"));
    }

    // ========================================================================
    // Provider failures
    // ========================================================================

    #[tokio::test]
    async fn test_provider_rejection_records_nothing() {
        let h = TestHarness::new();
        h.coinbase
            .set_outcome(WithdrawOutcome::Rejected("invalid address".into()));

        let err = rejection(h.coordinator.execute(h.request("coinbase", 50)).await);
        assert!(matches!(err, TransferError::ProviderRejected(ref m) if m == "invalid address"));
        assert!(h.ledger.is_empty());
        assert!(h.journal.entries().await.unwrap().is_empty());
        assert_eq!(h.coinbase.withdraw_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_timeout_is_ambiguous() {
        let h = TestHarness::new();
        h.coinbase.set_delay(TIMEOUT * 5);

        let outcome = h.coordinator.execute(h.request("coinbase", 50)).await;
        assert_eq!(outcome.state(), TransferState::Ambiguous);
        let TransferOutcome::Ambiguous {
            transaction_id,
            provider,
            ..
        } = outcome
        else {
            panic!("expected Ambiguous");
        };
        assert_eq!(provider, "coinbase");

        assert!(
            h.ledger
                .records()
                .iter()
                .all(|r| r.status != TransactionStatus::Settled)
        );
        assert!(h.ledger.is_empty());
        assert_eq!(h.coinbase.withdraw_count(), 1);

        let entries = h.journal.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, JournalKind::Ambiguous);
        assert_eq!(entries[0].transaction_id, transaction_id.to_string());
    }

    #[tokio::test]
    async fn test_provider_unavailable_is_ambiguous() {
        let h = TestHarness::new();
        h.binance
            .set_outcome(WithdrawOutcome::Unavailable("binance returned 503".into()));

        let outcome = h.coordinator.execute(h.request("binance", 50)).await;
        assert!(matches!(
            outcome,
            TransferOutcome::Ambiguous { ref reason, .. } if reason == "binance returned 503"
        ));
        assert!(h.ledger.is_empty());
        assert_eq!(h.binance.withdraw_count(), 1);
    }

    #[tokio::test]
    async fn test_journal_failure_does_not_change_outcome() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let journal = Arc::new(ReconciliationJournal::new(blocker.join("recon.jsonl")));
        let h = TestHarness::with_journal(journal, tmp);
        h.coinbase
            .set_outcome(WithdrawOutcome::Unavailable("connection reset".into()));

        let outcome = h.coordinator.execute(h.request("coinbase", 50)).await;
        assert_eq!(outcome.state(), TransferState::Ambiguous);
    }

    #[tokio::test]
    async fn test_unsupported_provider_rejected_before_dispatch() {
        let h = TestHarness::new();
        let svc = h
            .directory
            .add_service(h.alice, "kraken", ProviderCredentials::new("k", "s"))
            .unwrap();
        h.directory
            .add_wallet(svc, "BTC", "kraken-alice", Decimal::from(100))
            .unwrap();

        let err = rejection(h.coordinator.execute(h.request("kraken", 10)).await);
        assert!(matches!(err, TransferError::UnsupportedProvider(ref l) if l == "kraken"));
        assert_eq!(h.total_calls(), 0);
        assert!(h.ledger.is_empty());
    }

    // ========================================================================
    // History
    // ========================================================================

    #[tokio::test]
    async fn test_history_for_both_parties() {
        let h = TestHarness::new();
        h.coordinator.execute(h.request("coinbase", 10)).await;
        h.coordinator.execute(h.request("binance", 20)).await;

        let alice = h.coordinator.history(h.alice).await.unwrap();
        assert_eq!(alice.transactions_sent.len(), 2);
        assert!(alice.transactions_received.is_empty());
        assert_eq!(alice.transactions_sent[0].amount, Decimal::from(20));

        let bob = h.coordinator.history(h.bob).await.unwrap();
        assert_eq!(bob.transactions_received.len(), 2);

        assert!(matches!(
            h.coordinator.history(4242).await,
            Err(TransferError::UserNotFound)
        ));
    }
}
