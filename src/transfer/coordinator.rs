//! Transfer Coordinator
//!
//! Drives one transfer attempt through the FSM. The provider withdraw is the
//! only irreversible step and is invoked at most once per attempt; nothing
//! after it may turn the attempt into a failure.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::error::TransferError;
use super::journal::{JournalEntry, ReconciliationJournal};
use super::ledger::LedgerRecorder;
use super::state::TransferState;
use super::types::{Settlement, TransactionHistory, TransactionId, TransferRequest, ValidatedTransfer};
use super::validator::TransferValidator;
use crate::account::{AccountDirectory, UserId};
use crate::provider::{ProviderRegistry, WithdrawOutcome};

/// Terminal result of one transfer attempt
#[derive(Debug, Clone)]
pub enum TransferOutcome {
    /// Provider accepted the withdrawal
    Settled {
        transaction_id: TransactionId,
        provider_tx_id: String,
        /// Set when the ledger write failed; the transfer still happened
        recording_warning: Option<String>,
    },
    /// Nothing moved: validation failure or explicit provider decline
    Rejected(TransferError),
    /// Provider outcome unknown. Journaled for reconciliation.
    Ambiguous {
        transaction_id: TransactionId,
        provider: String,
        reason: String,
    },
}

impl TransferOutcome {
    pub fn state(&self) -> TransferState {
        match self {
            TransferOutcome::Settled { .. } => TransferState::Settled,
            TransferOutcome::Rejected(_) => TransferState::Rejected,
            TransferOutcome::Ambiguous { .. } => TransferState::Ambiguous,
        }
    }
}

pub struct TransferCoordinator {
    directory: Arc<dyn AccountDirectory>,
    validator: TransferValidator,
    registry: Arc<ProviderRegistry>,
    ledger: Arc<dyn LedgerRecorder>,
    journal: Arc<ReconciliationJournal>,
    provider_timeout: Duration,
}

impl TransferCoordinator {
    pub fn new(
        directory: Arc<dyn AccountDirectory>,
        registry: Arc<ProviderRegistry>,
        ledger: Arc<dyn LedgerRecorder>,
        journal: Arc<ReconciliationJournal>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            validator: TransferValidator::new(directory.clone()),
            directory,
            registry,
            ledger,
            journal,
            provider_timeout,
        }
    }

    /// Run one attempt to a terminal state
    pub async fn execute(&self, req: TransferRequest) -> TransferOutcome {
        let mut state = TransferState::Validating;

        let transfer = match self.validator.validate(&req).await {
            Ok(transfer) => transfer,
            Err(e) => {
                advance(&mut state, TransferState::Rejected);
                info!(
                    sender = req.sender,
                    recipient = req.recipient,
                    code = e.code(),
                    "Transfer rejected during validation: {}",
                    e
                );
                return TransferOutcome::Rejected(e);
            }
        };

        advance(&mut state, TransferState::Dispatching);
        let transaction_id = TransactionId::new();
        let outcome = match self.dispatch(&transfer, transaction_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                advance(&mut state, TransferState::Rejected);
                warn!(transaction_id = %transaction_id, code = e.code(), "Transfer not dispatched: {}", e);
                return TransferOutcome::Rejected(e);
            }
        };

        let provider = transfer.sender_service.label.clone();
        let provider_tx_id = match outcome {
            WithdrawOutcome::Accepted { provider_tx_id } => provider_tx_id,
            WithdrawOutcome::Rejected(msg) => {
                advance(&mut state, TransferState::Rejected);
                info!(
                    transaction_id = %transaction_id,
                    provider = %provider,
                    "Provider rejected transfer: {}",
                    msg
                );
                return TransferOutcome::Rejected(TransferError::ProviderRejected(msg));
            }
            WithdrawOutcome::Unavailable(reason) => {
                advance(&mut state, TransferState::Ambiguous);
                error!(
                    transaction_id = %transaction_id,
                    provider = %provider,
                    sender = transfer.sender.user_id,
                    amount = %transfer.amount,
                    currency = %transfer.currency,
                    "Provider outcome unknown, needs reconciliation: {}",
                    reason
                );
                self.journal_append(JournalEntry::ambiguous(
                    &transfer,
                    transaction_id,
                    &provider,
                    &reason,
                ))
                .await;
                return TransferOutcome::Ambiguous {
                    transaction_id,
                    provider,
                    reason,
                };
            }
        };

        advance(&mut state, TransferState::Recording);
        let settlement = Settlement {
            transaction_id,
            provider,
            provider_tx_id,
        };
        let recording_warning = match self.ledger.record(&transfer, &settlement).await {
            Ok(_) => None,
            Err(e) => {
                // The withdrawal happened; flag it and still report success
                error!(
                    transaction_id = %transaction_id,
                    provider = %settlement.provider,
                    provider_tx_id = %settlement.provider_tx_id,
                    "Settled transfer not recorded: {}",
                    e
                );
                self.journal_append(JournalEntry::unrecorded(&transfer, &settlement, &e.to_string()))
                    .await;
                Some(format!(
                    "Transfer settled but its record could not be saved ({}); it has been flagged for reconciliation",
                    e
                ))
            }
        };

        advance(&mut state, TransferState::Settled);
        info!(
            transaction_id = %transaction_id,
            provider = %settlement.provider,
            provider_tx_id = %settlement.provider_tx_id,
            sender = transfer.sender.user_id,
            recipient = transfer.recipient.user_id,
            amount = %transfer.amount,
            currency = %transfer.currency,
            "Transfer settled"
        );
        TransferOutcome::Settled {
            transaction_id,
            provider_tx_id: settlement.provider_tx_id,
            recording_warning,
        }
    }

    /// Select the adapter and call withdraw exactly once, bounded by the timeout
    async fn dispatch(
        &self,
        transfer: &ValidatedTransfer,
        transaction_id: TransactionId,
    ) -> Result<WithdrawOutcome, TransferError> {
        let service = &transfer.sender_service;
        let adapter = self
            .registry
            .adapter_for(&service.label, &service.credentials)
            .ok_or_else(|| TransferError::UnsupportedProvider(service.label.clone()))?;

        debug!(
            transaction_id = %transaction_id,
            provider = adapter.name(),
            "Dispatching withdraw"
        );

        let client_ref = transaction_id.to_string();
        let call = adapter.withdraw(
            &client_ref,
            &transfer.currency,
            transfer.amount,
            &transfer.recipient_wallet.address,
        );
        match tokio::time::timeout(self.provider_timeout, call).await {
            Ok(outcome) => Ok(outcome),
            Err(_) => Ok(WithdrawOutcome::Unavailable(format!(
                "no response from {} within {} ms",
                adapter.name(),
                self.provider_timeout.as_millis()
            ))),
        }
    }

    async fn journal_append(&self, entry: JournalEntry) {
        if let Err(e) = self.journal.append(&entry).await {
            error!(
                transaction_id = %entry.transaction_id,
                journal = %self.journal.path().display(),
                "Failed to write reconciliation journal: {}",
                e
            );
        }
    }

    /// Ledger view for one existing user
    pub async fn history(&self, user_id: UserId) -> Result<TransactionHistory, TransferError> {
        if self.directory.find_user_by_id(user_id).await?.is_none() {
            return Err(TransferError::UserNotFound);
        }
        Ok(self.ledger.history(user_id).await?)
    }
}

fn advance(state: &mut TransferState, next: TransferState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal transfer transition {} -> {}",
        state,
        next
    );
    debug!(from = %state, to = %next, "Transfer state");
    *state = next;
}
