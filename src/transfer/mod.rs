//! Cross-exchange transfer orchestration
//!
//! # State Machine
//!
//! ```text
//! VALIDATING → DISPATCHING → RECORDING → SETTLED
//!      ↓            ↓   ↘
//!   REJECTED    REJECTED  AMBIGUOUS
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Validate before side effects**: every directory check passes before a
//!    provider is contacted
//! 2. **Single dispatch**: `withdraw` is called at most once per attempt and
//!    never retried automatically
//! 3. **Unknown is not failure**: timeouts and transport errors end in
//!    `Ambiguous`, journaled for reconciliation
//! 4. **Record after settle**: a ledger row exists only for accepted
//!    withdrawals; a failed write still reports `Settled`, with a warning
//!
//! Wallet balances are advisory. Concurrent requests from one sender can
//! both pass the balance check; the provider is the authority on funds.

pub mod api;
pub mod coordinator;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod state;
pub mod types;
pub mod validator;

mod integration_tests;

// Re-exports for convenience
pub use api::{TransferApiRequest, TransferApiResponse, parse_transfer_request};
pub use coordinator::{TransferCoordinator, TransferOutcome};
pub use error::{Party, TransferError, ValidationError};
pub use journal::{JournalEntry, JournalError, JournalKind, ReconciliationJournal};
pub use ledger::{InMemoryLedger, LedgerError, LedgerRecorder, PgLedger};
pub use state::TransferState;
pub use types::{
    Settlement, TransactionHistory, TransactionId, TransactionRecord, TransactionStatus,
    TransferRequest, ValidatedTransfer,
};
pub use validator::TransferValidator;
