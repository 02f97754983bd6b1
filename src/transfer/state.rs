//! Transfer FSM State Definitions
//!
//! ```text
//! VALIDATING → DISPATCHING → RECORDING → SETTLED
//!      ↓            ↓   ↘
//!   REJECTED    REJECTED  AMBIGUOUS
//! ```
//!
//! States live only for the duration of one request; nothing is persisted
//! before the provider answers.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Read-only checks against the account directory
    Validating,

    /// Provider selected, withdraw in flight (at most one call)
    Dispatching,

    /// Provider accepted; writing the ledger row
    Recording,

    /// Terminal: provider accepted the withdrawal
    Settled,

    /// Terminal: validation failed or provider declined. Nothing moved.
    Rejected,

    /// Terminal: provider outcome unknown (timeout, network, 5xx)
    /// Needs out-of-band reconciliation; never retried automatically.
    Ambiguous,
}

impl TransferState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferState::Settled | TransferState::Rejected | TransferState::Ambiguous
        )
    }

    /// Whether the next state is a legal FSM edge
    pub fn can_transition_to(&self, next: TransferState) -> bool {
        matches!(
            (self, next),
            (TransferState::Validating, TransferState::Dispatching)
                | (TransferState::Validating, TransferState::Rejected)
                | (TransferState::Dispatching, TransferState::Recording)
                | (TransferState::Dispatching, TransferState::Rejected)
                | (TransferState::Dispatching, TransferState::Ambiguous)
                | (TransferState::Recording, TransferState::Settled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Validating => "VALIDATING",
            TransferState::Dispatching => "DISPATCHING",
            TransferState::Recording => "RECORDING",
            TransferState::Settled => "SETTLED",
            TransferState::Rejected => "REJECTED",
            TransferState::Ambiguous => "AMBIGUOUS",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TransferState::Settled.is_terminal());
        assert!(TransferState::Rejected.is_terminal());
        assert!(TransferState::Ambiguous.is_terminal());

        assert!(!TransferState::Validating.is_terminal());
        assert!(!TransferState::Dispatching.is_terminal());
        assert!(!TransferState::Recording.is_terminal());
    }

    #[test]
    fn test_transitions() {
        assert!(TransferState::Validating.can_transition_to(TransferState::Dispatching));
        assert!(TransferState::Dispatching.can_transition_to(TransferState::Ambiguous));
        assert!(TransferState::Recording.can_transition_to(TransferState::Settled));

        // Recording never falls back to Rejected: the withdrawal already happened
        assert!(!TransferState::Recording.can_transition_to(TransferState::Rejected));
        assert!(!TransferState::Validating.can_transition_to(TransferState::Ambiguous));
        assert!(!TransferState::Settled.can_transition_to(TransferState::Dispatching));
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferState::Ambiguous.to_string(), "AMBIGUOUS");
    }
}
