//! Credit Transactions
//!
//! A reward action produces one [`CreditTransaction`] which the
//! [`CreditTransactionProcessor`] drives to a terminal state against a
//! [`CreditLedger`].
//!
//! ## State Machine
//!
//! ```text
//!            attempt ok
//! pending ───────────────► completed
//!    │  ▲
//!    │  │ retryable error, retry_count < max_retries
//!    └──┘
//!    │
//!    │ fatal error, or retries exhausted
//!    ▼
//!  failed
//! ```
//!
//! Status flips exactly once into a terminal state. Terminal transactions
//! passed back into the processor are returned untouched.

mod ledger;
mod processor;
mod transaction;

pub use ledger::{CreditLedger, InMemoryLedger, UserBalance};
pub use processor::{CancelHandle, CancelSignal, CreditTransactionProcessor, RetryPolicy};
pub use transaction::{CreditTransaction, TransactionStatus, TransactionType};

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CreditError {
    #[error("Invalid credit amount: {0}")]
    InvalidAmount(f64),

    #[error("Insufficient credits: have {available}, need {requested}")]
    InsufficientBalance { available: f64, requested: f64 },

    #[error("Ledger unavailable: {0}")]
    Ledger(String),

    #[error("Attempt timed out after {0:?}")]
    AttemptTimedOut(Duration),

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,

    #[error("Operation cancelled")]
    Cancelled,
}

impl CreditError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, CreditError::Ledger(_) | CreditError::AttemptTimedOut(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(CreditError::Ledger("down".into()).is_retryable());
        assert!(CreditError::AttemptTimedOut(Duration::from_secs(1)).is_retryable());
        assert!(!CreditError::InvalidAmount(-5.0).is_retryable());
        assert!(!CreditError::Cancelled.is_retryable());
        assert!(!CreditError::DeadlineExceeded.is_retryable());
        assert!(!CreditError::InsufficientBalance {
            available: 1.0,
            requested: 2.0
        }
        .is_retryable());
    }

    #[test]
    fn test_invalid_amount_message() {
        assert_eq!(
            CreditError::InvalidAmount(-5.0).to_string(),
            "Invalid credit amount: -5"
        );
    }
}
