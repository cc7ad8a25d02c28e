//! AWE Guard
//!
//! Anti-gaming action validation and credit transaction engine for the
//! office energy rewards dashboard. Decides whether a user-triggered reward
//! action is legitimate and drives the resulting credit award to a terminal
//! state with bounded retries.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── config.rs      - Configuration management
//! ├── logging.rs     - Subscriber setup, user id sanitization
//! ├── clock.rs       - Injected time source
//! ├── validation/    - Emission reading bounds checks
//! ├── activity/      - Per-user action history
//! │   ├── store.rs   - Store trait + in-memory store (ordering enforced)
//! │   └── log.rs     - Server-side stamping, retention
//! ├── detection/     - Anti-gaming checks
//! │   ├── rules.rs   - Governance thresholds
//! │   └── detector.rs - Frequency, spacing and pattern checks
//! ├── credits/       - Credit transactions
//! │   ├── transaction.rs - Transaction records
//! │   ├── ledger.rs  - Balance mutation behind a trait
//! │   └── processor.rs - Bounded retry, deadlines, cancellation
//! └── gate.rs        - Validate-and-reward orchestrator
//! ```
//!
//! ## Flow
//!
//! ```text
//! caller ──► ActionGate ──► SuspiciousActivityDetector ◄── ActivityLog
//!                │
//!                └──► CreditTransactionProcessor ──► CreditLedger
//! ```
//!
//! All state is in memory and lost on restart.

pub mod activity;
pub mod clock;
pub mod config;
pub mod credits;
pub mod detection;
pub mod gate;
pub mod logging;
pub mod validation;

// Re-export main types for convenience
pub use config::{GuardConfig, LoggingConfig};
pub use clock::{Clock, ManualClock, SystemClock};
pub use gate::{ActionGate, ActionOutcome, BlockedAttempt};

pub use activity::{
    ActivityConfig, ActivityError, ActivityLog, ActivityStore, InMemoryActivityStore, UserAction,
};
pub use credits::{
    CancelHandle, CancelSignal, CreditError, CreditLedger, CreditTransaction,
    CreditTransactionProcessor, InMemoryLedger, RetryPolicy, TransactionStatus, TransactionType,
    UserBalance,
};
pub use detection::{GamePreventionRules, SuspicionReason, SuspiciousActivityDetector};
pub use validation::{EmissionDataValidation, EmissionDataValidator, ValidationResult};
