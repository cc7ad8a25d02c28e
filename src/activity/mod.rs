//! Per-user activity history
//!
//! Accepted reward actions are appended in chronological order and read
//! back as a snapshot for suspicious-activity detection.
//!
//! ## Ordering
//!
//! ```text
//! ┌──────────────┐  stamp max(now, last)  ┌──────────────────────┐
//! │ ActivityLog  │───────────────────────►│ ActivityStore        │
//! │ (server-side │                        │ rejects out-of-order │
//! │  timestamps) │◄───────────────────────│ appends, bounded     │
//! └──────────────┘      get(user_id)      └──────────────────────┘
//! ```
//!
//! The detector never sorts, so the store is the place ordering is enforced.

mod log;
mod store;

pub use log::{ActivityConfig, ActivityLog};
pub use store::{ActivityStore, InMemoryActivityStore};

use serde::{Deserialize, Serialize};

/// A single accepted action. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAction {
    /// Epoch milliseconds
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub action_type: String,
}

impl UserAction {
    pub fn new(timestamp: i64, action_type: impl Into<String>) -> Self {
        Self {
            timestamp,
            action_type: action_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivityError {
    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("out-of-order append: {attempted} is earlier than last action at {last}")]
    OutOfOrder {
        user_id: String,
        last: i64,
        attempted: i64,
    },
}
