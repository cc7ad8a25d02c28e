//! Credit Transaction Records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Disambiguates ids minted in the same millisecond
static TRANSACTION_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Credits granted for an accepted action
    Award,
    /// Credits exchanged for AWE points
    Conversion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditTransaction {
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    /// Creation time, serialized as RFC 3339
    pub timestamp: DateTime<Utc>,
    /// Last error message, if any attempt failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub retry_count: u32,
}

impl CreditTransaction {
    /// New pending transaction with a process-unique id. The id carries no
    /// user data so it can be logged as is.
    pub fn new(user_id: &str, amount: f64, transaction_type: TransactionType) -> Self {
        let now = Utc::now();
        let seq = TRANSACTION_SEQ.fetch_add(1, Ordering::Relaxed);

        Self {
            id: format!("tx-{}-{}", now.timestamp_millis(), seq),
            user_id: user_id.to_string(),
            amount,
            transaction_type,
            status: TransactionStatus::Pending,
            timestamp: now,
            reason: None,
            retry_count: 0,
        }
    }

    pub fn award(user_id: &str, amount: f64) -> Self {
        Self::new(user_id, amount, TransactionType::Award)
    }

    pub fn conversion(user_id: &str, amount: f64) -> Self {
        Self::new(user_id, amount, TransactionType::Conversion)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_transaction_is_pending() {
        let tx = CreditTransaction::award("user_1", 100.0);
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.retry_count, 0);
        assert!(tx.reason.is_none());
        assert!(tx.id.starts_with("tx-"));
        assert!(!tx.id.contains("user_1"));
        assert!(!tx.is_terminal());
    }

    #[test]
    fn test_ids_unique_within_millisecond() {
        let ids: HashSet<String> = (0..1000)
            .map(|_| CreditTransaction::award("user_1", 1.0).id)
            .collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_serialized_shape() {
        let tx = CreditTransaction::conversion("user_1", 25.0);
        let json = serde_json::to_value(&tx).unwrap();

        assert_eq!(json["type"], "conversion");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["userId"], "user_1");
        assert_eq!(json["retryCount"], 0);
        assert!(json.get("reason").is_none());
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }
}
