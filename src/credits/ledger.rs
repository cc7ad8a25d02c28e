//! Credit Ledger
//!
//! The processor owns retry policy; the ledger owns balances. Applying the
//! same transaction id twice must be a no-op so a retry after a timed-out
//! attempt cannot double-credit.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{CreditError, CreditTransaction};

#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Credit `tx.amount` to `tx.user_id`
    async fn award(&self, tx: &CreditTransaction) -> Result<(), CreditError>;

    /// Exchange `tx.amount` credits for AWE points
    async fn convert(&self, tx: &CreditTransaction) -> Result<(), CreditError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UserBalance {
    pub credits: f64,
    pub awe_points: f64,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<String, UserBalance>,
    applied: HashSet<String>,
}

/// Process-local ledger; balances are lost on restart
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
    /// AWE points granted per credit converted
    conversion_rate: f64,
}

impl InMemoryLedger {
    pub fn new(conversion_rate: f64) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::default())),
            conversion_rate,
        }
    }

    pub async fn balance(&self, user_id: &str) -> UserBalance {
        let state = self.state.read().await;
        state.balances.get(user_id).copied().unwrap_or_default()
    }

    pub async fn is_applied(&self, transaction_id: &str) -> bool {
        self.state.read().await.applied.contains(transaction_id)
    }

    pub async fn applied_count(&self) -> usize {
        self.state.read().await.applied.len()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[async_trait]
impl CreditLedger for InMemoryLedger {
    async fn award(&self, tx: &CreditTransaction) -> Result<(), CreditError> {
        let mut state = self.state.write().await;
        if state.applied.contains(&tx.id) {
            debug!(transaction_id = %tx.id, "Award already applied");
            return Ok(());
        }

        let balance = state.balances.entry(tx.user_id.clone()).or_default();
        balance.credits += tx.amount;
        let credits = balance.credits;
        state.applied.insert(tx.id.clone());

        info!(
            transaction_id = %tx.id,
            amount = tx.amount,
            credits = credits,
            "Credits awarded"
        );

        Ok(())
    }

    async fn convert(&self, tx: &CreditTransaction) -> Result<(), CreditError> {
        let mut state = self.state.write().await;
        if state.applied.contains(&tx.id) {
            debug!(transaction_id = %tx.id, "Conversion already applied");
            return Ok(());
        }

        let balance = state.balances.entry(tx.user_id.clone()).or_default();
        if balance.credits < tx.amount {
            return Err(CreditError::InsufficientBalance {
                available: balance.credits,
                requested: tx.amount,
            });
        }

        let points = tx.amount * self.conversion_rate;
        balance.credits -= tx.amount;
        balance.awe_points += points;
        state.applied.insert(tx.id.clone());

        info!(
            transaction_id = %tx.id,
            amount = tx.amount,
            awe_points = points,
            "Credits converted to AWE points"
        );

        Ok(())
    }
}
