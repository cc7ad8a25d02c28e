//! Credit Transaction Processor
//!
//! Drives a transaction to a terminal state with bounded retries. At most
//! `max_retries + 1` attempts run, strictly one after another. Each attempt
//! is capped by `attempt_timeout`, the whole call by `operation_timeout`,
//! and a [`CancelSignal`] can abandon the call at any await point.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{CreditError, CreditLedger, CreditTransaction, TransactionStatus, TransactionType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub attempt_timeout_ms: u64,
    pub operation_timeout_ms: u64,
    /// Pause between attempts
    pub retry_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            attempt_timeout_ms: 5_000,
            operation_timeout_ms: 30_000,
            retry_backoff_ms: 50,
        }
    }
}

impl RetryPolicy {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Caller side of a cancellation pair
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Receivers may already be gone; nothing to cancel then
        let _ = self.tx.send(true);
    }
}

/// Processor side of a cancellation pair
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn new() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelSignal { rx })
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled; never resolves if the handle is dropped first
    async fn cancelled(&mut self) {
        let closed = self.rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

pub struct CreditTransactionProcessor {
    ledger: Arc<dyn CreditLedger>,
    policy: RetryPolicy,
}

impl CreditTransactionProcessor {
    pub fn new(ledger: Arc<dyn CreditLedger>, policy: RetryPolicy) -> Self {
        Self { ledger, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Process with the configured retry bound
    pub async fn process(&self, transaction: CreditTransaction) -> CreditTransaction {
        self.run(transaction, self.policy.max_retries, None).await
    }

    /// Process with an explicit retry bound
    pub async fn process_with_retries(
        &self,
        transaction: CreditTransaction,
        max_retries: u32,
    ) -> CreditTransaction {
        self.run(transaction, max_retries, None).await
    }

    /// Process until terminal, retries exhausted, or `cancel` fires
    pub async fn process_cancellable(
        &self,
        transaction: CreditTransaction,
        cancel: CancelSignal,
    ) -> CreditTransaction {
        self.run(transaction, self.policy.max_retries, Some(cancel))
            .await
    }

    async fn run(
        &self,
        mut tx: CreditTransaction,
        max_retries: u32,
        mut cancel: Option<CancelSignal>,
    ) -> CreditTransaction {
        if tx.is_terminal() {
            debug!(
                transaction_id = %tx.id,
                status = ?tx.status,
                "Transaction already terminal, skipping"
            );
            return tx;
        }

        let deadline = Instant::now() + self.policy.operation_timeout();

        loop {
            match self.attempt(&tx, deadline, cancel.as_mut()).await {
                Ok(()) => {
                    tx.status = TransactionStatus::Completed;
                    info!(
                        transaction_id = %tx.id,
                        transaction_type = ?tx.transaction_type,
                        amount = tx.amount,
                        retries = tx.retry_count,
                        "Transaction completed"
                    );
                    return tx;
                }
                Err(err) => {
                    tx.reason = Some(err.to_string());
                    warn!(
                        transaction_id = %tx.id,
                        attempt = tx.retry_count + 1,
                        error = %err,
                        "Transaction attempt failed"
                    );

                    if !err.is_retryable() || tx.retry_count >= max_retries {
                        tx.status = TransactionStatus::Failed;
                        warn!(
                            transaction_id = %tx.id,
                            retries = tx.retry_count,
                            reason = %err,
                            "Transaction failed"
                        );
                        return tx;
                    }

                    tx.retry_count += 1;
                    self.backoff(deadline, cancel.as_mut()).await;
                }
            }
        }
    }

    async fn attempt(
        &self,
        tx: &CreditTransaction,
        deadline: Instant,
        cancel: Option<&mut CancelSignal>,
    ) -> Result<(), CreditError> {
        if !tx.amount.is_finite() || tx.amount <= 0.0 {
            return Err(CreditError::InvalidAmount(tx.amount));
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(CreditError::DeadlineExceeded);
        }

        let attempt_timeout = self.policy.attempt_timeout();
        let budget = attempt_timeout.min(remaining);
        let ledger_call = async {
            match tx.transaction_type {
                TransactionType::Award => self.ledger.award(tx).await,
                TransactionType::Conversion => self.ledger.convert(tx).await,
            }
        };
        let timed = tokio::time::timeout(budget, ledger_call);

        let outcome = match cancel {
            Some(signal) => {
                if signal.is_cancelled() {
                    return Err(CreditError::Cancelled);
                }
                tokio::select! {
                    biased;
                    _ = signal.cancelled() => return Err(CreditError::Cancelled),
                    outcome = timed => outcome,
                }
            }
            None => timed.await,
        };

        match outcome {
            Ok(result) => result,
            Err(_) if budget < attempt_timeout => Err(CreditError::DeadlineExceeded),
            Err(_) => Err(CreditError::AttemptTimedOut(budget)),
        }
    }

    /// Sleep between attempts; cut short by the deadline or cancellation,
    /// which the next attempt then reports.
    async fn backoff(&self, deadline: Instant, cancel: Option<&mut CancelSignal>) {
        let pause = self
            .policy
            .retry_backoff()
            .min(deadline.saturating_duration_since(Instant::now()));
        if pause.is_zero() {
            return;
        }

        match cancel {
            Some(signal) => {
                tokio::select! {
                    _ = signal.cancelled() => {}
                    _ = tokio::time::sleep(pause) => {}
                }
            }
            None => tokio::time::sleep(pause).await,
        }
    }
}
