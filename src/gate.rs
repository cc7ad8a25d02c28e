//! Action Gate - validate-and-reward orchestrator
//!
//! Combines the suspicious-activity detector, the credit processor and the
//! activity log into the single call the UI layer makes. Nothing here
//! returns an error to the caller: every path resolves to an
//! [`ActionOutcome`] whose `message` is fit for direct display.
//!
//! Blocked attempts are not written to the activity log, so they never feed
//! future detection. They are kept in a bounded per-user audit trail and the
//! user is held in cooldown for `cooldown_period`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::activity::{ActivityLog, UserAction};
use crate::clock::{Clock, SystemClock};
use crate::config::GuardConfig;
use crate::credits::{
    CreditLedger, CreditTransaction, CreditTransactionProcessor, TransactionStatus,
};
use crate::detection::{SuspicionReason, SuspiciousActivityDetector};
use crate::logging::log_user_id;
use crate::validation::{EmissionDataValidator, ValidationResult};

/// Audit entries kept per user; oldest dropped first
const MAX_BLOCKED_ATTEMPTS_PER_USER: usize = 100;

const INVALID_USER_MESSAGE: &str = "Invalid user id";

pub const BLOCKED_MESSAGE: &str =
    "Action blocked due to suspicious activity. Please wait before trying again.";

/// Result of one gated action, suitable for direct display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<CreditTransaction>,
}

impl ActionOutcome {
    fn blocked() -> Self {
        Self {
            success: false,
            message: BLOCKED_MESSAGE.to_string(),
            transaction: None,
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            transaction: None,
        }
    }
}

/// A rejected attempt, retained for audit only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedAttempt {
    pub user_id: String,
    pub action_type: String,
    pub attempted_at: DateTime<Utc>,
    pub reason: String,
    /// Check-specific context
    pub details: serde_json::Value,
}

pub struct ActionGate {
    detector: SuspiciousActivityDetector,
    processor: CreditTransactionProcessor,
    activity: ActivityLog,
    validator: EmissionDataValidator,
    clock: Arc<dyn Clock>,

    /// user_id -> blocked until (epoch ms)
    cooldowns: DashMap<String, i64>,

    /// Pruned with the activity retention window
    blocked: DashMap<String, VecDeque<BlockedAttempt>>,

    /// Serializes check-then-log per user
    user_locks: DashMap<String, Arc<Mutex<()>>>,

    sanitize_logs: bool,
}

impl ActionGate {
    pub fn new(
        detector: SuspiciousActivityDetector,
        processor: CreditTransactionProcessor,
        activity: ActivityLog,
    ) -> Self {
        let clock = activity.clock().clone();
        Self {
            detector,
            processor,
            activity,
            validator: EmissionDataValidator::default(),
            clock,
            cooldowns: DashMap::new(),
            blocked: DashMap::new(),
            user_locks: DashMap::new(),
            sanitize_logs: true,
        }
    }

    /// Wire every component from config with the wall clock
    pub fn from_config(config: &GuardConfig, ledger: Arc<dyn CreditLedger>) -> Self {
        Self::with_clock(config, ledger, Arc::new(SystemClock))
    }

    /// Wire every component from config sharing one clock
    pub fn with_clock(
        config: &GuardConfig,
        ledger: Arc<dyn CreditLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(crate::activity::InMemoryActivityStore::new(
            config.activity.max_actions_per_user,
        ));
        let activity = ActivityLog::new(store, clock.clone())
            .with_retention_hours(config.activity.retention_hours)
            .with_sanitized_user_ids(config.logging.sanitize_user_ids);
        let detector = SuspiciousActivityDetector::new(config.rules.clone(), clock);
        let processor = CreditTransactionProcessor::new(ledger, config.retry.clone());

        let mut gate = Self::new(detector, processor, activity);
        gate.validator = EmissionDataValidator::new(config.emission);
        gate.sanitize_logs = config.logging.sanitize_user_ids;
        gate
    }

    /// Run detection over a caller-supplied history and, if clean, award
    /// `credit_amount`. Does not touch the activity log; callers using this
    /// entry point record accepted actions with [`track_user_action`](Self::track_user_action).
    pub async fn validate_and_process_user_action(
        &self,
        user_id: &str,
        action_type: &str,
        credit_amount: f64,
        history: &[UserAction],
    ) -> ActionOutcome {
        if user_id.is_empty() {
            return ActionOutcome::rejected(INVALID_USER_MESSAGE);
        }

        let now = self.clock.now_ms();

        if let Some(until) = self.cooldown_until(user_id, now) {
            self.record_blocked(
                user_id,
                action_type,
                now,
                "User is in cooldown after suspicious activity",
                serde_json::json!({ "cooldown_until_ms": until }),
            );
            return ActionOutcome::blocked();
        }

        if let Some(reason) =
            SuspiciousActivityDetector::evaluate_at(history, self.detector.rules(), now)
        {
            let until = now.saturating_add(self.detector.rules().cooldown_period_ms);
            if self.detector.rules().cooldown_period_ms > 0 {
                self.cooldowns.insert(user_id.to_string(), until);
            }
            self.record_blocked(
                user_id,
                action_type,
                now,
                reason.description(),
                Self::reason_details(&reason, history.len()),
            );
            return ActionOutcome::blocked();
        }

        let transaction = self
            .processor
            .process(CreditTransaction::award(user_id, credit_amount))
            .await;

        if transaction.status == TransactionStatus::Completed {
            info!(
                user_id = %self.log_id(user_id),
                transaction_id = %transaction.id,
                action_type = %action_type,
                "Action rewarded"
            );
            ActionOutcome {
                success: true,
                message: "Credits awarded successfully".to_string(),
                transaction: Some(transaction),
            }
        } else {
            ActionOutcome {
                success: false,
                message: format!(
                    "Failed to award credits: {}",
                    transaction.reason.as_deref().unwrap_or("unknown error")
                ),
                transaction: Some(transaction),
            }
        }
    }

    /// Atomic check-then-log for one user: reads history from the activity
    /// log, gates the action, and records it only if credits were awarded.
    /// Concurrent calls for the same user run one at a time.
    pub async fn submit_action(
        &self,
        user_id: &str,
        action_type: &str,
        credit_amount: f64,
    ) -> ActionOutcome {
        if user_id.is_empty() {
            return ActionOutcome::rejected(INVALID_USER_MESSAGE);
        }

        let lock = self
            .user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let outcome = {
            let _guard = lock.lock().await;

            let history = self.activity.get_user_actions(user_id);
            let outcome = self
                .validate_and_process_user_action(user_id, action_type, credit_amount, &history)
                .await;

            if outcome.success {
                if let Err(e) = self.activity.track_user_action(user_id, action_type) {
                    warn!(
                        user_id = %self.log_id(user_id),
                        error = %e,
                        "Awarded action could not be recorded"
                    );
                }
            }
            outcome
        };

        drop(lock);
        self.user_locks
            .remove_if(user_id, |_, l| Arc::strong_count(l) == 1);

        outcome
    }

    /// Exchange credits for AWE points. Conversions are not reward actions
    /// and skip detection.
    pub async fn convert_credits(&self, user_id: &str, amount: f64) -> ActionOutcome {
        if user_id.is_empty() {
            return ActionOutcome::rejected(INVALID_USER_MESSAGE);
        }

        let transaction = self
            .processor
            .process(CreditTransaction::conversion(user_id, amount))
            .await;

        if transaction.status == TransactionStatus::Completed {
            ActionOutcome {
                success: true,
                message: "Credits converted to AWE points".to_string(),
                transaction: Some(transaction),
            }
        } else {
            ActionOutcome {
                success: false,
                message: format!(
                    "Failed to convert credits: {}",
                    transaction.reason.as_deref().unwrap_or("unknown error")
                ),
                transaction: Some(transaction),
            }
        }
    }

    /// Bounds-check a consumption/emissions reading before it is displayed
    /// or used to compute rewards
    pub fn validate_reading(&self, consumption: f64, emissions: f64) -> ValidationResult {
        self.validator.validate(consumption, emissions)
    }

    /// Record an accepted action. Returns false if the log refused it.
    pub fn track_user_action(&self, user_id: &str, action_type: &str) -> bool {
        match self.activity.track_user_action(user_id, action_type) {
            Ok(_) => true,
            Err(e) => {
                warn!(user_id = %self.log_id(user_id), error = %e, "Could not track user action");
                false
            }
        }
    }

    pub fn get_user_actions(&self, user_id: &str) -> Vec<UserAction> {
        self.activity.get_user_actions(user_id)
    }

    pub fn blocked_attempts(&self, user_id: &str) -> Vec<BlockedAttempt> {
        self.blocked
            .get(user_id)
            .map(|entry| entry.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Time left before the user may act again, if in cooldown
    pub fn cooldown_remaining(&self, user_id: &str) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.cooldown_until(user_id, now)
            .map(|until| Duration::milliseconds(until - now))
    }

    /// Prune expired activity, lapsed cooldowns, and audit trails whose
    /// newest entry is past the retention window
    pub fn prune(&self) -> usize {
        let now = self.clock.now_ms();
        self.cooldowns.retain(|_, until| *until > now);

        let cutoff = self.activity.retention_cutoff_ms();
        self.blocked.retain(|_, attempts| {
            attempts
                .back()
                .map_or(false, |a| a.attempted_at.timestamp_millis() >= cutoff)
        });

        self.activity.prune_expired()
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn processor(&self) -> &CreditTransactionProcessor {
        &self.processor
    }

    fn cooldown_until(&self, user_id: &str, now: i64) -> Option<i64> {
        self.cooldowns
            .get(user_id)
            .map(|until| *until)
            .filter(|until| *until > now)
    }

    fn record_blocked(
        &self,
        user_id: &str,
        action_type: &str,
        now: i64,
        reason: &str,
        details: serde_json::Value,
    ) {
        warn!(
            user_id = %self.log_id(user_id),
            action_type = %action_type,
            reason = %reason,
            "Blocked suspicious action"
        );

        let attempt = BlockedAttempt {
            user_id: user_id.to_string(),
            action_type: action_type.to_string(),
            attempted_at: Utc.timestamp_millis_opt(now).single().unwrap_or_else(Utc::now),
            reason: reason.to_string(),
            details,
        };

        let mut entry = self.blocked.entry(user_id.to_string()).or_default();
        entry.push_back(attempt);
        if entry.len() > MAX_BLOCKED_ATTEMPTS_PER_USER {
            entry.pop_front();
            info!(user_id = %self.log_id(user_id), "Blocked-attempt audit trail trimmed");
        }
    }

    fn reason_details(reason: &SuspicionReason, history_len: usize) -> serde_json::Value {
        serde_json::json!({
            "detection": reason,
            "history_len": history_len,
        })
    }

    fn log_id(&self, user_id: &str) -> String {
        log_user_id(user_id, self.sanitize_logs)
    }
}
