//! Integration tests for AWE Guard
//!
//! End-to-end behavior of the public surface: reading validation,
//! suspicious-activity detection, credit processing, and the gate that
//! ties them together.

use async_trait::async_trait;
use awe_guard::{
    ActionGate, CreditError, CreditLedger, CreditTransaction, CreditTransactionProcessor,
    EmissionDataValidator, GamePreventionRules, GuardConfig, InMemoryLedger, ManualClock,
    RetryPolicy, SuspiciousActivityDetector, TransactionStatus, UserAction,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

const NOW: i64 = 1_700_000_000_000;
const MINUTE: i64 = 60 * 1000;

fn detector_at(now: i64) -> SuspiciousActivityDetector {
    SuspiciousActivityDetector::new(GamePreventionRules::default(), Arc::new(ManualClock::new(now)))
}

/// Actions `minutes_ago`, cycling through `types`
fn history(minutes_ago: &[i64], types: &[&str]) -> Vec<UserAction> {
    minutes_ago
        .iter()
        .zip(types.iter().cycle())
        .map(|(m, t)| UserAction::new(NOW - m * MINUTE, *t))
        .collect()
}

fn test_config() -> GuardConfig {
    let mut config = GuardConfig::default();
    config.retry = RetryPolicy {
        retry_backoff_ms: 0,
        ..Default::default()
    };
    config
}

fn test_gate() -> (Arc<ActionGate>, Arc<ManualClock>, Arc<InMemoryLedger>) {
    let clock = Arc::new(ManualClock::new(NOW));
    let ledger = Arc::new(InMemoryLedger::default());
    let gate = ActionGate::with_clock(&test_config(), ledger.clone(), clock.clone());
    (Arc::new(gate), clock, ledger)
}

/// Counts side effects so tests can prove they did not repeat
#[derive(Default)]
struct CountingLedger {
    awards: AtomicU32,
}

#[async_trait]
impl CreditLedger for CountingLedger {
    async fn award(&self, _tx: &CreditTransaction) -> Result<(), CreditError> {
        self.awards.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn convert(&self, _tx: &CreditTransaction) -> Result<(), CreditError> {
        Ok(())
    }
}

// ============================================================================
// Emission Validation Tests
// ============================================================================

mod emission_validation {
    use super::*;

    #[test]
    fn test_bounds_inclusive() {
        let validator = EmissionDataValidator::default();
        for consumption in [0.0, 250.0, 1000.0] {
            for emissions in [0.0, 125.0, 500.0] {
                assert!(validator.validate(consumption, emissions).is_valid);
            }
        }
    }

    #[test]
    fn test_each_dimension_reported_independently() {
        let validator = EmissionDataValidator::default();

        let result = validator.validate(-0.1, 250.0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("consumption"));

        let result = validator.validate(250.0, 500.1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("CO2"));

        let result = validator.validate(1001.0, -1.0);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
    }
}

// ============================================================================
// Detection Tests
// ============================================================================

mod detection {
    use super::*;

    #[test]
    fn test_empty_history_not_suspicious() {
        assert!(!detector_at(NOW).detect(&[]));
    }

    #[test]
    fn test_eleven_actions_in_hour_blocked() {
        let minutes: Vec<i64> = (0..11).map(|i| 55 - i * 5).collect();
        let actions = history(&minutes, &["lights_off", "thermostat_down"]);
        assert!(detector_at(NOW).detect(&actions));
    }

    #[test]
    fn test_three_spaced_alternating_actions_allowed() {
        let actions = history(&[30, 20, 10], &["lights_off", "thermostat_down"]);
        assert!(!detector_at(NOW).detect(&actions));
    }

    #[test]
    fn test_six_identical_actions_flagged_by_pattern() {
        let actions = history(&[55, 45, 35, 25, 15, 5], &["dark_mode"]);
        assert!(detector_at(NOW).detect(&actions));

        // Same spacing, alternating types is fine
        let actions = history(&[55, 45, 35, 25, 15, 5], &["dark_mode", "lights_off"]);
        assert!(!detector_at(NOW).detect(&actions));
    }

    #[test]
    fn test_history_ages_out_of_window() {
        let actions = history(&[55, 45, 35, 25, 15, 5], &["dark_mode"]);
        assert!(!detector_at(NOW + 2 * 60 * MINUTE).detect(&actions));
    }
}

// ============================================================================
// Credit Processing Tests
// ============================================================================

mod credit_processing {
    use super::*;

    #[tokio::test]
    async fn test_valid_award_completes() {
        let processor = CreditTransactionProcessor::new(
            Arc::new(InMemoryLedger::default()),
            RetryPolicy::default(),
        );

        let tx = processor
            .process_with_retries(CreditTransaction::award("user_1", 100.0), 3)
            .await;
        assert_eq!(tx.status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn test_negative_amount_fails_without_retrying() {
        let ledger = Arc::new(CountingLedger::default());
        let processor = CreditTransactionProcessor::new(ledger.clone(), RetryPolicy::default());

        let tx = processor
            .process_with_retries(CreditTransaction::award("user_1", -5.0), 3)
            .await;

        assert_eq!(tx.status, TransactionStatus::Failed);
        assert_eq!(tx.retry_count, 0);
        assert_eq!(ledger.awards.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_completed_transaction_is_idempotent() {
        let ledger = Arc::new(CountingLedger::default());
        let processor = CreditTransactionProcessor::new(ledger.clone(), RetryPolicy::default());

        let done = processor.process(CreditTransaction::award("user_1", 10.0)).await;
        let again = processor.process(done.clone()).await;
        let third = processor.process(again.clone()).await;

        assert_eq!(third.status, TransactionStatus::Completed);
        assert_eq!(third, done);
        assert_eq!(ledger.awards.load(Ordering::SeqCst), 1);
    }
}

// ============================================================================
// Action Gate Tests
// ============================================================================

mod action_gate {
    use super::*;

    #[tokio::test]
    async fn test_tripped_history_produces_no_transaction() {
        let (gate, _, ledger) = test_gate();
        let actions = history(&[10, 9], &["a", "b"]);

        let outcome = gate
            .validate_and_process_user_action("user_1", "lights_off", 50.0, &actions)
            .await;

        assert!(!outcome.success);
        assert!(outcome.transaction.is_none());
        assert_eq!(ledger.balance("user_1").await.credits, 0.0);
        assert_eq!(gate.blocked_attempts("user_1").len(), 1);
    }

    #[tokio::test]
    async fn test_caller_managed_tracking_flow() {
        let (gate, clock, ledger) = test_gate();

        for action in ["lights_off", "thermostat_down", "lights_off"] {
            let history = gate.get_user_actions("user_1");
            let outcome = gate
                .validate_and_process_user_action("user_1", action, 5.0, &history)
                .await;
            assert!(outcome.success, "{} should pass", action);
            assert!(gate.track_user_action("user_1", action));
            clock.advance_minutes(10);
        }

        assert_eq!(gate.get_user_actions("user_1").len(), 3);
        assert_eq!(ledger.balance("user_1").await.credits, 15.0);
    }

    #[tokio::test]
    async fn test_outcome_serializes_for_display() {
        let (gate, _, _) = test_gate();
        let outcome = gate.submit_action("user_1", "lights_off", 5.0).await;

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["transaction"]["status"], "completed");
        assert_eq!(json["transaction"]["type"], "award");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_are_serialized_per_user() {
        let (gate, _, ledger) = test_gate();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.submit_action("user_1", "lights_off", 1.0).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().success {
                successes += 1;
            }
        }

        // At one instant: the first two see at most one prior action, the
        // third sees a zero-gap pair and trips the spacing check and cooldown.
        assert_eq!(successes, 2);
        assert_eq!(gate.get_user_actions("user_1").len(), 2);
        assert_eq!(ledger.balance("user_1").await.credits, 2.0);
        assert_eq!(gate.blocked_attempts("user_1").len(), 6);
    }

    #[tokio::test]
    async fn test_users_do_not_interfere() {
        let (gate, _, _) = test_gate();

        gate.validate_and_process_user_action("user_1", "a", 1.0, &history(&[3, 2, 1], &["a"]))
            .await;
        assert!(gate.cooldown_remaining("user_1").is_some());

        let outcome = gate.submit_action("user_2", "a", 1.0).await;
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn test_prune_clears_expired_state() {
        let (gate, clock, _) = test_gate();
        gate.submit_action("user_1", "lights_off", 1.0).await;

        clock.advance_minutes(25 * 60);
        assert_eq!(gate.prune(), 1);
        assert!(gate.get_user_actions("user_1").is_empty());
    }
}
