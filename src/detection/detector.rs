//! Suspicious Activity Detector
//!
//! Pure decision over a snapshot of a user's history. Input must be in
//! non-decreasing timestamp order; the activity store guarantees this.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::GamePreventionRules;
use crate::activity::UserAction;
use crate::clock::{Clock, SystemClock};

/// Length of the trailing window all checks look at
pub const RECENT_WINDOW_MS: i64 = 60 * 60 * 1000;

/// Which check blocked the action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum SuspicionReason {
    /// Too many actions in the trailing hour
    FrequencyCap { recent: usize, limit: u32 },

    /// Two consecutive actions closer than the minimum gap
    ActionsTooClose { gap_ms: i64, min_gap_ms: i64 },

    /// Same action repeated back to back too often
    RepetitivePattern { ratio: f64, threshold: f64 },
}

impl SuspicionReason {
    pub fn description(&self) -> &'static str {
        match self {
            SuspicionReason::FrequencyCap { .. } => "Too many actions in the last hour",
            SuspicionReason::ActionsTooClose { .. } => "Actions submitted too close together",
            SuspicionReason::RepetitivePattern { .. } => "Repetitive action pattern detected",
        }
    }
}

pub struct SuspiciousActivityDetector {
    rules: GamePreventionRules,
    clock: Arc<dyn Clock>,
}

impl SuspiciousActivityDetector {
    pub fn new(rules: GamePreventionRules, clock: Arc<dyn Clock>) -> Self {
        Self { rules, clock }
    }

    pub fn rules(&self) -> &GamePreventionRules {
        &self.rules
    }

    /// True if the action should be blocked under the default rules
    pub fn detect(&self, actions: &[UserAction]) -> bool {
        self.evaluate(actions).is_some()
    }

    /// Same as [`detect`](Self::detect) with per-call rules
    pub fn detect_with_rules(&self, actions: &[UserAction], rules: &GamePreventionRules) -> bool {
        Self::evaluate_at(actions, rules, self.clock.now_ms()).is_some()
    }

    pub fn evaluate(&self, actions: &[UserAction]) -> Option<SuspicionReason> {
        Self::evaluate_at(actions, &self.rules, self.clock.now_ms())
    }

    /// Run all checks against `now_ms`, returning the first that fires
    pub fn evaluate_at(
        actions: &[UserAction],
        rules: &GamePreventionRules,
        now_ms: i64,
    ) -> Option<SuspicionReason> {
        if actions.is_empty() {
            return None;
        }

        let recent: Vec<&UserAction> = actions
            .iter()
            .filter(|a| now_ms.saturating_sub(a.timestamp) < RECENT_WINDOW_MS)
            .collect();

        if recent.len() > rules.max_actions_per_hour as usize {
            return Some(SuspicionReason::FrequencyCap {
                recent: recent.len(),
                limit: rules.max_actions_per_hour,
            });
        }

        for pair in recent.windows(2) {
            let gap_ms = pair[1].timestamp.saturating_sub(pair[0].timestamp);
            if gap_ms < rules.min_time_between_actions_ms {
                return Some(SuspicionReason::ActionsTooClose {
                    gap_ms,
                    min_gap_ms: rules.min_time_between_actions_ms,
                });
            }
        }

        // A single action has no adjacent pairs, so its ratio is 0
        if recent.is_empty() {
            return None;
        }
        let repeats = recent
            .windows(2)
            .filter(|pair| pair[0].action_type == pair[1].action_type)
            .count();
        let ratio = repeats as f64 / recent.len() as f64;

        if ratio > rules.suspicious_pattern_threshold {
            return Some(SuspicionReason::RepetitivePattern {
                ratio,
                threshold: rules.suspicious_pattern_threshold,
            });
        }

        None
    }
}

impl Default for SuspiciousActivityDetector {
    fn default() -> Self {
        Self::new(GamePreventionRules::default(), Arc::new(SystemClock))
    }
}
