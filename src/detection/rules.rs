//! Game Prevention Rules

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Governance-configurable anti-gaming thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePreventionRules {
    /// Minimum gap between two consecutive actions (ms)
    pub min_time_between_actions_ms: i64,

    /// Hard cap on actions in the trailing hour
    pub max_actions_per_hour: u32,

    /// How long a blocked user stays blocked (ms)
    pub cooldown_period_ms: i64,

    /// Adjacent same-type ratio above which a window is flagged, in [0, 1]
    pub suspicious_pattern_threshold: f64,
}

impl Default for GamePreventionRules {
    fn default() -> Self {
        Self {
            min_time_between_actions_ms: 5 * 60 * 1000,
            max_actions_per_hour: 10,
            cooldown_period_ms: 30 * 60 * 1000,
            suspicious_pattern_threshold: 0.8,
        }
    }
}

impl GamePreventionRules {
    pub fn min_time_between_actions(&self) -> Duration {
        Duration::milliseconds(self.min_time_between_actions_ms)
    }

    pub fn cooldown_period(&self) -> Duration {
        Duration::milliseconds(self.cooldown_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rules = GamePreventionRules::default();
        assert_eq!(rules.min_time_between_actions(), Duration::minutes(5));
        assert_eq!(rules.cooldown_period(), Duration::minutes(30));
        assert_eq!(rules.max_actions_per_hour, 10);
        assert!((rules.suspicious_pattern_threshold - 0.8).abs() < f64::EPSILON);
    }
}
