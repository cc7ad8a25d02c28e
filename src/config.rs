use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::info;

use crate::activity::ActivityConfig;
use crate::credits::RetryPolicy;
use crate::detection::GamePreventionRules;
use crate::validation::EmissionDataValidation;

/// Configuration for the action guard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Bounds for energy readings
    pub emission: EmissionDataValidation,
    /// Anti-gaming thresholds
    pub rules: GamePreventionRules,
    /// Credit transaction retry policy
    pub retry: RetryPolicy,
    /// Activity history sizing
    pub activity: ActivityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Mask user ids in log fields
    pub sanitize_user_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            sanitize_user_ids: true,
        }
    }
}

/// Parse `name` into `target` if it is set
fn overlay<T>(name: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Ok(raw) = env::var(name) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} value: {}", name, raw))?;
    }
    Ok(())
}

impl GuardConfig {
    /// Load configuration from `AWE_GUARD_*` environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Emission bounds
        overlay("AWE_GUARD_MIN_CONSUMPTION", &mut config.emission.min_consumption)?;
        overlay("AWE_GUARD_MAX_CONSUMPTION", &mut config.emission.max_consumption)?;
        overlay("AWE_GUARD_MIN_EMISSIONS", &mut config.emission.min_emissions)?;
        overlay("AWE_GUARD_MAX_EMISSIONS", &mut config.emission.max_emissions)?;

        // Anti-gaming rules
        overlay(
            "AWE_GUARD_MIN_TIME_BETWEEN_ACTIONS_MS",
            &mut config.rules.min_time_between_actions_ms,
        )?;
        overlay(
            "AWE_GUARD_MAX_ACTIONS_PER_HOUR",
            &mut config.rules.max_actions_per_hour,
        )?;
        overlay("AWE_GUARD_COOLDOWN_MS", &mut config.rules.cooldown_period_ms)?;
        overlay(
            "AWE_GUARD_PATTERN_THRESHOLD",
            &mut config.rules.suspicious_pattern_threshold,
        )?;

        // Retry policy
        overlay("AWE_GUARD_MAX_RETRIES", &mut config.retry.max_retries)?;
        overlay(
            "AWE_GUARD_ATTEMPT_TIMEOUT_MS",
            &mut config.retry.attempt_timeout_ms,
        )?;
        overlay(
            "AWE_GUARD_OPERATION_TIMEOUT_MS",
            &mut config.retry.operation_timeout_ms,
        )?;
        overlay("AWE_GUARD_RETRY_BACKOFF_MS", &mut config.retry.retry_backoff_ms)?;

        // Activity history
        overlay(
            "AWE_GUARD_MAX_ACTIONS_PER_USER",
            &mut config.activity.max_actions_per_user,
        )?;
        overlay(
            "AWE_GUARD_RETENTION_HOURS",
            &mut config.activity.retention_hours,
        )?;

        // Logging
        if let Ok(level) = env::var("AWE_GUARD_LOG_LEVEL") {
            config.logging.level = level;
        }
        overlay(
            "AWE_GUARD_SANITIZE_USER_IDS",
            &mut config.logging.sanitize_user_ids,
        )?;

        config.validate()?;

        info!(
            max_actions_per_hour = config.rules.max_actions_per_hour,
            max_retries = config.retry.max_retries,
            "Loaded guard configuration"
        );

        Ok(config)
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> Result<()> {
        let e = &self.emission;
        if e.min_consumption > e.max_consumption {
            return Err(anyhow::anyhow!(
                "Consumption bounds are inverted: min {} > max {}",
                e.min_consumption,
                e.max_consumption
            ));
        }
        if e.min_emissions > e.max_emissions {
            return Err(anyhow::anyhow!(
                "Emission bounds are inverted: min {} > max {}",
                e.min_emissions,
                e.max_emissions
            ));
        }

        let r = &self.rules;
        if r.max_actions_per_hour == 0 {
            return Err(anyhow::anyhow!("maxActionsPerHour must be non-zero"));
        }
        if r.min_time_between_actions_ms < 0 || r.cooldown_period_ms < 0 {
            return Err(anyhow::anyhow!("Durations cannot be negative"));
        }
        if !(0.0..=1.0).contains(&r.suspicious_pattern_threshold) {
            return Err(anyhow::anyhow!(
                "Suspicious pattern threshold must be within [0, 1]: {}",
                r.suspicious_pattern_threshold
            ));
        }

        if self.retry.attempt_timeout_ms == 0 {
            return Err(anyhow::anyhow!("Attempt timeout must be non-zero"));
        }
        if self.retry.operation_timeout_ms < self.retry.attempt_timeout_ms {
            return Err(anyhow::anyhow!(
                "Operation timeout ({} ms) is shorter than one attempt ({} ms)",
                self.retry.operation_timeout_ms,
                self.retry.attempt_timeout_ms
            ));
        }

        if self.activity.max_actions_per_user == 0 {
            return Err(anyhow::anyhow!("max_actions_per_user must be non-zero"));
        }

        Ok(())
    }
}
