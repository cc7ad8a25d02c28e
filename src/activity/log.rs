//! Activity Log - server-side stamping over an [`ActivityStore`]

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::{ActivityError, ActivityStore, InMemoryActivityStore, UserAction};
use crate::clock::{Clock, SystemClock};
use crate::logging::log_user_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Oldest actions are dropped past this count
    pub max_actions_per_user: usize,
    /// Actions older than this are removed by [`ActivityLog::prune_expired`]
    pub retention_hours: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            max_actions_per_user: 500,
            retention_hours: 24,
        }
    }
}

#[derive(Clone)]
pub struct ActivityLog {
    store: Arc<dyn ActivityStore>,
    clock: Arc<dyn Clock>,
    retention_hours: u64,
    sanitize_user_ids: bool,
}

impl ActivityLog {
    pub fn new(store: Arc<dyn ActivityStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            retention_hours: ActivityConfig::default().retention_hours,
            sanitize_user_ids: true,
        }
    }

    /// In-memory store and wall clock sized from config
    pub fn from_config(config: &ActivityConfig) -> Self {
        Self::new(
            Arc::new(InMemoryActivityStore::new(config.max_actions_per_user)),
            Arc::new(SystemClock),
        )
        .with_retention_hours(config.retention_hours)
    }

    pub fn with_retention_hours(mut self, hours: u64) -> Self {
        self.retention_hours = hours;
        self
    }

    /// Whether user ids are masked in log fields (on by default)
    pub fn with_sanitized_user_ids(mut self, sanitize: bool) -> Self {
        self.sanitize_user_ids = sanitize;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Record an accepted action at the current time.
    ///
    /// The timestamp never goes below the user's last recorded action, so a
    /// wall clock stepping backwards cannot break chronological order.
    pub fn track_user_action(
        &self,
        user_id: &str,
        action_type: &str,
    ) -> Result<UserAction, ActivityError> {
        let now = self.clock.now_ms();
        let timestamp = match self.store.last_timestamp(user_id) {
            Some(last) if last > now => last,
            _ => now,
        };

        let action = UserAction::new(timestamp, action_type);
        self.store.append(user_id, action.clone())?;

        debug!(
            user_id = %log_user_id(user_id, self.sanitize_user_ids),
            action_type = %action_type,
            timestamp = timestamp,
            "Tracked user action"
        );

        Ok(action)
    }

    pub fn get_user_actions(&self, user_id: &str) -> Vec<UserAction> {
        self.store.get(user_id)
    }

    /// Remove actions outside the retention window
    pub fn prune_expired(&self) -> usize {
        let cutoff = self.retention_cutoff_ms();
        self.store.prune_older_than(cutoff)
    }

    /// Epoch ms before which records fall outside the retention window
    pub fn retention_cutoff_ms(&self) -> i64 {
        let window_ms = i64::try_from(self.retention_hours)
            .unwrap_or(i64::MAX)
            .saturating_mul(60 * 60 * 1000);
        self.clock.now_ms().saturating_sub(window_ms)
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::from_config(&ActivityConfig::default())
    }
}
