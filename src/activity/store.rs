//! Activity Store
//!
//! Keyed append-only storage behind a trait so a persistent store with TTL
//! eviction can replace the in-memory one.

use dashmap::DashMap;
use std::collections::VecDeque;
use tracing::debug;

use super::{ActivityError, UserAction};

pub trait ActivityStore: Send + Sync {
    /// Snapshot of a user's actions, oldest first
    fn get(&self, user_id: &str) -> Vec<UserAction>;

    /// Append an action. Must reject timestamps earlier than the user's last action.
    fn append(&self, user_id: &str, action: UserAction) -> Result<(), ActivityError>;

    /// Timestamp of the user's most recent action
    fn last_timestamp(&self, user_id: &str) -> Option<i64> {
        self.get(user_id).last().map(|a| a.timestamp)
    }

    /// Drop actions older than `cutoff_ms`; returns how many were removed
    fn prune_older_than(&self, cutoff_ms: i64) -> usize;
}

/// Process-local store; contents are lost on restart
#[derive(Debug)]
pub struct InMemoryActivityStore {
    actions: DashMap<String, VecDeque<UserAction>>,
    max_actions_per_user: usize,
}

impl InMemoryActivityStore {
    pub fn new(max_actions_per_user: usize) -> Self {
        Self {
            actions: DashMap::new(),
            max_actions_per_user: max_actions_per_user.max(1),
        }
    }

    pub fn user_count(&self) -> usize {
        self.actions.len()
    }
}

impl Default for InMemoryActivityStore {
    fn default() -> Self {
        Self::new(500)
    }
}

impl ActivityStore for InMemoryActivityStore {
    fn get(&self, user_id: &str) -> Vec<UserAction> {
        self.actions
            .get(user_id)
            .map(|entry| entry.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn append(&self, user_id: &str, action: UserAction) -> Result<(), ActivityError> {
        if user_id.is_empty() {
            return Err(ActivityError::EmptyUserId);
        }

        let mut entry = self.actions.entry(user_id.to_string()).or_default();

        if let Some(last) = entry.back() {
            if action.timestamp < last.timestamp {
                return Err(ActivityError::OutOfOrder {
                    user_id: user_id.to_string(),
                    last: last.timestamp,
                    attempted: action.timestamp,
                });
            }
        }

        entry.push_back(action);
        while entry.len() > self.max_actions_per_user {
            entry.pop_front();
        }

        Ok(())
    }

    fn last_timestamp(&self, user_id: &str) -> Option<i64> {
        self.actions
            .get(user_id)
            .and_then(|entry| entry.back().map(|a| a.timestamp))
    }

    fn prune_older_than(&self, cutoff_ms: i64) -> usize {
        let mut removed = 0;

        for mut entry in self.actions.iter_mut() {
            while entry.front().is_some_and(|a| a.timestamp < cutoff_ms) {
                entry.pop_front();
                removed += 1;
            }
        }
        self.actions.retain(|_, actions| !actions.is_empty());

        if removed > 0 {
            debug!("Pruned {} old activity records", removed);
        }

        removed
    }
}
