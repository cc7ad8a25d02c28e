//! Suspicious Activity Detection for Anti-Gaming
//!
//! Decides whether a user's recent reward actions look like bot or exploit
//! behavior. Three checks run over the trailing-hour window and are OR'd:
//!
//! | Check | Fires when |
//! |-------|------------|
//! | Frequency cap | more than `max_actions_per_hour` recent actions |
//! | Spacing | two adjacent recent actions closer than `min_time_between_actions` |
//! | Pattern | adjacent same-type ratio above `suspicious_pattern_threshold` |
//!
//! There is no scoring; any single trigger blocks the action.

mod detector;
mod rules;

pub use detector::{SuspicionReason, SuspiciousActivityDetector, RECENT_WINDOW_MS};
pub use rules::GamePreventionRules;
