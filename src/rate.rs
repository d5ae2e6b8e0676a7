//! Adaptive tick-rate selection
//!
//! ## Table of Contents
//! - **ActivityThresholds**: Tunable windows for the activity heuristics
//! - **ActivitySnapshot**: Inputs observed after each successful tick
//! - **RatePolicy**: Pluggable mode-selection strategy
//! - **AdaptiveActivityPolicy**: Default policy balancing activity and health

use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::types::TickMode;

/// Tunable windows for the adaptive rate heuristics
#[derive(Debug, Clone, Copy)]
pub struct ActivityThresholds {
    /// Window within which a participant action counts as recent
    pub recent_activity: Duration,
    /// Quiet period after which a campaign is considered dormant
    pub dormant: Duration,
    /// Consecutive fatal failures above which a campaign is throttled
    pub error_threshold: u32,
}

impl ActivityThresholds {
    /// Set the recent-activity window
    pub fn with_recent_activity(mut self, window: Duration) -> Self {
        self.recent_activity = window;
        self
    }

    /// Set the dormancy window
    pub fn with_dormant(mut self, window: Duration) -> Self {
        self.dormant = window;
        self
    }

    /// Set the error threshold
    pub fn with_error_threshold(mut self, threshold: u32) -> Self {
        self.error_threshold = threshold;
        self
    }

    /// Validate the threshold relationship
    pub fn validate(&self) -> Result<()> {
        if self.recent_activity.is_zero() || self.dormant.is_zero() {
            return Err(EngineError::config("activity windows must be non-zero"));
        }
        if self.recent_activity >= self.dormant {
            return Err(EngineError::config(
                "recent activity window must be shorter than the dormancy window",
            ));
        }
        Ok(())
    }
}

impl Default for ActivityThresholds {
    fn default() -> Self {
        Self {
            recent_activity: Duration::from_secs(5 * 60),
            dormant: Duration::from_secs(30 * 60),
            error_threshold: 3,
        }
    }
}

/// Activity observed for a campaign at rate-selection time
#[derive(Debug, Clone, Copy)]
pub struct ActivitySnapshot {
    /// Participants that have submitted actions
    pub active_participants: usize,
    /// Elapsed time since the most recent action submission
    pub since_last_action: Duration,
    /// Consecutive fatal failures since the last success
    pub error_count: u32,
}

/// Strategy selecting the interval mode after each successful tick
pub trait RatePolicy: Send + Sync {
    /// Select the mode for the next tick
    fn select(&self, snapshot: &ActivitySnapshot, thresholds: &ActivityThresholds)
        -> TickMode;

    /// Policy name for logging
    fn name(&self) -> &'static str;
}

/// Default policy: recent participant activity keeps a campaign on the
/// short interval; repeated failures or long dormancy move it to the long
/// one.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveActivityPolicy;

impl RatePolicy for AdaptiveActivityPolicy {
    fn select(
        &self,
        snapshot: &ActivitySnapshot,
        thresholds: &ActivityThresholds,
    ) -> TickMode {
        if snapshot.active_participants > 0
            && snapshot.since_last_action < thresholds.recent_activity
        {
            return TickMode::Active;
        }
        if snapshot.error_count > thresholds.error_threshold {
            return TickMode::Idle;
        }
        if snapshot.since_last_action > thresholds.dormant {
            return TickMode::Idle;
        }
        TickMode::Active
    }

    fn name(&self) -> &'static str {
        "adaptive-activity"
    }
}
