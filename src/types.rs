//! Core identifier and scheduling types
//!
//! ## Table of Contents
//! - **CampaignId**: Identifier for an independent simulation campaign
//! - **PlayerAction**: Externally submitted action consumed by a tick
//! - **TickMode / TickConfiguration / TickCatalog**: Named interval modes
//! - **CampaignStatus**: Serializable snapshot of a campaign's scheduling state

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a registered campaign
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CampaignId(u64);

impl CampaignId {
    /// Create a new campaign id
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get inner value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CampaignId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identifier of a participant submitting actions
pub type PlayerId = String;

/// Identifier of a tick within a campaign (strictly increasing per campaign)
pub type TickId = u64;

/// An action submitted by a participant, consumed exactly once by the tick
/// that drains the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerAction {
    /// Unique action id
    pub id: Uuid,
    /// Submitting participant
    pub player_id: PlayerId,
    /// Action kind, interpreted by the simulation core
    pub kind: String,
    /// Opaque action payload
    pub payload: serde_json::Value,
    /// Expedite the pending tick instead of waiting for the timer
    pub requires_immediate: bool,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
}

impl PlayerAction {
    /// Create a new action with a fresh id
    pub fn new(player_id: impl Into<PlayerId>, kind: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id: player_id.into(),
            kind: kind.into(),
            payload: serde_json::Value::Null,
            requires_immediate: false,
            submitted_at: Utc::now(),
        }
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Mark the action as requiring expedited processing
    pub fn immediate(mut self) -> Self {
        self.requires_immediate = true;
        self
    }
}

/// Named interval mode for a campaign's tick cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickMode {
    /// Short interval for campaigns with recent participant activity
    Active,
    /// Long interval for dormant or unhealthy campaigns
    Idle,
}

impl TickMode {
    /// Mode name for logging and labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for TickMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable named interval value from the tick catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickConfiguration {
    /// Catalog mode this entry belongs to
    pub mode: TickMode,
    /// Interval between tick firings
    pub interval: Duration,
}

impl TickConfiguration {
    /// Create a catalog entry
    pub fn new(mode: TickMode, interval: Duration) -> Self {
        Self { mode, interval }
    }
}

/// Fixed table of named interval modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickCatalog {
    /// Short interval entry
    pub active: TickConfiguration,
    /// Long interval entry
    pub idle: TickConfiguration,
}

impl TickCatalog {
    /// Look up the catalog entry for a mode
    pub fn get(&self, mode: TickMode) -> TickConfiguration {
        match mode {
            TickMode::Active => self.active,
            TickMode::Idle => self.idle,
        }
    }
}

impl Default for TickCatalog {
    fn default() -> Self {
        Self {
            active: TickConfiguration::new(TickMode::Active, Duration::from_secs(120)),
            idle: TickConfiguration::new(TickMode::Idle, Duration::from_secs(300)),
        }
    }
}

/// Snapshot of a campaign's scheduling state, safe to read while a tick is
/// in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignStatus {
    /// Campaign identifier
    pub campaign_id: CampaignId,
    /// Whether the campaign is currently ticking
    pub is_active: bool,
    /// Current interval mode
    pub mode: TickMode,
    /// Scheduled time of the next tick firing
    pub next_tick_time: DateTime<Utc>,
    /// Completion time of the last successful tick
    pub last_tick_time: DateTime<Utc>,
    /// Number of completed ticks
    pub tick_count: u64,
    /// Running average tick duration in milliseconds
    pub average_tick_time_ms: f64,
    /// Duration of the last completed tick in milliseconds
    pub last_tick_duration_ms: u64,
    /// Consecutive fatal tick failures since the last success
    pub error_count: u32,
    /// Participants that have submitted actions
    pub active_participants: Vec<PlayerId>,
    /// Time of the most recent action submission
    pub last_participant_action: DateTime<Utc>,
    /// Actions waiting for the next tick
    pub queued_actions: usize,
}
