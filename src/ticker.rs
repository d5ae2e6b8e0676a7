//! Per-campaign scheduling state and the campaign registry
//!
//! ## Table of Contents
//! - **CampaignTicker**: Mutable scheduling state for one campaign
//! - **CampaignSlot**: Lock-guarded ticker shared between engine and timer task
//! - **CampaignRegistry**: Concurrent map of all registered campaigns
//!
//! Status reads never block on an in-flight tick: the tick pipeline runs
//! outside the lock and only brief begin/complete transitions take the
//! write guard.

use std::collections::HashSet;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::error::{EngineError, Result};
use crate::rate::ActivitySnapshot;
use crate::types::{
    CampaignId, CampaignStatus, PlayerAction, TickCatalog, TickConfiguration, TickId,
    TickMode,
};

/// Mutable scheduling state for a single campaign
#[derive(Debug)]
pub struct CampaignTicker {
    campaign_id: CampaignId,
    config: TickConfiguration,
    is_active: bool,
    next_tick_time: DateTime<Utc>,
    last_tick_time: DateTime<Utc>,
    tick_count: u64,
    average_tick_time_ms: f64,
    last_tick_duration_ms: u64,
    error_count: u32,
    active_participants: HashSet<String>,
    last_action: Instant,
    last_action_at: DateTime<Utc>,
    queued_actions: Vec<PlayerAction>,
}

impl CampaignTicker {
    /// Create a ticker in the given mode, inactive, with an empty queue
    pub fn new(campaign_id: CampaignId, config: TickConfiguration) -> Self {
        let now = Utc::now();
        Self {
            campaign_id,
            config,
            is_active: false,
            next_tick_time: now
                + chrono::Duration::milliseconds(config.interval.as_millis() as i64),
            last_tick_time: now,
            tick_count: 0,
            average_tick_time_ms: 0.0,
            last_tick_duration_ms: 0,
            error_count: 0,
            active_participants: HashSet::new(),
            last_action: Instant::now(),
            last_action_at: now,
            queued_actions: Vec::new(),
        }
    }

    /// Current interval mode
    pub fn mode(&self) -> TickMode {
        self.config.mode
    }

    /// Interval of the current mode
    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}

/// Lock-guarded ticker shared between the engine facade and the campaign's
/// timer task. All transitions are short critical sections.
#[derive(Debug)]
pub struct CampaignSlot {
    ticker: RwLock<CampaignTicker>,
}

impl CampaignSlot {
    /// Wrap a fresh ticker
    pub fn new(ticker: CampaignTicker) -> Self {
        Self {
            ticker: RwLock::new(ticker),
        }
    }

    /// Start a tick: assign the next tick id and drain the action queue.
    /// The drained batch is owned by the tick; actions are consumed exactly
    /// once regardless of the tick's outcome.
    pub fn begin_tick(&self) -> (TickId, Vec<PlayerAction>) {
        let mut ticker = self.ticker.write();
        let tick_id = ticker.tick_count + 1;
        let actions = mem::take(&mut ticker.queued_actions);
        (tick_id, actions)
    }

    /// Record a successful tick: bump the count, fold the duration into the
    /// running average, and clear the consecutive error count.
    pub fn complete_tick(&self, duration_ms: u64) {
        let mut ticker = self.ticker.write();
        ticker.tick_count += 1;
        let n = ticker.tick_count as f64;
        ticker.average_tick_time_ms =
            (ticker.average_tick_time_ms * (n - 1.0) + duration_ms as f64) / n;
        ticker.last_tick_duration_ms = duration_ms;
        ticker.last_tick_time = Utc::now();
        ticker.error_count = 0;
    }

    /// Record a fatal tick failure and return the new consecutive count.
    /// The tick id is not consumed, so the next attempt reuses it.
    pub fn record_error(&self) -> u32 {
        let mut ticker = self.ticker.write();
        ticker.error_count += 1;
        ticker.error_count
    }

    /// Transition to active, failing if a timer already owns the campaign
    pub fn try_activate(&self) -> Result<()> {
        let mut ticker = self.ticker.write();
        if ticker.is_active {
            return Err(EngineError::AlreadyActive(ticker.campaign_id));
        }
        ticker.is_active = true;
        Ok(())
    }

    /// Mark the campaign inactive. Idempotent; an in-flight tick completes
    /// but the timer will not rearm.
    pub fn deactivate(&self) {
        self.ticker.write().is_active = false;
    }

    /// Whether the campaign's timer should keep running
    pub fn is_active(&self) -> bool {
        self.ticker.read().is_active
    }

    /// Append an action to the queue and refresh activity tracking
    pub fn enqueue(&self, action: PlayerAction) {
        let mut ticker = self.ticker.write();
        ticker.active_participants.insert(action.player_id.clone());
        ticker.last_action = Instant::now();
        ticker.last_action_at = action.submitted_at;
        ticker.queued_actions.push(action);
    }

    /// Switch the ticker to the catalog entry for `mode`
    pub fn set_mode(&self, catalog: &TickCatalog, mode: TickMode) {
        self.ticker.write().config = catalog.get(mode);
    }

    /// Record the scheduled time of the next firing
    pub fn set_next_tick_time(&self, at: DateTime<Utc>) {
        self.ticker.write().next_tick_time = at;
    }

    /// Interval of the currently selected mode
    pub fn current_interval(&self) -> Duration {
        self.ticker.read().config.interval
    }

    /// Currently selected mode
    pub fn current_mode(&self) -> TickMode {
        self.ticker.read().config.mode
    }

    /// Activity inputs for the rate policy
    pub fn activity_snapshot(&self) -> ActivitySnapshot {
        let ticker = self.ticker.read();
        ActivitySnapshot {
            active_participants: ticker.active_participants.len(),
            since_last_action: ticker.last_action.elapsed(),
            error_count: ticker.error_count,
        }
    }

    /// Serializable snapshot of the campaign's scheduling state
    pub fn status(&self) -> CampaignStatus {
        let ticker = self.ticker.read();
        let mut participants: Vec<_> =
            ticker.active_participants.iter().cloned().collect();
        participants.sort();
        CampaignStatus {
            campaign_id: ticker.campaign_id,
            is_active: ticker.is_active,
            mode: ticker.config.mode,
            next_tick_time: ticker.next_tick_time,
            last_tick_time: ticker.last_tick_time,
            tick_count: ticker.tick_count,
            average_tick_time_ms: ticker.average_tick_time_ms,
            last_tick_duration_ms: ticker.last_tick_duration_ms,
            error_count: ticker.error_count,
            active_participants: participants,
            last_participant_action: ticker.last_action_at,
            queued_actions: ticker.queued_actions.len(),
        }
    }
}

/// Concurrent registry of all campaigns known to the engine
#[derive(Debug, Default)]
pub struct CampaignRegistry {
    slots: DashMap<CampaignId, Arc<CampaignSlot>>,
}

impl CampaignRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new campaign, failing on a duplicate id
    pub fn insert(&self, id: CampaignId, slot: Arc<CampaignSlot>) -> Result<()> {
        match self.slots.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(EngineError::AlreadyRegistered(id))
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(slot);
                Ok(())
            }
        }
    }

    /// Look up a campaign's slot
    pub fn get(&self, id: CampaignId) -> Result<Arc<CampaignSlot>> {
        self.slots
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(EngineError::NotRegistered(id))
    }

    /// Remove a campaign, failing if it was never registered
    pub fn remove(&self, id: CampaignId) -> Result<Arc<CampaignSlot>> {
        self.slots
            .remove(&id)
            .map(|(_, slot)| slot)
            .ok_or(EngineError::NotRegistered(id))
    }

    /// Ids of all registered campaigns
    pub fn ids(&self) -> Vec<CampaignId> {
        self.slots.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of registered campaigns
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
