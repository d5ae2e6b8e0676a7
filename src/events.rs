//! Engine lifecycle and tick event broadcasting
//!
//! ## Table of Contents
//! - **EngineEvent**: Everything observers can see happen
//! - **EventBus**: Broadcast fan-out with slow-consumer tolerance
//! - **EventStream**: Per-subscriber receiving end
//!
//! Events are fire-and-forget: emitting with no subscribers is a no-op, and
//! a subscriber that falls behind sees a `Lagged` marker instead of
//! blocking the engine.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::phase::StrategicTick;
use crate::types::{CampaignId, TickMode};

/// Default broadcast channel capacity per engine
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Observable engine event
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A campaign was added to the registry
    CampaignRegistered {
        /// Campaign id
        campaign_id: CampaignId,
        /// Initial interval mode
        mode: TickMode,
    },
    /// A campaign's timer task started
    CampaignStarted {
        /// Campaign id
        campaign_id: CampaignId,
    },
    /// A campaign was marked inactive
    CampaignStopped {
        /// Campaign id
        campaign_id: CampaignId,
    },
    /// A campaign was removed from the registry
    CampaignUnregistered {
        /// Campaign id
        campaign_id: CampaignId,
    },
    /// An action was queued for the next tick
    ActionQueued {
        /// Campaign id
        campaign_id: CampaignId,
        /// Action id
        action_id: uuid::Uuid,
        /// Submitting participant
        player_id: String,
    },
    /// An expedited tick was requested by an immediate action
    ImmediateActionExecuted {
        /// Campaign id
        campaign_id: CampaignId,
        /// Action id that triggered the expedite
        action_id: uuid::Uuid,
    },
    /// A tick completed successfully
    TickCompleted {
        /// Campaign id
        campaign_id: CampaignId,
        /// Completed tick record
        tick: Arc<StrategicTick>,
    },
    /// A tick failed fatally
    TickError {
        /// Campaign id
        campaign_id: CampaignId,
        /// Error description
        error: String,
        /// Completed tick count at the time of the failure
        tick_count: u64,
        /// Consecutive failure count after this error
        error_count: u32,
    },
    /// The engine finished shutting down
    EngineShutdown,
    /// This subscriber fell behind and missed events
    Lagged {
        /// Number of missed events
        skipped: u64,
    },
}

impl EngineEvent {
    /// Event kind name for logging and filtering
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CampaignRegistered { .. } => "campaign_registered",
            Self::CampaignStarted { .. } => "campaign_started",
            Self::CampaignStopped { .. } => "campaign_stopped",
            Self::CampaignUnregistered { .. } => "campaign_unregistered",
            Self::ActionQueued { .. } => "action_queued",
            Self::ImmediateActionExecuted { .. } => "immediate_action_executed",
            Self::TickCompleted { .. } => "tick_completed",
            Self::TickError { .. } => "tick_error",
            Self::EngineShutdown => "engine_shutdown",
            Self::Lagged { .. } => "lagged",
        }
    }
}

/// Broadcast fan-out for engine events
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Create a bus with the given buffered capacity per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all current subscribers. Dropped silently when
    /// nobody is listening.
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.sender.send(event);
    }

    /// Open a new subscription starting from the next emitted event
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscribers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Receiving end of an engine event subscription
#[derive(Debug)]
pub struct EventStream {
    receiver: broadcast::Receiver<EngineEvent>,
}

impl EventStream {
    /// Receive the next event. Returns `None` once the engine is dropped
    /// and the buffer is drained; a slow subscriber gets a `Lagged` marker
    /// instead of an error.
    pub async fn recv(&mut self) -> Option<EngineEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    return Some(EngineEvent::Lagged { skipped });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
