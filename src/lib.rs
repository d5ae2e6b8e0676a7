//! # Strategos
//!
//! Tick-based orchestration core for persistent multi-campaign
//! simulations.
//!
//! Each registered campaign gets its own timer task and advances through a
//! five-phase tick pipeline: deterministic simulation, narrative analysis,
//! integration, memory updates, and state persistence. Tick cadence adapts
//! per campaign: recent participant activity keeps a campaign on the short
//! interval, while dormancy or repeated failures move it to the long one,
//! with exponential backoff between failed attempts.
//!
//! The heavy lifting is delegated to pluggable collaborators behind async
//! traits: a [`SimulationCore`](collaborators::SimulationCore) advances
//! state, an optional [`NarrativeAnalyzer`](collaborators::NarrativeAnalyzer)
//! produces the qualitative view, [`MemoryStore`](collaborators::MemoryStore)s
//! receive durable memories, and a
//! [`StatePersistence`](collaborators::StatePersistence) sink commits the
//! final state.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use strategos::prelude::*;
//!
//! # struct MyCore;
//! # #[async_trait::async_trait]
//! # impl SimulationCore for MyCore {
//! #     async fn advance(
//! #         &self,
//! #         _campaign_id: CampaignId,
//! #         _seed: u64,
//! #         _actions: &[PlayerAction],
//! #     ) -> strategos::Result<DeterministicResult> {
//! #         Ok(DeterministicResult::default())
//! #     }
//! #     fn name(&self) -> &'static str { "my-core" }
//! # }
//! # async fn run() -> strategos::Result<()> {
//! let engine = EngineBuilder::new()
//!     .with_simulation_core(Arc::new(MyCore))
//!     .build()?;
//!
//! let campaign = CampaignId::new(1);
//! engine.register_campaign(campaign, TickMode::Active).await?;
//! engine.start_campaign(campaign).await?;
//!
//! engine
//!     .submit_action(campaign, PlayerAction::new("player-1", "build"))
//!     .await?;
//!
//! let mut events = engine.subscribe();
//! while let Some(event) = events.recv().await {
//!     if let EngineEvent::TickCompleted { tick, .. } = event {
//!         println!("tick {} done in {}ms", tick.tick_id, tick.processing_time_ms);
//!         break;
//!     }
//! }
//!
//! engine.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod backoff;
pub mod builder;
pub mod collaborators;
pub mod engine;
pub mod error;
pub mod events;
pub mod integration;
pub mod memory;
pub mod metrics;
pub mod phase;
pub mod pipeline;
pub mod rate;
mod scheduler;
#[cfg(test)]
mod testutil;
pub mod ticker;
pub mod types;

pub use backoff::BackoffConfig;
pub use builder::{EngineBuilder, EngineConfig};
pub use collaborators::{
    BoxedMemoryStore, BoxedNarrativeAnalyzer, BoxedSimulationCore, BoxedStatePersistence,
    FilePersistence, InMemoryMemoryStore, InMemoryPersistence, MemoryStore,
    NarrativeAnalyzer, SimulationCore, StatePersistence,
};
pub use engine::SimulationEngine;
pub use error::{EngineError, Result};
pub use events::{EngineEvent, EventStream};
pub use metrics::EngineMetrics;
pub use phase::{
    CampaignState, DeterministicResult, EmergentEvent, EmergentEventKind, EventSeverity,
    IntegratedResult, MemoryEntry, MemoryTargetKind, MemoryUpdate, MoodLevel,
    NarrativeResult, SentimentModifiers, StrategicTick,
};
pub use rate::{ActivityThresholds, AdaptiveActivityPolicy, RatePolicy};
pub use types::{
    CampaignId, CampaignStatus, PlayerAction, PlayerId, TickCatalog, TickConfiguration,
    TickId, TickMode,
};

/// Commonly used types in one import
pub mod prelude {
    pub use crate::builder::EngineBuilder;
    pub use crate::collaborators::{
        MemoryStore, NarrativeAnalyzer, SimulationCore, StatePersistence,
    };
    pub use crate::engine::SimulationEngine;
    pub use crate::error::{EngineError, Result};
    pub use crate::events::EngineEvent;
    pub use crate::phase::{DeterministicResult, NarrativeResult, StrategicTick};
    pub use crate::types::{CampaignId, PlayerAction, TickMode};
}
