//! The five-phase tick pipeline
//!
//! ## Table of Contents
//! - **tick_seed**: Reproducible per-tick seed derivation
//! - **PhasePipeline**: Runs deterministic, narrative, integration, memory
//!   and persistence in strict order
//!
//! Phase failure policy: deterministic and persistence failures abort the
//! tick; a narrative failure substitutes the degraded default; memory
//! failures are recorded per target and never abort.

use std::time::Instant;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::collaborators::{
    BoxedMemoryStore, BoxedNarrativeAnalyzer, BoxedSimulationCore, BoxedStatePersistence,
};
use crate::error::Result;
use crate::integration::integrate;
use crate::memory::{run_memory_phase, MemoryContext};
use crate::phase::{NarrativeResult, PhaseTimings, StrategicTick};
use crate::types::{CampaignId, PlayerAction, TickId};

/// Derive the reproducible seed for one tick from the engine seed, the
/// campaign id and the tick id. SplitMix64-style finalizer; replaying the
/// same triple always yields the same seed.
pub fn tick_seed(engine_seed: u64, campaign_id: CampaignId, tick_id: TickId) -> u64 {
    let mut z = engine_seed
        .wrapping_add(campaign_id.value().wrapping_mul(0x9e3779b97f4a7c15))
        .wrapping_add(tick_id);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Executes the phased tick pipeline for any campaign
pub struct PhasePipeline {
    simulation: BoxedSimulationCore,
    analyzer: Option<BoxedNarrativeAnalyzer>,
    stores: Vec<BoxedMemoryStore>,
    persistence: BoxedStatePersistence,
    narrative_enabled: bool,
    memory_enabled: bool,
    engine_seed: u64,
    previous_narratives: DashMap<CampaignId, NarrativeResult>,
}

impl PhasePipeline {
    /// Assemble a pipeline from its collaborators
    pub fn new(
        simulation: BoxedSimulationCore,
        analyzer: Option<BoxedNarrativeAnalyzer>,
        stores: Vec<BoxedMemoryStore>,
        persistence: BoxedStatePersistence,
        narrative_enabled: bool,
        memory_enabled: bool,
        engine_seed: u64,
    ) -> Self {
        Self {
            simulation,
            analyzer,
            stores,
            persistence,
            narrative_enabled,
            memory_enabled,
            engine_seed,
            previous_narratives: DashMap::new(),
        }
    }

    /// Run all phases for one tick. Returns the completed tick record, or
    /// an error when the deterministic or persistence phase fails.
    pub async fn execute(
        &self,
        campaign_id: CampaignId,
        tick_id: TickId,
        actions: Vec<PlayerAction>,
    ) -> Result<StrategicTick> {
        let total_started = Instant::now();
        let seed = tick_seed(self.engine_seed, campaign_id, tick_id);
        let mut timings = PhaseTimings::default();

        debug!(
            campaign_id = %campaign_id,
            tick_id,
            actions = actions.len(),
            "tick started"
        );

        // phase 1: deterministic advancement (fatal on failure)
        let phase_started = Instant::now();
        let deterministic = self
            .simulation
            .advance(campaign_id, seed, &actions)
            .await?;
        timings.deterministic_ms = phase_started.elapsed().as_millis() as u64;

        // phase 2: narrative analysis (degrades on failure)
        let phase_started = Instant::now();
        let narrative = match (&self.analyzer, self.narrative_enabled) {
            (Some(analyzer), true) => {
                match analyzer.analyze(campaign_id, &deterministic).await {
                    Ok(narrative) => narrative,
                    Err(err) => {
                        warn!(
                            campaign_id = %campaign_id,
                            tick_id,
                            analyzer = analyzer.name(),
                            error = %err,
                            "narrative analysis failed, using degraded default"
                        );
                        NarrativeResult::degraded_default()
                    }
                }
            }
            _ => NarrativeResult::default(),
        };
        timings.narrative_ms = phase_started.elapsed().as_millis() as u64;

        // phase 3: integration (pure)
        let phase_started = Instant::now();
        let integration = integrate(&deterministic, &narrative, tick_id);
        timings.integration_ms = phase_started.elapsed().as_millis() as u64;

        // phase 4: memory updates (per-target isolation)
        let phase_started = Instant::now();
        let memory_updates = if self.memory_enabled && !self.stores.is_empty() {
            let previous = self
                .previous_narratives
                .get(&campaign_id)
                .map(|entry| entry.clone());
            let ctx = MemoryContext {
                campaign_id,
                tick_id,
                deterministic: &deterministic,
                narrative: &narrative,
                integration: &integration,
                previous_narrative: previous.as_ref(),
            };
            run_memory_phase(&self.stores, &ctx).await
        } else {
            Vec::new()
        };
        timings.memory_ms = phase_started.elapsed().as_millis() as u64;

        // phase 5: persistence (fatal on failure; previous committed state
        // stays current)
        let phase_started = Instant::now();
        self.persistence
            .commit(campaign_id, &integration.final_state)
            .await?;
        timings.persistence_ms = phase_started.elapsed().as_millis() as u64;

        // only remember the narrative once the tick has fully committed
        self.previous_narratives.insert(campaign_id, narrative.clone());

        let processing_time_ms = total_started.elapsed().as_millis() as u64;
        debug!(
            campaign_id = %campaign_id,
            tick_id,
            processing_time_ms,
            events = integration.emergent_events.len(),
            "tick completed"
        );

        Ok(StrategicTick {
            campaign_id,
            tick_id,
            timestamp: Utc::now(),
            seed,
            actions,
            deterministic,
            narrative,
            integration,
            memory_updates,
            phase_timings: timings,
            processing_time_ms,
        })
    }

    /// Drop pipeline state retained for a campaign
    pub fn forget(&self, campaign_id: CampaignId) {
        self.previous_narratives.remove(&campaign_id);
    }
}
