//! Engine configuration and builder
//!
//! ## Table of Contents
//! - **EngineConfig**: Validated runtime configuration
//! - **EngineBuilder**: Fluent assembly of an engine and its collaborators

use std::sync::Arc;
use std::time::Duration;

use crate::backoff::BackoffConfig;
use crate::collaborators::{
    BoxedMemoryStore, BoxedNarrativeAnalyzer, BoxedSimulationCore, BoxedStatePersistence,
    InMemoryPersistence,
};
use crate::engine::SimulationEngine;
use crate::error::{EngineError, Result};
use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::rate::{ActivityThresholds, AdaptiveActivityPolicy, RatePolicy};
use crate::types::{TickCatalog, TickConfiguration, TickMode};

/// Validated engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Named interval catalog
    pub catalog: TickCatalog,
    /// Adaptive rate thresholds
    pub thresholds: ActivityThresholds,
    /// Backoff schedule for failed ticks
    pub backoff: BackoffConfig,
    /// Whether the narrative phase runs
    pub narrative_enabled: bool,
    /// Whether the memory phase runs
    pub memory_enabled: bool,
    /// Whether Prometheus collectors are created
    pub metrics_enabled: bool,
    /// Event channel capacity per subscriber
    pub event_capacity: usize,
    /// Seed mixed into every per-tick seed
    pub engine_seed: u64,
}

impl EngineConfig {
    /// Validate interval and threshold relationships
    pub fn validate(&self) -> Result<()> {
        let active = self.catalog.active.interval;
        let idle = self.catalog.idle.interval;
        if active.is_zero() || idle.is_zero() {
            return Err(EngineError::config("tick intervals must be non-zero"));
        }
        if active >= idle {
            return Err(EngineError::config(
                "active interval must be shorter than the idle interval",
            ));
        }
        if self.event_capacity == 0 {
            return Err(EngineError::config("event capacity must be non-zero"));
        }
        self.thresholds.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog: TickCatalog::default(),
            thresholds: ActivityThresholds::default(),
            backoff: BackoffConfig::default(),
            narrative_enabled: true,
            memory_enabled: true,
            metrics_enabled: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            engine_seed: 0,
        }
    }
}

/// Fluent builder for [`SimulationEngine`]
pub struct EngineBuilder {
    config: EngineConfig,
    simulation: Option<BoxedSimulationCore>,
    analyzer: Option<BoxedNarrativeAnalyzer>,
    stores: Vec<BoxedMemoryStore>,
    persistence: Option<BoxedStatePersistence>,
    policy: Arc<dyn RatePolicy>,
}

impl EngineBuilder {
    /// Start a builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            simulation: None,
            analyzer: None,
            stores: Vec::new(),
            persistence: None,
            policy: Arc::new(AdaptiveActivityPolicy),
        }
    }

    /// Set the deterministic simulation core (required)
    pub fn with_simulation_core(mut self, core: BoxedSimulationCore) -> Self {
        self.simulation = Some(core);
        self
    }

    /// Set the narrative analyzer. Without one the narrative phase always
    /// yields the neutral default.
    pub fn with_narrative_analyzer(mut self, analyzer: BoxedNarrativeAnalyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Add a memory store. May be called once per target kind; without any
    /// stores the memory phase is skipped.
    pub fn with_memory_store(mut self, store: BoxedMemoryStore) -> Self {
        self.stores.push(store);
        self
    }

    /// Set the state persistence sink. Defaults to [`InMemoryPersistence`].
    pub fn with_persistence(mut self, persistence: BoxedStatePersistence) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Replace the rate policy
    pub fn with_rate_policy(mut self, policy: Arc<dyn RatePolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the interval catalog
    pub fn with_tick_catalog(mut self, catalog: TickCatalog) -> Self {
        self.config.catalog = catalog;
        self
    }

    /// Set the active-mode interval
    pub fn with_active_interval(mut self, interval: Duration) -> Self {
        self.config.catalog.active = TickConfiguration::new(TickMode::Active, interval);
        self
    }

    /// Set the idle-mode interval
    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.config.catalog.idle = TickConfiguration::new(TickMode::Idle, interval);
        self
    }

    /// Replace the adaptive rate thresholds
    pub fn with_thresholds(mut self, thresholds: ActivityThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Replace the backoff schedule
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.config.backoff = backoff;
        self
    }

    /// Enable or disable the narrative phase
    pub fn with_narrative_enabled(mut self, enabled: bool) -> Self {
        self.config.narrative_enabled = enabled;
        self
    }

    /// Enable or disable the memory phase
    pub fn with_memory_enabled(mut self, enabled: bool) -> Self {
        self.config.memory_enabled = enabled;
        self
    }

    /// Enable or disable Prometheus collectors
    pub fn with_metrics_enabled(mut self, enabled: bool) -> Self {
        self.config.metrics_enabled = enabled;
        self
    }

    /// Set the event channel capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Set the seed mixed into every per-tick seed
    pub fn with_engine_seed(mut self, seed: u64) -> Self {
        self.config.engine_seed = seed;
        self
    }

    /// Validate the configuration and assemble the engine
    pub fn build(self) -> Result<SimulationEngine> {
        self.config.validate()?;

        let simulation = self
            .simulation
            .ok_or_else(|| EngineError::config("a simulation core is required"))?;

        let mut config = self.config;
        // phases quietly disable themselves when their collaborator is
        // absent
        if self.analyzer.is_none() {
            config.narrative_enabled = false;
        }
        if self.stores.is_empty() {
            config.memory_enabled = false;
        }

        let persistence = self
            .persistence
            .unwrap_or_else(|| Arc::new(InMemoryPersistence::new()));

        SimulationEngine::assemble(
            config,
            simulation,
            self.analyzer,
            self.stores,
            persistence,
            self.policy,
        )
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
