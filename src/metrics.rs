//! Prometheus metrics for the engine
//!
//! ## Table of Contents
//! - **EngineMetrics**: Registry plus every collector the engine records
//!
//! All metrics live in a dedicated registry per engine so embedding
//! applications can merge or scrape them however they like.

use prometheus::{
    Counter, CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

use crate::error::Result;
use crate::types::CampaignId;

/// Prometheus collectors recorded by the engine
#[derive(Debug)]
pub struct EngineMetrics {
    registry: Registry,
    ticks_completed: CounterVec,
    tick_errors: CounterVec,
    tick_duration: HistogramVec,
    phase_duration: HistogramVec,
    actions_queued: CounterVec,
    expedited_ticks: Counter,
    active_campaigns: Gauge,
    registered_campaigns: Gauge,
}

impl EngineMetrics {
    /// Create the collectors and register them in a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let ticks_completed = CounterVec::new(
            Opts::new("strategos_ticks_completed_total", "Completed ticks"),
            &["campaign"],
        )?;
        let tick_errors = CounterVec::new(
            Opts::new("strategos_tick_errors_total", "Fatal tick failures"),
            &["campaign"],
        )?;
        let tick_duration = HistogramVec::new(
            HistogramOpts::new("strategos_tick_duration_seconds", "Tick processing time")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0]),
            &["campaign"],
        )?;
        let phase_duration = HistogramVec::new(
            HistogramOpts::new(
                "strategos_phase_duration_seconds",
                "Per-phase processing time",
            )
            .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0]),
            &["phase"],
        )?;
        let actions_queued = CounterVec::new(
            Opts::new("strategos_actions_queued_total", "Actions submitted"),
            &["campaign"],
        )?;
        let expedited_ticks = Counter::new(
            "strategos_expedited_ticks_total",
            "Ticks expedited by immediate actions",
        )?;
        let active_campaigns =
            Gauge::new("strategos_active_campaigns", "Campaigns currently ticking")?;
        let registered_campaigns = Gauge::new(
            "strategos_registered_campaigns",
            "Campaigns in the registry",
        )?;

        registry.register(Box::new(ticks_completed.clone()))?;
        registry.register(Box::new(tick_errors.clone()))?;
        registry.register(Box::new(tick_duration.clone()))?;
        registry.register(Box::new(phase_duration.clone()))?;
        registry.register(Box::new(actions_queued.clone()))?;
        registry.register(Box::new(expedited_ticks.clone()))?;
        registry.register(Box::new(active_campaigns.clone()))?;
        registry.register(Box::new(registered_campaigns.clone()))?;

        Ok(Self {
            registry,
            ticks_completed,
            tick_errors,
            tick_duration,
            phase_duration,
            actions_queued,
            expedited_ticks,
            active_campaigns,
            registered_campaigns,
        })
    }

    /// Record a completed tick and its phase timings
    pub fn record_tick(&self, campaign_id: CampaignId, tick: &crate::phase::StrategicTick) {
        let campaign = campaign_id.to_string();
        self.ticks_completed.with_label_values(&[&campaign]).inc();
        self.tick_duration
            .with_label_values(&[&campaign])
            .observe(tick.processing_time_ms as f64 / 1000.0);

        let timings = &tick.phase_timings;
        for (phase, ms) in [
            ("deterministic", timings.deterministic_ms),
            ("narrative", timings.narrative_ms),
            ("integration", timings.integration_ms),
            ("memory", timings.memory_ms),
            ("persistence", timings.persistence_ms),
        ] {
            self.phase_duration
                .with_label_values(&[phase])
                .observe(ms as f64 / 1000.0);
        }
    }

    /// Record a fatal tick failure
    pub fn record_tick_error(&self, campaign_id: CampaignId) {
        self.tick_errors
            .with_label_values(&[&campaign_id.to_string()])
            .inc();
    }

    /// Record an action submission
    pub fn record_action(&self, campaign_id: CampaignId) {
        self.actions_queued
            .with_label_values(&[&campaign_id.to_string()])
            .inc();
    }

    /// Record an expedited tick request
    pub fn record_expedite(&self) {
        self.expedited_ticks.inc();
    }

    /// Update the active campaign gauge
    pub fn set_active_campaigns(&self, count: usize) {
        self.active_campaigns.set(count as f64);
    }

    /// Update the registered campaign gauge
    pub fn set_registered_campaigns(&self, count: usize) {
        self.registered_campaigns.set(count as f64);
    }

    /// Render all collectors in the Prometheus text format
    pub fn gather_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        Ok(encoder.encode_to_string(&families)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::{PhaseTimings, StrategicTick};
    use chrono::Utc;

    fn tick(campaign_id: CampaignId) -> StrategicTick {
        StrategicTick {
            campaign_id,
            tick_id: 1,
            timestamp: Utc::now(),
            seed: 0,
            actions: Vec::new(),
            deterministic: Default::default(),
            narrative: Default::default(),
            integration: crate::integration::integrate(
                &Default::default(),
                &Default::default(),
                1,
            ),
            memory_updates: Vec::new(),
            phase_timings: PhaseTimings {
                deterministic_ms: 5,
                narrative_ms: 10,
                integration_ms: 1,
                memory_ms: 2,
                persistence_ms: 3,
            },
            processing_time_ms: 21,
        }
    }

    #[test]
    fn test_record_and_export() {
        let metrics = EngineMetrics::new().unwrap();
        let id = CampaignId::new(1);

        metrics.record_tick(id, &tick(id));
        metrics.record_tick_error(id);
        metrics.record_action(id);
        metrics.record_expedite();
        metrics.set_active_campaigns(2);
        metrics.set_registered_campaigns(3);

        let text = metrics.gather_text().unwrap();
        assert!(text.contains("strategos_ticks_completed_total"));
        assert!(text.contains("strategos_tick_errors_total"));
        assert!(text.contains("strategos_phase_duration_seconds"));
        assert!(text.contains("strategos_active_campaigns 2"));
        assert!(text.contains("strategos_registered_campaigns 3"));
    }

    #[test]
    fn test_fresh_registry_per_engine() {
        // two engines never collide on collector registration
        let a = EngineMetrics::new().unwrap();
        let b = EngineMetrics::new().unwrap();
        a.record_expedite();
        assert!(b.gather_text().unwrap().contains("strategos_expedited_ticks_total 0"));
    }
}
