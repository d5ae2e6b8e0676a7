//! Engine core and public facade
//!
//! ## Table of Contents
//! - **EngineCore**: Shared state driving all campaign timers
//! - **SimulationEngine**: Cheaply cloneable public handle
//!
//! Campaigns are fully independent: each has its own timer task, queue,
//! error count, and interval mode. One campaign failing or falling behind
//! never affects another.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{error, info, warn};

use crate::builder::EngineConfig;
use crate::collaborators::{
    BoxedMemoryStore, BoxedNarrativeAnalyzer, BoxedSimulationCore, BoxedStatePersistence,
};
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventBus, EventStream};
use crate::metrics::EngineMetrics;
use crate::pipeline::PhasePipeline;
use crate::rate::RatePolicy;
use crate::scheduler::{self, CampaignHandle};
use crate::ticker::{CampaignRegistry, CampaignSlot, CampaignTicker};
use crate::types::{CampaignId, CampaignStatus, PlayerAction, TickMode};

/// Shared state behind every engine handle and campaign timer
pub(crate) struct EngineCore {
    pub(crate) config: EngineConfig,
    pub(crate) registry: CampaignRegistry,
    pub(crate) pipeline: PhasePipeline,
    pub(crate) policy: Arc<dyn RatePolicy>,
    pub(crate) events: EventBus,
    pub(crate) metrics: Option<Arc<EngineMetrics>>,
    pub(crate) handles: DashMap<CampaignId, CampaignHandle>,
    pub(crate) shutting_down: AtomicBool,
}

impl EngineCore {
    fn guard_running(&self) -> Result<()> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(EngineError::ShuttingDown);
        }
        Ok(())
    }

    /// Run one tick for a campaign and return the delay before the next
    /// one, or `None` when the campaign was deactivated and the timer
    /// should exit.
    pub(crate) async fn run_tick(
        &self,
        campaign_id: CampaignId,
        slot: &Arc<CampaignSlot>,
    ) -> Option<Duration> {
        let (tick_id, actions) = slot.begin_tick();

        match self.pipeline.execute(campaign_id, tick_id, actions).await {
            Ok(tick) => {
                slot.complete_tick(tick.processing_time_ms);
                let tick = Arc::new(tick);
                if let Some(metrics) = &self.metrics {
                    metrics.record_tick(campaign_id, &tick);
                }
                self.events.emit(EngineEvent::TickCompleted { campaign_id, tick });

                if !slot.is_active() {
                    return None;
                }

                let snapshot = slot.activity_snapshot();
                let mode = self.policy.select(&snapshot, &self.config.thresholds);
                if mode != slot.current_mode() {
                    info!(
                        campaign_id = %campaign_id,
                        from = %slot.current_mode(),
                        to = %mode,
                        policy = self.policy.name(),
                        "tick mode changed"
                    );
                    slot.set_mode(&self.config.catalog, mode);
                }
                Some(slot.current_interval())
            }
            Err(err) => {
                let error_count = slot.record_error();
                error!(
                    campaign_id = %campaign_id,
                    tick_id,
                    error_count,
                    error = %err,
                    "tick failed"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_tick_error(campaign_id);
                }
                self.events.emit(EngineEvent::TickError {
                    campaign_id,
                    error: err.to_string(),
                    tick_count: tick_id - 1,
                    error_count,
                });

                if !slot.is_active() {
                    return None;
                }
                Some(
                    self.config
                        .backoff
                        .delay_for(error_count, slot.current_interval()),
                )
            }
        }
    }

    fn update_gauges(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.set_registered_campaigns(self.registry.len());
            let active = self
                .registry
                .ids()
                .into_iter()
                .filter(|id| {
                    self.registry
                        .get(*id)
                        .map(|slot| slot.is_active())
                        .unwrap_or(false)
                })
                .count();
            metrics.set_active_campaigns(active);
        }
    }
}

/// Public handle to the engine. Cloning is cheap; every clone drives the
/// same campaigns.
#[derive(Clone)]
pub struct SimulationEngine {
    core: Arc<EngineCore>,
}

impl std::fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine").finish_non_exhaustive()
    }
}

impl SimulationEngine {
    /// Assemble an engine from validated parts. Used by the builder.
    pub(crate) fn assemble(
        config: EngineConfig,
        simulation: BoxedSimulationCore,
        analyzer: Option<BoxedNarrativeAnalyzer>,
        stores: Vec<BoxedMemoryStore>,
        persistence: BoxedStatePersistence,
        policy: Arc<dyn RatePolicy>,
    ) -> Result<Self> {
        let metrics = if config.metrics_enabled {
            Some(Arc::new(EngineMetrics::new()?))
        } else {
            None
        };
        let pipeline = PhasePipeline::new(
            simulation,
            analyzer,
            stores,
            persistence,
            config.narrative_enabled,
            config.memory_enabled,
            config.engine_seed,
        );
        let events = EventBus::new(config.event_capacity);

        Ok(Self {
            core: Arc::new(EngineCore {
                config,
                registry: CampaignRegistry::new(),
                pipeline,
                policy,
                events,
                metrics,
                handles: DashMap::new(),
                shutting_down: AtomicBool::new(false),
            }),
        })
    }

    /// Add a campaign to the registry in the given interval mode. The
    /// campaign does not tick until started.
    pub async fn register_campaign(&self, campaign_id: CampaignId, mode: TickMode) -> Result<()> {
        self.core.guard_running()?;
        let ticker = CampaignTicker::new(campaign_id, self.core.config.catalog.get(mode));
        self.core
            .registry
            .insert(campaign_id, Arc::new(CampaignSlot::new(ticker)))?;
        self.core.update_gauges();
        info!(campaign_id = %campaign_id, mode = %mode, "campaign registered");
        self.core
            .events
            .emit(EngineEvent::CampaignRegistered { campaign_id, mode });
        Ok(())
    }

    /// Start the campaign's timer. Fails if it is already running.
    pub async fn start_campaign(&self, campaign_id: CampaignId) -> Result<()> {
        self.core.guard_running()?;
        let slot = self.core.registry.get(campaign_id)?;
        slot.try_activate()?;

        // a previous timer may still be winding down after a stop; wait it
        // out so at most one timer ever owns the campaign
        if let Some((_, old)) = self.core.handles.remove(&campaign_id) {
            old.join().await;
        }

        let handle = scheduler::spawn(Arc::clone(&self.core), campaign_id, slot);
        self.core.handles.insert(campaign_id, handle);
        self.core.update_gauges();
        info!(campaign_id = %campaign_id, "campaign started");
        self.core
            .events
            .emit(EngineEvent::CampaignStarted { campaign_id });
        Ok(())
    }

    /// Mark the campaign inactive. Idempotent; an in-flight tick completes
    /// but no further ticks fire.
    pub async fn stop_campaign(&self, campaign_id: CampaignId) -> Result<()> {
        let slot = self.core.registry.get(campaign_id)?;
        slot.deactivate();
        if let Some(handle) = self.core.handles.get(&campaign_id) {
            handle.request_cancel();
        }
        self.core.update_gauges();
        info!(campaign_id = %campaign_id, "campaign stopped");
        self.core
            .events
            .emit(EngineEvent::CampaignStopped { campaign_id });
        Ok(())
    }

    /// Stop the campaign, wait for its timer to exit, and remove it from
    /// the registry. Queued actions are discarded.
    pub async fn unregister_campaign(&self, campaign_id: CampaignId) -> Result<()> {
        let slot = self.core.registry.get(campaign_id)?;
        slot.deactivate();
        if let Some((_, handle)) = self.core.handles.remove(&campaign_id) {
            handle.request_cancel();
            handle.join().await;
        }
        self.core.pipeline.forget(campaign_id);
        self.core.registry.remove(campaign_id)?;
        self.core.update_gauges();
        info!(campaign_id = %campaign_id, "campaign unregistered");
        self.core
            .events
            .emit(EngineEvent::CampaignUnregistered { campaign_id });
        Ok(())
    }

    /// Queue an action for the campaign's next tick. An action marked
    /// immediate additionally expedites the pending tick.
    pub async fn submit_action(&self, campaign_id: CampaignId, action: PlayerAction) -> Result<()> {
        self.core.guard_running()?;
        let slot = self.core.registry.get(campaign_id)?;

        let action_id = action.id;
        let player_id = action.player_id.clone();
        let expedite = action.requires_immediate;
        slot.enqueue(action);

        if let Some(metrics) = &self.core.metrics {
            metrics.record_action(campaign_id);
        }
        self.core.events.emit(EngineEvent::ActionQueued {
            campaign_id,
            action_id,
            player_id,
        });

        if expedite {
            if slot.is_active() {
                if let Some(handle) = self.core.handles.get(&campaign_id) {
                    handle.request_expedite();
                    if let Some(metrics) = &self.core.metrics {
                        metrics.record_expedite();
                    }
                    self.core.events.emit(EngineEvent::ImmediateActionExecuted {
                        campaign_id,
                        action_id,
                    });
                }
            } else {
                warn!(
                    campaign_id = %campaign_id,
                    action_id = %action_id,
                    "immediate action queued on an inactive campaign"
                );
            }
        }
        Ok(())
    }

    /// Scheduling snapshot for one campaign
    pub fn campaign_status(&self, campaign_id: CampaignId) -> Result<CampaignStatus> {
        Ok(self.core.registry.get(campaign_id)?.status())
    }

    /// Ids of all registered campaigns
    pub fn list_campaigns(&self) -> Vec<CampaignId> {
        self.core.registry.ids()
    }

    /// Open a subscription to engine events
    pub fn subscribe(&self) -> EventStream {
        self.core.events.subscribe()
    }

    /// Engine configuration in effect
    pub fn config(&self) -> &EngineConfig {
        &self.core.config
    }

    /// Prometheus collectors, when metrics are enabled
    pub fn metrics(&self) -> Option<&Arc<EngineMetrics>> {
        self.core.metrics.as_ref()
    }

    /// Render metrics in the Prometheus text format, when enabled
    pub fn metrics_text(&self) -> Option<String> {
        self.core
            .metrics
            .as_ref()
            .and_then(|metrics| metrics.gather_text().ok())
    }

    /// Stop every campaign, wait for all timers to exit, and refuse any
    /// further work. In-flight ticks complete.
    pub async fn shutdown(&self) -> Result<()> {
        if self.core.shutting_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(campaigns = self.core.registry.len(), "engine shutting down");

        for campaign_id in self.core.registry.ids() {
            if let Ok(slot) = self.core.registry.get(campaign_id) {
                slot.deactivate();
            }
        }

        let handles: Vec<CampaignHandle> = {
            let ids: Vec<CampaignId> =
                self.core.handles.iter().map(|entry| *entry.key()).collect();
            ids.into_iter()
                .filter_map(|id| self.core.handles.remove(&id).map(|(_, handle)| handle))
                .collect()
        };
        for handle in &handles {
            handle.request_cancel();
        }
        futures::future::join_all(handles.iter().map(|handle| handle.join())).await;

        self.core.update_gauges();
        self.core.events.emit(EngineEvent::EngineShutdown);
        info!("engine shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::EngineBuilder;
    use crate::collaborators::InMemoryPersistence;
    use crate::rate::ActivityThresholds;
    use crate::testutil::{fast_engine_builder, GatedCore, StaticCore};
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    async fn next_completed_tick(
        stream: &mut EventStream,
    ) -> Arc<crate::phase::StrategicTick> {
        loop {
            let event = timeout(WAIT, stream.recv())
                .await
                .ok()
                .flatten()
                .unwrap_or_else(|| panic!("event stream ended while waiting for a tick"));
            if let EngineEvent::TickCompleted { tick, .. } = event {
                return tick;
            }
        }
    }

    async fn next_tick_error(stream: &mut EventStream) -> (String, u32) {
        loop {
            let event = timeout(WAIT, stream.recv())
                .await
                .ok()
                .flatten()
                .unwrap_or_else(|| panic!("event stream ended while waiting for an error"));
            if let EngineEvent::TickError {
                error, error_count, ..
            } = event
            {
                return (error, error_count);
            }
        }
    }

    #[tokio::test]
    async fn test_register_start_tick_lifecycle() {
        let core = Arc::new(StaticCore::new());
        let engine = fast_engine_builder(core.clone()).build().unwrap();
        let id = CampaignId::new(1);

        engine.register_campaign(id, TickMode::Active).await.unwrap();
        let mut stream = engine.subscribe();
        engine.start_campaign(id).await.unwrap();

        let first = next_completed_tick(&mut stream).await;
        let second = next_completed_tick(&mut stream).await;
        assert_eq!(first.tick_id, 1);
        assert_eq!(second.tick_id, 2);

        let status = engine.campaign_status(id).unwrap();
        assert!(status.is_active);
        assert!(status.tick_count >= 2);

        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let engine = fast_engine_builder(Arc::new(StaticCore::new()))
            .build()
            .unwrap();
        let id = CampaignId::new(1);
        engine.register_campaign(id, TickMode::Active).await.unwrap();
        assert!(matches!(
            engine.register_campaign(id, TickMode::Idle).await,
            Err(EngineError::AlreadyRegistered(_))
        ));
    }

    #[tokio::test]
    async fn test_double_start_rejected() {
        let engine = fast_engine_builder(Arc::new(StaticCore::new()))
            .build()
            .unwrap();
        let id = CampaignId::new(1);
        engine.register_campaign(id, TickMode::Active).await.unwrap();
        engine.start_campaign(id).await.unwrap();
        assert!(matches!(
            engine.start_campaign(id).await,
            Err(EngineError::AlreadyActive(_))
        ));
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_action_submitted_mid_tick_lands_in_next() {
        let core = Arc::new(GatedCore::new());
        let engine = fast_engine_builder(core.clone()).build().unwrap();
        let id = CampaignId::new(1);
        engine.register_campaign(id, TickMode::Active).await.unwrap();
        let mut stream = engine.subscribe();
        engine.start_campaign(id).await.unwrap();

        // tick 1 is now blocked inside the simulation core
        let batch = core.wait_for_entry().await;
        assert!(batch.is_empty());

        // submit while the tick is in flight
        engine
            .submit_action(id, PlayerAction::new("p1", "move"))
            .await
            .unwrap();
        core.release();

        let first = next_completed_tick(&mut stream).await;
        assert_eq!(first.tick_id, 1);
        assert!(first.actions.is_empty());

        // tick 2 picks the action up
        let batch = core.wait_for_entry().await;
        assert_eq!(batch.len(), 1);
        core.release();
        let second = next_completed_tick(&mut stream).await;
        assert_eq!(second.tick_id, 2);
        assert_eq!(second.actions.len(), 1);

        core.release_all();
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_immediate_action_expedites_pending_tick() {
        let core = Arc::new(StaticCore::new());
        // long interval: the only way a tick fires quickly is the expedite
        let engine = fast_engine_builder(core.clone())
            .with_active_interval(Duration::from_secs(60))
            .with_idle_interval(Duration::from_secs(120))
            .build()
            .unwrap();
        let id = CampaignId::new(1);
        engine.register_campaign(id, TickMode::Active).await.unwrap();
        let mut stream = engine.subscribe();
        engine.start_campaign(id).await.unwrap();

        engine
            .submit_action(id, PlayerAction::new("p1", "strike").immediate())
            .await
            .unwrap();

        let tick = next_completed_tick(&mut stream).await;
        assert_eq!(tick.tick_id, 1);
        assert_eq!(tick.actions.len(), 1);
        assert!(tick.actions[0].requires_immediate);

        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_failing_campaign_reports_growing_error_counts() {
        let core = Arc::new(StaticCore::new());
        core.fail_always();
        let engine = fast_engine_builder(core).build().unwrap();
        let id = CampaignId::new(1);
        engine.register_campaign(id, TickMode::Active).await.unwrap();
        let mut stream = engine.subscribe();
        engine.start_campaign(id).await.unwrap();

        let (error, first) = next_tick_error(&mut stream).await;
        let (_, second) = next_tick_error(&mut stream).await;
        assert!(error.contains("simulation error"));
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(engine.campaign_status(id).unwrap().tick_count, 0);

        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_failures_are_isolated_per_campaign() {
        let core = Arc::new(StaticCore::new());
        core.fail_for(CampaignId::new(1));
        let engine = fast_engine_builder(core).build().unwrap();

        let sick = CampaignId::new(1);
        let healthy = CampaignId::new(2);
        engine.register_campaign(sick, TickMode::Active).await.unwrap();
        engine
            .register_campaign(healthy, TickMode::Active)
            .await
            .unwrap();
        let mut stream = engine.subscribe();
        engine.start_campaign(sick).await.unwrap();
        engine.start_campaign(healthy).await.unwrap();

        // the healthy campaign keeps completing ticks while the sick one
        // only produces errors
        let mut healthy_ticks = 0;
        let mut sick_errors = 0;
        while healthy_ticks < 2 || sick_errors < 1 {
            match timeout(WAIT, stream.recv()).await.ok().flatten() {
                Some(EngineEvent::TickCompleted { campaign_id, .. }) => {
                    assert_eq!(campaign_id, healthy);
                    healthy_ticks += 1;
                }
                Some(EngineEvent::TickError { campaign_id, .. }) => {
                    assert_eq!(campaign_id, sick);
                    sick_errors += 1;
                }
                Some(_) => {}
                None => panic!("event stream ended early"),
            }
        }
        assert_eq!(engine.campaign_status(sick).unwrap().tick_count, 0);
        assert!(engine.campaign_status(healthy).unwrap().tick_count >= 2);

        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_error_streak_switches_to_idle_mode() {
        let core = Arc::new(StaticCore::new());
        core.fail_times(4);
        let engine = fast_engine_builder(core)
            .with_thresholds(
                ActivityThresholds::default()
                    .with_recent_activity(Duration::from_millis(5))
                    .with_dormant(Duration::from_millis(10))
                    .with_error_threshold(3),
            )
            .build()
            .unwrap();
        let id = CampaignId::new(1);
        engine.register_campaign(id, TickMode::Active).await.unwrap();
        let mut stream = engine.subscribe();
        engine.start_campaign(id).await.unwrap();

        // four failures push the error count past the threshold; the next
        // success selects the long interval
        for expected in 1..=4u32 {
            let (_, count) = next_tick_error(&mut stream).await;
            assert_eq!(count, expected);
        }
        let tick = next_completed_tick(&mut stream).await;
        assert_eq!(tick.tick_id, 1);

        // mode selection happens right after completion; error count reset
        // plus dormancy keeps it idle
        let status = engine.campaign_status(id).unwrap();
        assert_eq!(status.error_count, 0);
        assert_eq!(status.mode, TickMode::Idle);

        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_recent_action_keeps_campaign_active() {
        let core = Arc::new(StaticCore::new());
        let engine = fast_engine_builder(core)
            .with_thresholds(
                ActivityThresholds::default()
                    .with_recent_activity(Duration::from_secs(60))
                    .with_dormant(Duration::from_secs(120)),
            )
            .build()
            .unwrap();
        let id = CampaignId::new(1);
        engine.register_campaign(id, TickMode::Active).await.unwrap();
        let mut stream = engine.subscribe();
        engine
            .submit_action(id, PlayerAction::new("p1", "move"))
            .await
            .unwrap();
        engine.start_campaign(id).await.unwrap();

        next_completed_tick(&mut stream).await;
        assert_eq!(engine.campaign_status(id).unwrap().mode, TickMode::Active);

        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_then_unregister_then_status_fails() {
        let engine = fast_engine_builder(Arc::new(StaticCore::new()))
            .build()
            .unwrap();
        let id = CampaignId::new(1);
        engine.register_campaign(id, TickMode::Active).await.unwrap();
        engine.start_campaign(id).await.unwrap();

        engine.stop_campaign(id).await.unwrap();
        // stopping is idempotent
        engine.stop_campaign(id).await.unwrap();
        assert!(!engine.campaign_status(id).unwrap().is_active);

        engine.unregister_campaign(id).await.unwrap();
        assert!(matches!(
            engine.campaign_status(id),
            Err(EngineError::NotRegistered(_))
        ));
        assert!(matches!(
            engine.stop_campaign(id).await,
            Err(EngineError::NotRegistered(_))
        ));
        assert!(engine.list_campaigns().is_empty());
    }

    #[tokio::test]
    async fn test_stopped_campaign_can_restart() {
        let core = Arc::new(StaticCore::new());
        let engine = fast_engine_builder(core).build().unwrap();
        let id = CampaignId::new(1);
        engine.register_campaign(id, TickMode::Active).await.unwrap();
        let mut stream = engine.subscribe();

        engine.start_campaign(id).await.unwrap();
        let first = next_completed_tick(&mut stream).await;
        engine.stop_campaign(id).await.unwrap();

        engine.start_campaign(id).await.unwrap();
        let next = next_completed_tick(&mut stream).await;
        // tick ids continue, no reset across restart
        assert!(next.tick_id > first.tick_id);

        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_refuses_new_work() {
        let engine = fast_engine_builder(Arc::new(StaticCore::new()))
            .build()
            .unwrap();
        let id = CampaignId::new(1);
        engine.register_campaign(id, TickMode::Active).await.unwrap();
        engine.start_campaign(id).await.unwrap();
        let mut stream = engine.subscribe();

        engine.shutdown().await.unwrap();
        // idempotent
        engine.shutdown().await.unwrap();

        assert!(matches!(
            engine.register_campaign(CampaignId::new(2), TickMode::Active).await,
            Err(EngineError::ShuttingDown)
        ));
        assert!(matches!(
            engine.start_campaign(id).await,
            Err(EngineError::ShuttingDown)
        ));
        assert!(matches!(
            engine.submit_action(id, PlayerAction::new("p1", "move")).await,
            Err(EngineError::ShuttingDown)
        ));

        // the shutdown event is observable
        loop {
            match timeout(WAIT, stream.recv()).await.ok().flatten() {
                Some(EngineEvent::EngineShutdown) => break,
                Some(_) => {}
                None => panic!("stream ended before the shutdown event"),
            }
        }
        assert!(!engine.campaign_status(id).unwrap().is_active);
    }

    #[tokio::test]
    async fn test_metrics_track_ticks() {
        let engine = fast_engine_builder(Arc::new(StaticCore::new()))
            .build()
            .unwrap();
        let id = CampaignId::new(1);
        engine.register_campaign(id, TickMode::Active).await.unwrap();
        let mut stream = engine.subscribe();
        engine.start_campaign(id).await.unwrap();
        next_completed_tick(&mut stream).await;
        engine.shutdown().await.unwrap();

        let text = engine.metrics_text().unwrap_or_default();
        assert!(text.contains("strategos_ticks_completed_total"));
    }

    #[tokio::test]
    async fn test_status_readable_during_ticking() {
        let core = Arc::new(GatedCore::new());
        let engine = fast_engine_builder(core.clone()).build().unwrap();
        let id = CampaignId::new(1);
        engine.register_campaign(id, TickMode::Active).await.unwrap();
        engine.start_campaign(id).await.unwrap();

        core.wait_for_entry().await;
        // a tick is in flight; status must not block
        let status = engine.campaign_status(id).unwrap();
        assert!(status.is_active);
        assert_eq!(status.tick_count, 0);

        core.release_all();
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_final_state_committed_per_campaign() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let engine = EngineBuilder::new()
            .with_simulation_core(Arc::new(StaticCore::new()))
            .with_persistence(persistence.clone())
            .with_active_interval(Duration::from_millis(20))
            .with_idle_interval(Duration::from_millis(80))
            .with_metrics_enabled(false)
            .build()
            .unwrap();
        let id = CampaignId::new(3);
        engine.register_campaign(id, TickMode::Active).await.unwrap();
        let mut stream = engine.subscribe();
        engine.start_campaign(id).await.unwrap();
        next_completed_tick(&mut stream).await;
        engine.shutdown().await.unwrap();

        assert!(persistence.last_committed(id).is_some());
        assert!(persistence.last_committed(CampaignId::new(99)).is_none());
    }
}
