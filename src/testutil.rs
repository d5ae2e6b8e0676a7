//! Shared test doubles for engine and builder tests

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Semaphore};

use crate::backoff::BackoffConfig;
use crate::builder::EngineBuilder;
use crate::collaborators::SimulationCore;
use crate::error::{EngineError, Result};
use crate::phase::{CampaignState, DeterministicResult};
use crate::types::{CampaignId, PlayerAction};

/// Simulation core with scriptable failures. Succeeds by default.
pub(crate) struct StaticCore {
    fail_remaining: AtomicU32,
    fail_campaign: Mutex<Option<CampaignId>>,
    calls: AtomicU64,
}

impl StaticCore {
    pub(crate) fn new() -> Self {
        Self {
            fail_remaining: AtomicU32::new(0),
            fail_campaign: Mutex::new(None),
            calls: AtomicU64::new(0),
        }
    }

    /// Fail every call from now on
    pub(crate) fn fail_always(&self) {
        self.fail_remaining.store(u32::MAX, Ordering::SeqCst);
    }

    /// Fail the next `n` calls, then succeed again
    pub(crate) fn fail_times(&self, n: u32) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Fail only calls for the given campaign
    pub(crate) fn fail_for(&self, campaign_id: CampaignId) {
        *self.fail_campaign.lock() = Some(campaign_id);
    }

    #[allow(dead_code)]
    pub(crate) fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn should_fail(&self, campaign_id: CampaignId) -> bool {
        if *self.fail_campaign.lock() == Some(campaign_id) {
            return true;
        }
        loop {
            let remaining = self.fail_remaining.load(Ordering::SeqCst);
            if remaining == 0 {
                return false;
            }
            if remaining == u32::MAX {
                return true;
            }
            if self
                .fail_remaining
                .compare_exchange(remaining, remaining - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return true;
            }
        }
    }
}

#[async_trait]
impl SimulationCore for StaticCore {
    async fn advance(
        &self,
        campaign_id: CampaignId,
        seed: u64,
        actions: &[PlayerAction],
    ) -> Result<DeterministicResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail(campaign_id) {
            return Err(EngineError::simulation("scripted failure"));
        }
        Ok(DeterministicResult {
            state: CampaignState::new(serde_json::json!({
                "campaign": campaign_id.value(),
                "seed": seed,
                "actions": actions.len(),
            })),
            ..Default::default()
        })
    }

    fn name(&self) -> &'static str {
        "static-core"
    }
}

/// Simulation core that blocks inside `advance` until released, reporting
/// the drained action batch on entry. Lets tests observe in-flight ticks.
pub(crate) struct GatedCore {
    entered_tx: mpsc::UnboundedSender<Vec<PlayerAction>>,
    entered_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<PlayerAction>>>,
    gate: Semaphore,
}

impl GatedCore {
    pub(crate) fn new() -> Self {
        let (entered_tx, entered_rx) = mpsc::unbounded_channel();
        Self {
            entered_tx,
            entered_rx: tokio::sync::Mutex::new(entered_rx),
            gate: Semaphore::new(0),
        }
    }

    /// Wait until a tick enters the core, returning its action batch
    pub(crate) async fn wait_for_entry(&self) -> Vec<PlayerAction> {
        self.entered_rx
            .lock()
            .await
            .recv()
            .await
            .unwrap_or_default()
    }

    /// Let exactly one blocked tick proceed
    pub(crate) fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Let every current and future tick proceed
    pub(crate) fn release_all(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

#[async_trait]
impl SimulationCore for GatedCore {
    async fn advance(
        &self,
        campaign_id: CampaignId,
        seed: u64,
        actions: &[PlayerAction],
    ) -> Result<DeterministicResult> {
        let _ = self.entered_tx.send(actions.to_vec());
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| EngineError::simulation("gate closed"))?;
        permit.forget();
        Ok(DeterministicResult {
            state: CampaignState::new(serde_json::json!({
                "campaign": campaign_id.value(),
                "seed": seed,
            })),
            ..Default::default()
        })
    }

    fn name(&self) -> &'static str {
        "gated-core"
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builder preconfigured with intervals and backoff short enough for tests
pub(crate) fn fast_engine_builder(core: Arc<dyn SimulationCore>) -> EngineBuilder {
    init_tracing();
    EngineBuilder::new()
        .with_simulation_core(core)
        .with_active_interval(Duration::from_millis(20))
        .with_idle_interval(Duration::from_millis(80))
        .with_backoff(BackoffConfig::new(Duration::from_millis(5)))
        .with_engine_seed(42)
}
