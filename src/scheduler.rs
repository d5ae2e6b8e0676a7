//! Per-campaign timer tasks
//!
//! ## Table of Contents
//! - **CampaignHandle**: Control surface for one campaign's timer
//! - **spawn**: Start the timer loop for an active campaign
//!
//! One tokio task per active campaign. The loop arms a deadline from the
//! campaign's current interval, waits for the deadline, an expedite
//! request, or cancellation, then hands the tick to the engine core. The
//! core returns the next delay, or `None` when the campaign was
//! deactivated and the loop should exit without rearming.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::engine::EngineCore;
use crate::ticker::CampaignSlot;
use crate::types::CampaignId;

/// Control surface for one campaign's timer task
pub(crate) struct CampaignHandle {
    cancel: watch::Sender<bool>,
    expedite: Arc<Notify>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl CampaignHandle {
    /// Ask the timer loop to exit at the next opportunity
    pub(crate) fn request_cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Fire the pending tick now instead of waiting for the deadline.
    /// A single expedite wakes at most one tick.
    pub(crate) fn request_expedite(&self) {
        self.expedite.notify_one();
    }

    /// Wait for the timer task to finish. Safe to call more than once.
    pub(crate) async fn join(&self) {
        let handle = self.join.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

/// Spawn the timer loop for an activated campaign
pub(crate) fn spawn(
    core: Arc<EngineCore>,
    campaign_id: CampaignId,
    slot: Arc<CampaignSlot>,
) -> CampaignHandle {
    let (cancel_tx, mut cancel_rx) = watch::channel(false);
    let expedite = Arc::new(Notify::new());
    let expedite_rx = Arc::clone(&expedite);

    let task = tokio::spawn(async move {
        let mut next_delay = slot.current_interval();
        loop {
            let deadline = Instant::now() + next_delay;
            slot.set_next_tick_time(
                Utc::now() + chrono::Duration::milliseconds(next_delay.as_millis() as i64),
            );

            tokio::select! {
                _ = cancel_rx.changed() => break,
                _ = expedite_rx.notified() => {}
                _ = tokio::time::sleep_until(deadline) => {}
            }

            if *cancel_rx.borrow() || !slot.is_active() {
                break;
            }

            match core.run_tick(campaign_id, &slot).await {
                Some(delay) => next_delay = delay,
                // deactivated while the tick was in flight: exit without
                // rearming
                None => break,
            }
        }
        debug!(campaign_id = %campaign_id, "timer loop exited");
    });

    CampaignHandle {
        cancel: cancel_tx,
        expedite,
        join: Mutex::new(Some(task)),
    }
}
