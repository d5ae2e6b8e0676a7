//! Pluggable collaborator traits and built-in implementations
//!
//! ## Table of Contents
//! - **SimulationCore**: Deterministic state advancement
//! - **NarrativeAnalyzer**: Qualitative analysis of deterministic output
//! - **MemoryStore**: Durable memory writes per target kind
//! - **StatePersistence**: Authoritative state commits
//! - **InMemoryPersistence / FilePersistence / InMemoryMemoryStore**: Built-ins

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::fs;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::phase::{CampaignState, DeterministicResult, MemoryEntry, MemoryTargetKind, NarrativeResult};
use crate::types::{CampaignId, PlayerAction};

/// Deterministic simulation core: advances a campaign's state by one tick.
/// Implementations must be reproducible for a given `(campaign, tick, seed)`
/// triple. A failure here aborts the whole tick.
#[async_trait]
pub trait SimulationCore: Send + Sync {
    /// Advance the campaign by one tick, consuming the drained action batch
    async fn advance(
        &self,
        campaign_id: CampaignId,
        seed: u64,
        actions: &[PlayerAction],
    ) -> Result<DeterministicResult>;

    /// Implementation name for logging
    fn name(&self) -> &'static str;
}

/// Qualitative analyzer producing the narrative view of a tick. A failure
/// here degrades the tick to a neutral narrative instead of aborting it.
#[async_trait]
pub trait NarrativeAnalyzer: Send + Sync {
    /// Analyze the deterministic output of a tick
    async fn analyze(
        &self,
        campaign_id: CampaignId,
        deterministic: &DeterministicResult,
    ) -> Result<NarrativeResult>;

    /// Implementation name for logging
    fn name(&self) -> &'static str;
}

/// Durable memory sink for one target kind. Failures are recorded in the
/// tick's memory updates and never abort the tick or affect other stores.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Target kind this store accepts
    fn kind(&self) -> MemoryTargetKind;

    /// Write a batch of entries for one target, returning stored entry ids
    async fn store_batch(
        &self,
        target_id: &str,
        entries: &[MemoryEntry],
        campaign_id: CampaignId,
    ) -> Result<Vec<String>>;

    /// Implementation name for logging
    fn name(&self) -> &'static str;
}

/// Authoritative state sink. A failure here aborts the tick; the previous
/// committed state remains current.
#[async_trait]
pub trait StatePersistence: Send + Sync {
    /// Commit the final state of a completed tick
    async fn commit(&self, campaign_id: CampaignId, state: &CampaignState) -> Result<()>;

    /// Implementation name for logging
    fn name(&self) -> &'static str;
}

/// Shared simulation core handle
pub type BoxedSimulationCore = Arc<dyn SimulationCore>;
/// Shared narrative analyzer handle
pub type BoxedNarrativeAnalyzer = Arc<dyn NarrativeAnalyzer>;
/// Shared memory store handle
pub type BoxedMemoryStore = Arc<dyn MemoryStore>;
/// Shared persistence handle
pub type BoxedStatePersistence = Arc<dyn StatePersistence>;

/// Process-local persistence keeping the last committed state per campaign
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    states: DashMap<CampaignId, CampaignState>,
}

impl InMemoryPersistence {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Last committed state for a campaign, if any
    pub fn last_committed(&self, campaign_id: CampaignId) -> Option<CampaignState> {
        self.states.get(&campaign_id).map(|entry| entry.clone())
    }
}

#[async_trait]
impl StatePersistence for InMemoryPersistence {
    async fn commit(&self, campaign_id: CampaignId, state: &CampaignState) -> Result<()> {
        self.states.insert(campaign_id, state.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in-memory-persistence"
    }
}

/// File-backed persistence writing one JSON document per campaign
#[derive(Debug)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    /// Create a store rooted at `dir`, creating the directory if needed
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, campaign_id: CampaignId) -> PathBuf {
        self.dir.join(format!("campaign-{}.json", campaign_id))
    }

    /// Load the last committed state for a campaign, if a file exists
    pub async fn load(&self, campaign_id: CampaignId) -> Result<Option<CampaignState>> {
        let path = self.path_for(campaign_id);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl StatePersistence for FilePersistence {
    async fn commit(&self, campaign_id: CampaignId, state: &CampaignState) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        // write-then-rename so a crash never leaves a torn state file
        let tmp = self.dir.join(format!("campaign-{}.json.tmp", campaign_id));
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, self.path_for(campaign_id)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file-persistence"
    }
}

/// Process-local memory store, mainly for tests and single-node setups
#[derive(Debug)]
pub struct InMemoryMemoryStore {
    kind: MemoryTargetKind,
    entries: DashMap<String, Vec<(String, MemoryEntry)>>,
}

impl InMemoryMemoryStore {
    /// Create an empty store for one target kind
    pub fn new(kind: MemoryTargetKind) -> Self {
        Self {
            kind,
            entries: DashMap::new(),
        }
    }

    /// Entries stored for a target
    pub fn entries_for(&self, target_id: &str) -> Vec<MemoryEntry> {
        self.entries
            .get(target_id)
            .map(|stored| stored.iter().map(|(_, entry)| entry.clone()).collect())
            .unwrap_or_default()
    }

    /// Total entries stored across all targets
    pub fn total_entries(&self) -> usize {
        self.entries.iter().map(|stored| stored.len()).sum()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    fn kind(&self) -> MemoryTargetKind {
        self.kind
    }

    async fn store_batch(
        &self,
        target_id: &str,
        entries: &[MemoryEntry],
        _campaign_id: CampaignId,
    ) -> Result<Vec<String>> {
        if entries.is_empty() {
            return Err(EngineError::memory("empty entry batch"));
        }
        let mut ids = Vec::with_capacity(entries.len());
        let mut stored = self.entries.entry(target_id.to_string()).or_default();
        for entry in entries {
            let id = Uuid::new_v4().to_string();
            stored.push((id.clone(), entry.clone()));
            ids.push(id);
        }
        Ok(ids)
    }

    fn name(&self) -> &'static str {
        "in-memory-store"
    }
}
