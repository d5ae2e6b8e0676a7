//! Error types for the engine
//!
//! ## Table of Contents
//! - **EngineError**: Main error enum covering all failure modes
//! - **Result**: Type alias for `Result<T, EngineError>`

use thiserror::Error;

use crate::types::CampaignId;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Campaign id already present in the registry
    #[error("campaign {0} is already registered")]
    AlreadyRegistered(CampaignId),

    /// Campaign id not present in the registry
    #[error("campaign {0} is not registered")]
    NotRegistered(CampaignId),

    /// Campaign is already ticking
    #[error("campaign {0} is already active")]
    AlreadyActive(CampaignId),

    /// Configuration error during builder setup
    #[error("configuration error: {0}")]
    Config(String),

    /// Deterministic simulation phase failure (fatal to the tick)
    #[error("simulation error: {0}")]
    Simulation(String),

    /// Narrative analysis failure (handled as a degraded result)
    #[error("analysis error: {0}")]
    Analysis(String),

    /// Memory store write failure (recorded per target, never fatal)
    #[error("memory error: {0}")]
    Memory(String),

    /// State commit failure (fatal to the tick)
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Engine is shutting down; no new work accepted
    #[error("engine is shutting down")]
    ShuttingDown,

    /// Metrics collection or export failure
    #[error("metrics error: {0}")]
    Metrics(String),

    /// Generic IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (should not occur in normal operation)
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a simulation error
    pub fn simulation(msg: impl Into<String>) -> Self {
        Self::Simulation(msg.into())
    }

    /// Create an analysis error
    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis(msg.into())
    }

    /// Create a memory error
    pub fn memory(msg: impl Into<String>) -> Self {
        Self::Memory(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a metrics error
    pub fn metrics(msg: impl Into<String>) -> Self {
        Self::Metrics(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error aborts the whole tick (deterministic or
    /// persistence phase failures) as opposed to being absorbed locally.
    pub fn is_fatal_to_tick(&self) -> bool {
        matches!(self, Self::Simulation(_) | Self::Persistence(_))
    }
}

impl From<prometheus::Error> for EngineError {
    fn from(err: prometheus::Error) -> Self {
        Self::Metrics(err.to_string())
    }
}
