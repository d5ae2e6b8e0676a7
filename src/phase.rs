//! Phase result data model for the tick pipeline
//!
//! ## Table of Contents
//! - **CampaignState**: Opaque simulated state carried between ticks
//! - **DeterministicResult**: Output of the deterministic phase
//! - **NarrativeResult**: Output of the narrative analysis phase
//! - **IntegratedResult**: Output of the integration phase
//! - **MemoryUpdate / MemoryEntry**: Records written during the memory phase
//! - **StrategicTick**: Immutable record of one completed tick

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CampaignId, PlayerAction, TickId};

/// Simulated campaign state. The engine treats the payload as opaque; only
/// the integration phase inspects well-known fields (e.g. `resources`) when
/// applying cross-domain modifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignState {
    /// Opaque state payload owned by the simulation core
    pub data: serde_json::Value,
    /// Modifiers applied by the integration phase, recorded for reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_modifiers: Option<SentimentModifiers>,
}

impl CampaignState {
    /// Wrap a state payload
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            data,
            sentiment_modifiers: None,
        }
    }
}

/// Economic summary derived by the simulation core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EconomicAnalytics {
    /// Gross domestic product
    pub gdp: f64,
    /// GDP growth rate in percent
    pub gdp_growth: f64,
    /// Inflation rate in percent
    pub inflation: f64,
    /// Unemployment rate in percent
    pub unemployment: f64,
    /// Trade balance
    pub trade_balance: f64,
    /// Production per resource kind
    pub resource_production: HashMap<String, f64>,
    /// Consumption per resource kind
    pub resource_consumption: HashMap<String, f64>,
}

/// Military summary derived by the simulation core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MilitaryAnalytics {
    /// Total force count
    pub total_forces: u64,
    /// Readiness level (0.0 - 1.0)
    pub readiness_level: f64,
    /// Morale (0.0 - 1.0)
    pub morale: f64,
    /// Defensive capability (0.0 - 1.0)
    pub defensive_capability: f64,
    /// Offensive capability (0.0 - 1.0)
    pub offensive_capability: f64,
    /// Logistics efficiency (0.0 - 1.0)
    pub logistics_efficiency: f64,
    /// Assessed threat level (0.0 - 1.0)
    pub threat_level: f64,
}

/// Research summary derived by the simulation core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchAnalytics {
    /// Active research projects
    pub total_projects: u32,
    /// Completion rate (0.0 - 1.0)
    pub completion_rate: f64,
    /// Probability of a breakthrough this tick (0.0 - 1.0)
    pub breakthrough_probability: f64,
    /// Research efficiency (0.0 - 1.0)
    pub research_efficiency: f64,
    /// Overall technology level
    pub technology_level: f64,
    /// Innovation index
    pub innovation_index: f64,
}

/// Population summary derived by the simulation core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopulationAnalytics {
    /// Total population
    pub total_population: u64,
    /// Growth rate in percent
    pub population_growth: f64,
    /// Happiness index (0.0 - 1.0)
    pub happiness_index: f64,
    /// Education level (0.0 - 1.0)
    pub education_level: f64,
    /// Health index (0.0 - 1.0)
    pub health_index: f64,
    /// Employment rate (0.0 - 1.0)
    pub employment_rate: f64,
    /// Net migration rate in percent
    pub migration_rate: f64,
}

/// Diplomatic summary derived by the simulation core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiplomaticAnalytics {
    /// Relationship score per foreign power (-1.0 - 1.0)
    pub relationships: HashMap<String, f64>,
    /// Ongoing negotiations
    pub active_negotiations: u32,
    /// Trade agreements in force
    pub trade_agreements: u32,
    /// Active conflicts
    pub conflicts: u32,
    /// Diplomatic influence (0.0 - 1.0)
    pub diplomatic_influence: f64,
}

/// Delta from the previous tick's state, computed by the simulation core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateChanges {
    /// Economic changes
    pub economic: Vec<String>,
    /// Military changes
    pub military: Vec<String>,
    /// Research changes
    pub research: Vec<String>,
    /// Population changes
    pub population: Vec<String>,
    /// Diplomatic changes
    pub diplomatic: Vec<String>,
    /// Whether any change is considered significant
    pub significant: bool,
}

/// Output of the deterministic phase. The analytics sub-fields are a
/// contract supplied by the simulation core collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeterministicResult {
    /// New simulated state
    pub state: CampaignState,
    /// Economic summary
    pub economic: EconomicAnalytics,
    /// Military summary
    pub military: MilitaryAnalytics,
    /// Research summary
    pub research: ResearchAnalytics,
    /// Population summary
    pub population: PopulationAnalytics,
    /// Diplomatic summary
    pub diplomatic: DiplomaticAnalytics,
    /// Delta from the previous tick's state
    pub changes: StateChanges,
}

/// Overall population mood levels, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodLevel {
    /// Exceptionally positive
    Ecstatic,
    /// Positive
    Happy,
    /// Neutral baseline
    Content,
    /// Mildly negative
    Concerned,
    /// Negative
    Angry,
    /// Openly hostile to leadership
    Rebellious,
}

impl MoodLevel {
    /// Mood name for tags and logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ecstatic => "ecstatic",
            Self::Happy => "happy",
            Self::Content => "content",
            Self::Concerned => "concerned",
            Self::Angry => "angry",
            Self::Rebellious => "rebellious",
        }
    }
}

/// Direction of a mood or sentiment trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Trending upward
    Improving,
    /// Flat
    Stable,
    /// Trending downward
    Declining,
}

/// Population mood section of a narrative result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationMood {
    /// Overall mood level
    pub overall: MoodLevel,
    /// Contributing factors
    pub factors: Vec<String>,
    /// Aggregate sentiment score (-1.0 - 1.0)
    pub sentiment_score: f64,
    /// Trend direction
    pub trend: TrendDirection,
}

/// Economic narrative section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicStory {
    /// One-paragraph summary
    pub summary: String,
    /// Observed trends
    pub trends: Vec<String>,
    /// Forward-looking predictions
    pub predictions: Vec<String>,
    /// Concerns raised by the analysis
    pub concerns: Vec<String>,
    /// Opportunities identified by the analysis
    pub opportunities: Vec<String>,
    /// Market commentary
    pub market_story: String,
}

/// Military narrative section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilitaryStatus {
    /// Readiness assessment
    pub readiness: String,
    /// Morale assessment
    pub morale: String,
    /// Identified threats
    pub threats: Vec<String>,
    /// Identified opportunities
    pub opportunities: Vec<String>,
    /// Strategic situation summary
    pub strategic_situation: String,
    /// Recommendations
    pub recommendations: Vec<String>,
}

/// Diplomatic narrative section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiplomaticSituation {
    /// Relationship commentary
    pub relationships: Vec<String>,
    /// Ongoing negotiations
    pub negotiations: Vec<String>,
    /// Rising tensions
    pub tensions: Vec<String>,
    /// Diplomatic opportunities
    pub opportunities: Vec<String>,
    /// Overall standing summary
    pub overall_standing: String,
}

/// Research narrative section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchNarrative {
    /// Breakthroughs this tick
    pub breakthroughs: Vec<String>,
    /// Setbacks this tick
    pub setbacks: Vec<String>,
    /// Notable innovations
    pub innovations: Vec<String>,
    /// Research climate summary
    pub research_climate: String,
    /// Future prospects
    pub future_prospects: Vec<String>,
}

/// Output of the narrative analysis phase. When the phase is disabled or
/// fails, the documented neutral default below is substituted so downstream
/// phases always receive a uniform shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeResult {
    /// Population mood analysis
    pub population_mood: PopulationMood,
    /// Economic narrative
    pub economic_story: EconomicStory,
    /// Military narrative
    pub military_status: MilitaryStatus,
    /// Diplomatic narrative
    pub diplomatic_situation: DiplomaticSituation,
    /// Research narrative
    pub research_narrative: ResearchNarrative,
    /// Overall narrative paragraph
    pub overall_narrative: String,
    /// Key events called out by the analysis
    pub key_events: Vec<String>,
    /// Forward-looking predictions
    pub predictions: Vec<String>,
    /// Analysis confidence (0.0 - 1.0)
    pub confidence_score: f64,
    /// True when this result replaced a failed analysis
    pub degraded: bool,
}

impl Default for NarrativeResult {
    /// The documented neutral default: content mood, stable trend,
    /// confidence 0.5, neutral prose for every section.
    fn default() -> Self {
        Self {
            population_mood: PopulationMood {
                overall: MoodLevel::Content,
                factors: vec!["System operating normally".to_string()],
                sentiment_score: 0.0,
                trend: TrendDirection::Stable,
            },
            economic_story: EconomicStory {
                summary: "Economic systems operating within normal parameters.".to_string(),
                trends: Vec::new(),
                predictions: vec!["Continued stable operation expected".to_string()],
                concerns: Vec::new(),
                opportunities: Vec::new(),
                market_story: "Market conditions remain stable.".to_string(),
            },
            military_status: MilitaryStatus {
                readiness: "Military systems maintain standard operational status.".to_string(),
                morale: "Personnel morale within acceptable ranges.".to_string(),
                threats: Vec::new(),
                opportunities: Vec::new(),
                strategic_situation: "Strategic situation stable.".to_string(),
                recommendations: Vec::new(),
            },
            diplomatic_situation: DiplomaticSituation {
                relationships: Vec::new(),
                negotiations: Vec::new(),
                tensions: Vec::new(),
                opportunities: Vec::new(),
                overall_standing: "Diplomatic status remains neutral.".to_string(),
            },
            research_narrative: ResearchNarrative {
                breakthroughs: Vec::new(),
                setbacks: Vec::new(),
                innovations: Vec::new(),
                research_climate: "Research activities proceeding normally.".to_string(),
                future_prospects: vec!["Steady progress expected".to_string()],
            },
            overall_narrative: "All systems operating within normal parameters.".to_string(),
            key_events: Vec::new(),
            predictions: Vec::new(),
            confidence_score: 0.5,
            degraded: false,
        }
    }
}

impl NarrativeResult {
    /// The neutral default annotated as a degraded substitution for a
    /// failed analysis.
    pub fn degraded_default() -> Self {
        Self {
            degraded: true,
            ..Self::default()
        }
    }
}

/// Inputs that produced each sentiment modifier, kept for explainability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModifierSources {
    /// Mood multiplier derived from the overall mood level
    pub population_mood: f64,
    /// Confidence derived from the economic narrative
    pub economic_confidence: f64,
    /// Morale derived from the military assessment
    pub military_morale: f64,
    /// Trust derived from the aggregate sentiment score
    pub leadership_trust: f64,
}

/// Cross-domain modifiers derived from the narrative analysis and applied
/// to the deterministic state during integration. Each value is clamped to
/// its documented range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentModifiers {
    /// Production efficiency modifier (-0.2 - 0.2)
    pub production_efficiency: f64,
    /// Research speed modifier (-0.3 - 0.3)
    pub research_speed: f64,
    /// Military morale modifier (-0.4 - 0.4)
    pub military_morale: f64,
    /// Tax compliance modifier (-0.5 - 0.5)
    pub tax_compliance: f64,
    /// Trade efficiency modifier (-0.3 - 0.3)
    pub trade_efficiency: f64,
    /// Diplomatic influence modifier (-0.2 - 0.2)
    pub diplomatic_influence: f64,
    /// Source inputs for each modifier
    pub sources: ModifierSources,
}

/// Kind of an emergent event detected during integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergentEventKind {
    /// Severe economic downturn with an angry population
    EconomicCrisis,
    /// High probability research breakthrough
    ResearchBreakthrough,
    /// Rebellious population with collapsing tax compliance
    SocialUnrest,
    /// High readiness coinciding with identified opportunities
    MilitaryOpportunity,
}

impl EmergentEventKind {
    /// Kind name for ids and tags
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EconomicCrisis => "economic_crisis",
            Self::ResearchBreakthrough => "research_breakthrough",
            Self::SocialUnrest => "social_unrest",
            Self::MilitaryOpportunity => "military_opportunity",
        }
    }
}

/// Severity of an emergent event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    /// Minor event
    Minor,
    /// Moderate event
    Moderate,
    /// Major event
    Major,
    /// Critical event
    Critical,
}

impl EventSeverity {
    /// Severity name for tags
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Major => "major",
            Self::Critical => "critical",
        }
    }
}

/// An event that emerged from combining deterministic and narrative outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergentEvent {
    /// Deterministic event id (`<kind>-<tick id>`)
    pub id: String,
    /// Event kind
    pub kind: EmergentEventKind,
    /// Severity
    pub severity: EventSeverity,
    /// Short title
    pub title: String,
    /// Description
    pub description: String,
    /// Characters involved in the event, if any
    pub character_involvement: Vec<String>,
}

/// Narrative context assembled during integration for downstream consumers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NarrativeContext {
    /// Economic trend lines
    pub economic_trends: Vec<String>,
    /// Military developments
    pub military_events: Vec<String>,
    /// Research breakthroughs carried from the narrative
    pub research_breakthroughs: Vec<String>,
    /// Population developments
    pub population_events: Vec<String>,
    /// Diplomatic developments
    pub diplomatic_developments: Vec<String>,
    /// Overall narrative carried from the analysis phase
    pub overall_narrative: String,
}

/// Output of the integration phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegratedResult {
    /// State with sentiment modifiers applied
    pub final_state: CampaignState,
    /// Modifiers derived from the narrative analysis
    pub sentiment_modifiers: SentimentModifiers,
    /// Events that emerged from the combined analysis
    pub emergent_events: Vec<EmergentEvent>,
    /// Narrative context for memory and observers
    pub narrative_context: NarrativeContext,
    /// Human-readable summary of the modifications applied
    pub modifications_applied: Vec<String>,
}

/// Memory store target kinds touched during the memory phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryTargetKind {
    /// Campaign-level (civilization) memory
    Campaign,
    /// Per-character memory
    Character,
    /// Psychological/mood continuity memory
    Psychological,
    /// Analytical insight memory
    Analytical,
}

impl MemoryTargetKind {
    /// Kind name for logging and labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Campaign => "campaign",
            Self::Character => "character",
            Self::Psychological => "psychological",
            Self::Analytical => "analytical",
        }
    }
}

/// Classification of a memory entry's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryContentType {
    /// One-line tick summary
    TickSummary,
    /// Emergent event record
    Event,
    /// Narrative analysis excerpt
    Analysis,
    /// Psychological continuity record
    PsychologyAnalysis,
    /// Analytical insight record
    AiInsight,
}

/// Importance assigned to a memory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Routine
    Low,
    /// Notable
    Medium,
    /// Significant
    High,
    /// Campaign-defining
    Critical,
}

/// Metadata attached to every memory entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryMetadata {
    /// Tick that produced the entry
    pub tick_id: TickId,
    /// Entry timestamp
    pub timestamp: DateTime<Utc>,
    /// Assigned importance
    pub importance: Importance,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Related entity references (campaigns, ticks, events, characters)
    pub related_entities: Vec<String>,
}

/// One record written to a memory store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Entry content
    pub content: String,
    /// Content classification
    pub content_type: MemoryContentType,
    /// Entry metadata
    pub metadata: MemoryMetadata,
}

/// Result of writing one memory target during a tick. Never mutated after
/// the write attempt completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryUpdate {
    /// Target kind
    pub kind: MemoryTargetKind,
    /// Target identifier (campaign id or character id)
    pub target_id: String,
    /// Entries attempted
    pub entries: Vec<MemoryEntry>,
    /// Entries actually written
    pub memory_count: usize,
    /// Whether the write succeeded
    pub success: bool,
    /// Errors recorded for this target
    pub errors: Vec<String>,
    /// Time spent on this target in milliseconds
    pub update_time_ms: u64,
}

/// Per-phase elapsed time, recorded independently of phase success
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PhaseTimings {
    /// Deterministic phase duration
    pub deterministic_ms: u64,
    /// Narrative analysis phase duration
    pub narrative_ms: u64,
    /// Integration phase duration
    pub integration_ms: u64,
    /// Memory update phase duration
    pub memory_ms: u64,
    /// Persistence phase duration
    pub persistence_ms: u64,
}

/// Immutable record of one completed tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategicTick {
    /// Campaign the tick belongs to
    pub campaign_id: CampaignId,
    /// Tick id, strictly increasing per campaign with no gaps on success
    pub tick_id: TickId,
    /// Tick timestamp
    pub timestamp: DateTime<Utc>,
    /// Reproducible seed used for the deterministic phase
    pub seed: u64,
    /// Action batch drained at the start of the tick
    pub actions: Vec<PlayerAction>,
    /// Deterministic phase output
    pub deterministic: DeterministicResult,
    /// Narrative phase output (real, default, or degraded)
    pub narrative: NarrativeResult,
    /// Integration phase output
    pub integration: IntegratedResult,
    /// Memory phase outputs, one per target touched
    pub memory_updates: Vec<MemoryUpdate>,
    /// Per-phase elapsed time
    pub phase_timings: PhaseTimings,
    /// Total processing time in milliseconds
    pub processing_time_ms: u64,
}
