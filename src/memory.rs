//! Memory phase: derive durable memory entries from a tick and fan them
//! out to the configured stores
//!
//! ## Table of Contents
//! - **MemoryContext**: Inputs the builders draw from
//! - Entry builders per target kind (campaign, character, psychological,
//!   analytical)
//! - **run_memory_phase**: Fan-out with per-store failure isolation
//!
//! Each store is written independently: one store failing records errors in
//! its own `MemoryUpdate` and never affects the others or the tick.

use std::time::Instant;

use chrono::Utc;
use tracing::warn;

use crate::collaborators::BoxedMemoryStore;
use crate::phase::{
    DeterministicResult, EventSeverity, Importance, IntegratedResult, MemoryContentType,
    MemoryEntry, MemoryMetadata, MemoryTargetKind, MemoryUpdate, MoodLevel, NarrativeResult,
};
use crate::types::{CampaignId, TickId};

/// Everything the entry builders draw from for one tick
pub struct MemoryContext<'a> {
    /// Campaign being ticked
    pub campaign_id: CampaignId,
    /// Tick id
    pub tick_id: TickId,
    /// Deterministic phase output
    pub deterministic: &'a DeterministicResult,
    /// Narrative phase output
    pub narrative: &'a NarrativeResult,
    /// Integration phase output
    pub integration: &'a IntegratedResult,
    /// Previous tick's narrative for continuity analysis, if any
    pub previous_narrative: Option<&'a NarrativeResult>,
}

fn metadata(
    tick_id: TickId,
    importance: Importance,
    tags: Vec<String>,
    related: Vec<String>,
) -> MemoryMetadata {
    MemoryMetadata {
        tick_id,
        timestamp: Utc::now(),
        importance,
        tags,
        related_entities: related,
    }
}

fn severity_importance(severity: EventSeverity) -> Importance {
    match severity {
        EventSeverity::Minor => Importance::Low,
        EventSeverity::Moderate => Importance::Medium,
        EventSeverity::Major => Importance::High,
        EventSeverity::Critical => Importance::Critical,
    }
}

/// Campaign-level entries: tick summary, one entry per emergent event, and
/// a narrative analysis excerpt.
pub fn build_campaign_entries(ctx: &MemoryContext<'_>) -> Vec<MemoryEntry> {
    let mut entries = Vec::new();
    let tick_ref = format!("tick-{}", ctx.tick_id);

    entries.push(MemoryEntry {
        content: format!("Tick {}: {}", ctx.tick_id, ctx.narrative.overall_narrative),
        content_type: MemoryContentType::TickSummary,
        metadata: metadata(
            ctx.tick_id,
            if ctx.deterministic.changes.significant {
                Importance::Medium
            } else {
                Importance::Low
            },
            vec!["tick".to_string(), "summary".to_string()],
            vec![tick_ref.clone()],
        ),
    });

    for event in &ctx.integration.emergent_events {
        entries.push(MemoryEntry {
            content: format!("{}: {}", event.title, event.description),
            content_type: MemoryContentType::Event,
            metadata: metadata(
                ctx.tick_id,
                severity_importance(event.severity),
                vec![
                    "event".to_string(),
                    event.kind.as_str().to_string(),
                    event.severity.as_str().to_string(),
                ],
                vec![tick_ref.clone(), event.id.clone()],
            ),
        });
    }

    if !ctx.narrative.key_events.is_empty() {
        entries.push(MemoryEntry {
            content: format!(
                "Analysis highlights: {}",
                ctx.narrative.key_events.join("; ")
            ),
            content_type: MemoryContentType::Analysis,
            metadata: metadata(
                ctx.tick_id,
                Importance::Medium,
                vec!["analysis".to_string()],
                vec![tick_ref],
            ),
        });
    }

    entries
}

/// Per-character updates, one per character involved in an emergent event
pub fn build_character_updates(ctx: &MemoryContext<'_>) -> Vec<(String, Vec<MemoryEntry>)> {
    let mut updates: Vec<(String, Vec<MemoryEntry>)> = Vec::new();
    for event in &ctx.integration.emergent_events {
        for character in &event.character_involvement {
            let entry = MemoryEntry {
                content: format!(
                    "Involved in {}: {}",
                    event.title, event.description
                ),
                content_type: MemoryContentType::Event,
                metadata: metadata(
                    ctx.tick_id,
                    severity_importance(event.severity),
                    vec!["character".to_string(), event.kind.as_str().to_string()],
                    vec![format!("tick-{}", ctx.tick_id), event.id.clone()],
                ),
            };
            match updates.iter_mut().find(|(id, _)| id == character) {
                Some((_, entries)) => entries.push(entry),
                None => updates.push((character.clone(), vec![entry])),
            }
        }
    }
    updates
}

/// Psychological continuity entry: current mood, trend continuity against
/// the previous tick, and significant shifts.
pub fn build_psychological_entry(ctx: &MemoryContext<'_>) -> MemoryEntry {
    let mood = ctx.narrative.population_mood.overall;
    let score = ctx.narrative.population_mood.sentiment_score;

    let mut lines = vec![format!(
        "Population mood is {} (sentiment {:+.2}, trend {:?}).",
        mood.as_str(),
        score,
        ctx.narrative.population_mood.trend
    )];

    if let Some(previous) = ctx.previous_narrative {
        let prev_mood = previous.population_mood.overall;
        let shift = score - previous.population_mood.sentiment_score;
        if ctx.narrative.population_mood.trend == previous.population_mood.trend {
            lines.push(format!(
                "Trend continues from the previous tick ({:?}).",
                previous.population_mood.trend
            ));
        }
        if prev_mood != mood {
            lines.push(format!(
                "Mood shifted from {} to {}.",
                prev_mood.as_str(),
                mood.as_str()
            ));
        }
        if shift.abs() > 0.2 {
            lines.push(format!("Significant sentiment shift of {shift:+.2}."));
        }
    }

    let importance = match mood {
        MoodLevel::Rebellious => Importance::Critical,
        MoodLevel::Angry | MoodLevel::Ecstatic => Importance::High,
        MoodLevel::Happy | MoodLevel::Concerned => Importance::Medium,
        MoodLevel::Content => Importance::Low,
    };

    MemoryEntry {
        content: lines.join(" "),
        content_type: MemoryContentType::PsychologyAnalysis,
        metadata: metadata(
            ctx.tick_id,
            importance,
            vec!["psychology".to_string(), mood.as_str().to_string()],
            vec![format!("tick-{}", ctx.tick_id)],
        ),
    }
}

/// Analytical insight entries: economic insight, strategic assessment, and
/// a cross-domain correlation.
pub fn build_analytical_entries(ctx: &MemoryContext<'_>) -> Vec<MemoryEntry> {
    let economic = &ctx.deterministic.economic;
    let military = &ctx.deterministic.military;
    let tick_ref = format!("tick-{}", ctx.tick_id);

    let economic_entry = MemoryEntry {
        content: format!(
            "Economic snapshot: GDP growth {:+.1}%, inflation {:.1}%, unemployment \
             {:.1}%. {}",
            economic.gdp_growth,
            economic.inflation,
            economic.unemployment,
            ctx.narrative.economic_story.summary
        ),
        content_type: MemoryContentType::AiInsight,
        metadata: metadata(
            ctx.tick_id,
            if economic.gdp_growth.abs() > 3.0 {
                Importance::High
            } else {
                Importance::Medium
            },
            vec!["economic".to_string(), "insight".to_string()],
            vec![tick_ref.clone()],
        ),
    };

    let strategic_entry = MemoryEntry {
        content: format!(
            "Strategic assessment: readiness {:.0}%, threat level {:.0}%. {}",
            military.readiness_level * 100.0,
            military.threat_level * 100.0,
            ctx.narrative.military_status.strategic_situation
        ),
        content_type: MemoryContentType::AiInsight,
        metadata: metadata(
            ctx.tick_id,
            if military.threat_level > 0.7 {
                Importance::High
            } else {
                Importance::Medium
            },
            vec!["military".to_string(), "insight".to_string()],
            vec![tick_ref.clone()],
        ),
    };

    let modifiers = &ctx.integration.sentiment_modifiers;
    let correlation_entry = MemoryEntry {
        content: format!(
            "Cross-domain correlation: mood factor {:+.2} driving production \
             {:+.1}% and tax compliance {:+.1}%.",
            modifiers.sources.population_mood,
            modifiers.production_efficiency * 100.0,
            modifiers.tax_compliance * 100.0
        ),
        content_type: MemoryContentType::AiInsight,
        metadata: metadata(
            ctx.tick_id,
            Importance::Medium,
            vec!["correlation".to_string(), "insight".to_string()],
            vec![tick_ref],
        ),
    };

    vec![economic_entry, strategic_entry, correlation_entry]
}

async fn write_target(
    store: &BoxedMemoryStore,
    kind: MemoryTargetKind,
    target_id: String,
    entries: Vec<MemoryEntry>,
    campaign_id: CampaignId,
) -> MemoryUpdate {
    let started = Instant::now();
    let result = store.store_batch(&target_id, &entries, campaign_id).await;
    let update_time_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(ids) => MemoryUpdate {
            kind,
            target_id,
            entries,
            memory_count: ids.len(),
            success: true,
            errors: Vec::new(),
            update_time_ms,
        },
        Err(err) => {
            warn!(
                campaign_id = %campaign_id,
                target = %target_id,
                kind = kind.as_str(),
                store = store.name(),
                error = %err,
                "memory store write failed"
            );
            MemoryUpdate {
                kind,
                target_id,
                entries,
                memory_count: 0,
                success: false,
                errors: vec![err.to_string()],
                update_time_ms,
            }
        }
    }
}

/// Run the memory phase: build entries per target kind and write them to
/// every configured store of that kind. Returns one update per target
/// written, in a stable order.
pub async fn run_memory_phase(
    stores: &[BoxedMemoryStore],
    ctx: &MemoryContext<'_>,
) -> Vec<MemoryUpdate> {
    let mut updates = Vec::new();
    let campaign_target = ctx.campaign_id.to_string();

    for store in stores {
        match store.kind() {
            MemoryTargetKind::Campaign => {
                let entries = build_campaign_entries(ctx);
                updates.push(
                    write_target(
                        store,
                        MemoryTargetKind::Campaign,
                        campaign_target.clone(),
                        entries,
                        ctx.campaign_id,
                    )
                    .await,
                );
            }
            MemoryTargetKind::Character => {
                for (character, entries) in build_character_updates(ctx) {
                    updates.push(
                        write_target(
                            store,
                            MemoryTargetKind::Character,
                            character,
                            entries,
                            ctx.campaign_id,
                        )
                        .await,
                    );
                }
            }
            MemoryTargetKind::Psychological => {
                let entry = build_psychological_entry(ctx);
                updates.push(
                    write_target(
                        store,
                        MemoryTargetKind::Psychological,
                        campaign_target.clone(),
                        vec![entry],
                        ctx.campaign_id,
                    )
                    .await,
                );
            }
            MemoryTargetKind::Analytical => {
                let entries = build_analytical_entries(ctx);
                updates.push(
                    write_target(
                        store,
                        MemoryTargetKind::Analytical,
                        campaign_target.clone(),
                        entries,
                        ctx.campaign_id,
                    )
                    .await,
                );
            }
        }
    }

    updates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::InMemoryMemoryStore;
    use crate::integration::integrate;
    use crate::phase::{DeterministicResult, EmergentEventKind, EventSeverity, TrendDirection};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FailingStore(MemoryTargetKind);

    #[async_trait]
    impl crate::collaborators::MemoryStore for FailingStore {
        fn kind(&self) -> MemoryTargetKind {
            self.0
        }

        async fn store_batch(
            &self,
            _target_id: &str,
            _entries: &[MemoryEntry],
            _campaign_id: CampaignId,
        ) -> crate::error::Result<Vec<String>> {
            Err(crate::error::EngineError::memory("store unavailable"))
        }

        fn name(&self) -> &'static str {
            "failing-store"
        }
    }

    fn integrated_with_event() -> IntegratedResult {
        let det = DeterministicResult::default();
        let mut result = integrate(&det, &NarrativeResult::default(), 1);
        result.emergent_events.push(crate::phase::EmergentEvent {
            id: "social_unrest-1".to_string(),
            kind: EmergentEventKind::SocialUnrest,
            severity: EventSeverity::Critical,
            title: "Unrest".to_string(),
            description: "Riots in the capital.".to_string(),
            character_involvement: vec!["governor-ada".to_string(), "general-rex".to_string()],
        });
        result
    }

    #[tokio::test]
    async fn test_campaign_entries_include_events() {
        let det = DeterministicResult::default();
        let narrative = NarrativeResult::default();
        let integration = integrated_with_event();
        let ctx = MemoryContext {
            campaign_id: CampaignId::new(1),
            tick_id: 1,
            deterministic: &det,
            narrative: &narrative,
            integration: &integration,
            previous_narrative: None,
        };

        let entries = build_campaign_entries(&ctx);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content_type, MemoryContentType::TickSummary);
        assert!(entries[0].content.starts_with("Tick 1:"));
        assert_eq!(entries[1].content_type, MemoryContentType::Event);
        assert_eq!(entries[1].metadata.importance, Importance::Critical);
    }

    #[tokio::test]
    async fn test_character_updates_grouped_per_character() {
        let det = DeterministicResult::default();
        let narrative = NarrativeResult::default();
        let integration = integrated_with_event();
        let ctx = MemoryContext {
            campaign_id: CampaignId::new(1),
            tick_id: 1,
            deterministic: &det,
            narrative: &narrative,
            integration: &integration,
            previous_narrative: None,
        };

        let updates = build_character_updates(&ctx);
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].0, "governor-ada");
        assert_eq!(updates[1].0, "general-rex");
    }

    #[tokio::test]
    async fn test_psychological_entry_tracks_continuity() {
        let det = DeterministicResult::default();
        let mut narrative = NarrativeResult::default();
        narrative.population_mood.overall = MoodLevel::Angry;
        narrative.population_mood.sentiment_score = -0.5;
        narrative.population_mood.trend = TrendDirection::Declining;
        let previous = NarrativeResult::default();
        let integration = integrate(&det, &narrative, 2);
        let ctx = MemoryContext {
            campaign_id: CampaignId::new(1),
            tick_id: 2,
            deterministic: &det,
            narrative: &narrative,
            integration: &integration,
            previous_narrative: Some(&previous),
        };

        let entry = build_psychological_entry(&ctx);
        assert_eq!(entry.metadata.importance, Importance::High);
        assert!(entry.content.contains("shifted from content to angry"));
        assert!(entry.content.contains("Significant sentiment shift"));
    }

    #[tokio::test]
    async fn test_failing_store_isolated() {
        let det = DeterministicResult::default();
        let narrative = NarrativeResult::default();
        let integration = integrate(&det, &narrative, 1);
        let ctx = MemoryContext {
            campaign_id: CampaignId::new(1),
            tick_id: 1,
            deterministic: &det,
            narrative: &narrative,
            integration: &integration,
            previous_narrative: None,
        };

        let healthy = Arc::new(InMemoryMemoryStore::new(MemoryTargetKind::Campaign));
        let stores: Vec<BoxedMemoryStore> = vec![
            Arc::new(FailingStore(MemoryTargetKind::Psychological)),
            healthy.clone(),
        ];

        let updates = run_memory_phase(&stores, &ctx).await;
        assert_eq!(updates.len(), 2);
        let failed = &updates[0];
        assert!(!failed.success);
        assert_eq!(failed.memory_count, 0);
        assert_eq!(failed.errors.len(), 1);

        let ok = &updates[1];
        assert!(ok.success);
        assert!(ok.memory_count > 0);
        assert_eq!(healthy.total_entries(), ok.memory_count);
    }

    #[tokio::test]
    async fn test_analytical_entries_shape() {
        let mut det = DeterministicResult::default();
        det.economic.gdp_growth = 4.0;
        det.military.threat_level = 0.8;
        let narrative = NarrativeResult::default();
        let integration = integrate(&det, &narrative, 1);
        let ctx = MemoryContext {
            campaign_id: CampaignId::new(1),
            tick_id: 1,
            deterministic: &det,
            narrative: &narrative,
            integration: &integration,
            previous_narrative: None,
        };

        let entries = build_analytical_entries(&ctx);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].metadata.importance, Importance::High);
        assert_eq!(entries[1].metadata.importance, Importance::High);
        assert!(entries
            .iter()
            .all(|entry| entry.content_type == MemoryContentType::AiInsight));
    }
}
