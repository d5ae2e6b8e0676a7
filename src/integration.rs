//! Integration phase: fold the narrative analysis back into the
//! deterministic state
//!
//! ## Table of Contents
//! - **integrate**: Pure entry point combining both phase outputs
//! - Sentiment modifier derivation (clamped per-domain formulas)
//! - Emergent event detection
//! - State application (resource and credit scaling)
//!
//! Everything here is pure and deterministic: the same deterministic and
//! narrative inputs always produce the same integrated output, including
//! emergent event ids.

use crate::phase::{
    DeterministicResult, EmergentEvent, EmergentEventKind, EventSeverity, IntegratedResult,
    ModifierSources, MoodLevel, NarrativeContext, NarrativeResult, SentimentModifiers,
};
use crate::types::TickId;

/// Combine the deterministic and narrative outputs of a tick into the final
/// state, derived modifiers, and any emergent events.
pub fn integrate(
    deterministic: &DeterministicResult,
    narrative: &NarrativeResult,
    tick_id: TickId,
) -> IntegratedResult {
    let modifiers = derive_modifiers(deterministic, narrative);
    let emergent_events = detect_emergent_events(deterministic, narrative, &modifiers, tick_id);

    let mut final_state = deterministic.state.clone();
    let modifications_applied = apply_modifiers(&mut final_state, &modifiers);
    final_state.sentiment_modifiers = Some(modifiers.clone());

    IntegratedResult {
        final_state,
        sentiment_modifiers: modifiers,
        emergent_events,
        narrative_context: build_context(narrative),
        modifications_applied,
    }
}

/// Scalar multiplier for each mood level
fn mood_multiplier(mood: MoodLevel) -> f64 {
    match mood {
        MoodLevel::Ecstatic => 1.0,
        MoodLevel::Happy => 0.6,
        MoodLevel::Content => 0.2,
        MoodLevel::Concerned => -0.2,
        MoodLevel::Angry => -0.6,
        MoodLevel::Rebellious => -1.0,
    }
}

/// Confidence implied by the economic narrative: opportunities raise it,
/// concerns lower it.
fn economic_confidence(narrative: &NarrativeResult) -> f64 {
    let story = &narrative.economic_story;
    let balance = story.opportunities.len() as f64 - story.concerns.len() as f64;
    (balance * 0.1).clamp(-1.0, 1.0)
}

/// Morale implied by the military assessment's wording
fn military_morale(narrative: &NarrativeResult) -> f64 {
    let morale = narrative.military_status.morale.to_lowercase();
    if morale.contains("high") || morale.contains("excellent") {
        0.8
    } else if morale.contains("good") || morale.contains("strong") {
        0.4
    } else if morale.contains("low") || morale.contains("poor") {
        -0.4
    } else if morale.contains("critical") || morale.contains("terrible") {
        -0.8
    } else {
        0.0
    }
}

fn derive_modifiers(
    _deterministic: &DeterministicResult,
    narrative: &NarrativeResult,
) -> SentimentModifiers {
    let mood = mood_multiplier(narrative.population_mood.overall);
    let econ = economic_confidence(narrative);
    let morale = military_morale(narrative);
    let trust = narrative.population_mood.sentiment_score.clamp(-1.0, 1.0);

    SentimentModifiers {
        production_efficiency: ((mood * 0.6 + econ * 0.4) * 0.2).clamp(-0.2, 0.2),
        research_speed: ((mood * 0.4 + econ * 0.3 + trust * 0.3) * 0.3).clamp(-0.3, 0.3),
        military_morale: ((morale * 0.7 + mood * 0.3) * 0.4).clamp(-0.4, 0.4),
        tax_compliance: ((trust * 0.6 + econ * 0.4) * 0.5).clamp(-0.5, 0.5),
        trade_efficiency: ((econ * 0.5 + mood * 0.3 + trust * 0.2) * 0.3).clamp(-0.3, 0.3),
        diplomatic_influence: ((trust * 0.5 + mood * 0.3 + morale * 0.2) * 0.2)
            .clamp(-0.2, 0.2),
        sources: ModifierSources {
            population_mood: mood,
            economic_confidence: econ,
            military_morale: morale,
            leadership_trust: trust,
        },
    }
}

fn detect_emergent_events(
    deterministic: &DeterministicResult,
    narrative: &NarrativeResult,
    modifiers: &SentimentModifiers,
    tick_id: TickId,
) -> Vec<EmergentEvent> {
    let mut events = Vec::new();
    let mood = narrative.population_mood.overall;

    if deterministic.economic.gdp_growth < -5.0 && mood == MoodLevel::Angry {
        events.push(EmergentEvent {
            id: format!("economic_crisis-{tick_id}"),
            kind: EmergentEventKind::EconomicCrisis,
            severity: EventSeverity::Major,
            title: "Economic Crisis Deepens".to_string(),
            description: format!(
                "GDP contracting at {:.1}% while public anger mounts; markets and \
                 streets are both unstable.",
                deterministic.economic.gdp_growth
            ),
            character_involvement: Vec::new(),
        });
    }

    if deterministic.research.breakthrough_probability > 0.8 {
        events.push(EmergentEvent {
            id: format!("research_breakthrough-{tick_id}"),
            kind: EmergentEventKind::ResearchBreakthrough,
            severity: EventSeverity::Moderate,
            title: "Research Breakthrough Imminent".to_string(),
            description: format!(
                "Research teams report {:.0}% breakthrough probability across {} \
                 active projects.",
                deterministic.research.breakthrough_probability * 100.0,
                deterministic.research.total_projects
            ),
            character_involvement: Vec::new(),
        });
    }

    if mood == MoodLevel::Rebellious && modifiers.tax_compliance < -0.3 {
        events.push(EmergentEvent {
            id: format!("social_unrest-{tick_id}"),
            kind: EmergentEventKind::SocialUnrest,
            severity: EventSeverity::Critical,
            title: "Social Unrest Spreading".to_string(),
            description: "A rebellious population is refusing taxation and openly \
                          defying authority."
                .to_string(),
            character_involvement: Vec::new(),
        });
    }

    if deterministic.military.readiness_level > 0.8
        && !narrative.military_status.opportunities.is_empty()
    {
        events.push(EmergentEvent {
            id: format!("military_opportunity-{tick_id}"),
            kind: EmergentEventKind::MilitaryOpportunity,
            severity: EventSeverity::Moderate,
            title: "Military Opportunity Identified".to_string(),
            description: format!(
                "Forces at {:.0}% readiness with openings identified: {}",
                deterministic.military.readiness_level * 100.0,
                narrative.military_status.opportunities.join("; ")
            ),
            character_involvement: Vec::new(),
        });
    }

    events
}

/// Apply the derived modifiers to the well-known state fields: resources
/// scale with production efficiency, credits with tax compliance. Unknown
/// fields pass through untouched.
fn apply_modifiers(
    state: &mut crate::phase::CampaignState,
    modifiers: &SentimentModifiers,
) -> Vec<String> {
    let mut applied = Vec::new();

    if let Some(resources) = state
        .data
        .get_mut("resources")
        .and_then(|value| value.as_object_mut())
    {
        let factor = 1.0 + modifiers.production_efficiency;
        for (name, amount) in resources.iter_mut() {
            if let Some(current) = amount.as_f64() {
                *amount = serde_json::json!((current * factor).floor());
                applied.push(format!(
                    "resource {name} scaled by {:+.1}% production efficiency",
                    modifiers.production_efficiency * 100.0
                ));
            }
        }
    }

    if let Some(credits) = state.data.get("credits").and_then(|value| value.as_f64()) {
        let factor = 1.0 + modifiers.tax_compliance;
        state.data["credits"] = serde_json::json!((credits * factor).floor());
        applied.push(format!(
            "credits scaled by {:+.1}% tax compliance",
            modifiers.tax_compliance * 100.0
        ));
    }

    applied
}

fn build_context(narrative: &NarrativeResult) -> NarrativeContext {
    NarrativeContext {
        economic_trends: narrative.economic_story.trends.clone(),
        military_events: narrative.military_status.threats.clone(),
        research_breakthroughs: narrative.research_narrative.breakthroughs.clone(),
        population_events: narrative.population_mood.factors.clone(),
        diplomatic_developments: narrative.diplomatic_situation.tensions.clone(),
        overall_narrative: narrative.overall_narrative.clone(),
    }
}
