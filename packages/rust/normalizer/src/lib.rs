//! Maps the analysis service's response into a [`QualificationAnalysis`].
//!
//! The service speaks its own vocabulary: snake_case component keys, its own
//! tag types, and follow-up questions with no component attached. This crate
//! translates all of it through fixed tables ([`mapping`]) and derives the
//! question-to-component links ([`followups`]).

pub mod followups;
pub mod mapping;
pub mod raw;

use std::collections::BTreeMap;

use tracing::{debug, warn};

use scorecard_shared::{
    ComponentId, ComponentScore, EnrichmentTag, MAX_COMPONENT_SCORE, QualificationAnalysis,
    Result, TagType,
};

pub use followups::{FALLBACK_COMPONENT, assign_component, build_follow_ups};
pub use raw::{RawAnalysisResponse, RawComponentScore, RawTag};

/// Decode and normalize a response body.
pub fn normalize_body(body: &str) -> Result<QualificationAnalysis> {
    Ok(normalize(&RawAnalysisResponse::from_json(body)?))
}

/// Translate a raw response into the canonical aggregate.
pub fn normalize(raw: &RawAnalysisResponse) -> QualificationAnalysis {
    for key in raw.meddpicc_scores.keys() {
        if mapping::component_for_key(key).is_none() {
            warn!(key = %key, "dropping unknown component key");
        }
    }

    let mut components = BTreeMap::new();
    for (key, id) in mapping::COMPONENT_KEYS {
        if let Some(raw_score) = raw.meddpicc_scores.get(key) {
            components.insert(id, component_score(id, raw_score));
        }
    }

    let cloud_provider = raw
        .tags
        .iter()
        .find(|tag| tag.tag_type == mapping::CLOUD_PROVIDER_TAG)
        .map(|tag| tag.value.clone());

    let tags: Vec<EnrichmentTag> = raw
        .tags
        .iter()
        .map(|tag| (mapping::tag_type_for(&tag.tag_type), tag))
        .filter(|(tag_type, _)| *tag_type != TagType::Cloud)
        .enumerate()
        .map(|(i, (tag_type, tag))| EnrichmentTag {
            id: (i + 1).to_string(),
            tag_type,
            value: tag.value.clone(),
        })
        .collect();

    let mut analysis = QualificationAnalysis {
        components,
        cloud_provider,
        tags,
        follow_up_questions: Vec::new(),
        email_draft: raw.email_draft.clone(),
    };

    // Weak ids follow scorecard order, which is also the table order above.
    let weak = analysis.weak_components();
    analysis.follow_up_questions = build_follow_ups(&raw.follow_up_questions, &weak);

    debug!(
        components = analysis.components.len(),
        tags = analysis.tags.len(),
        questions = analysis.follow_up_questions.len(),
        weak = weak.len(),
        has_cloud_provider = analysis.cloud_provider.is_some(),
        "normalized analysis response"
    );

    analysis
}

fn component_score(id: ComponentId, raw: &RawComponentScore) -> ComponentScore {
    let max = i64::from(MAX_COMPONENT_SCORE);
    if !(0..=max).contains(&raw.score) {
        warn!(component = %id, score = raw.score, "score out of range, clamping");
    }
    if !(0.0..=1.0).contains(&raw.confidence) {
        warn!(component = %id, confidence = raw.confidence, "confidence out of range, clamping");
    }
    let score = raw.score.clamp(0, max) as u8;

    ComponentScore::new(
        id,
        score,
        raw.text.clone(),
        raw.confidence,
        raw.citation.clone().unwrap_or_default(),
    )
}
