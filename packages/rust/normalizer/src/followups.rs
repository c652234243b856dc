//! Round-robin assignment of follow-up questions to weak components.

use scorecard_shared::{ComponentId, FollowUpQuestion};

/// Component used when no component scored below 2.
pub const FALLBACK_COMPONENT: ComponentId = ComponentId::Metrics;

/// Component for the question at `index` (0-based).
///
/// Cycles through `weak` in order; [`FALLBACK_COMPONENT`] when `weak` is empty.
pub fn assign_component(weak: &[ComponentId], index: usize) -> ComponentId {
    if weak.is_empty() {
        FALLBACK_COMPONENT
    } else {
        weak[index % weak.len()]
    }
}

/// Build follow-up questions with 1-based string ids.
pub fn build_follow_ups(questions: &[String], weak: &[ComponentId]) -> Vec<FollowUpQuestion> {
    questions
        .iter()
        .enumerate()
        .map(|(i, question)| FollowUpQuestion {
            id: (i + 1).to_string(),
            component: assign_component(weak, i),
            question: question.clone(),
        })
        .collect()
}
