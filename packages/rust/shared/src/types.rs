//! Core domain types for Scorecard qualification analyses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Highest score any single qualification dimension can reach.
pub const MAX_COMPONENT_SCORE: u8 = 3;

// ---------------------------------------------------------------------------
// Record identifiers
// ---------------------------------------------------------------------------

macro_rules! record_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new time-sortable identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

record_id!(
    /// Identifier of a stored meeting (UUID v7).
    MeetingId
);

record_id!(
    /// Identifier of a stored analysis (UUID v7).
    AnalysisId
);

// ---------------------------------------------------------------------------
// ComponentId
// ---------------------------------------------------------------------------

/// The eight MEDDPICC qualification dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentId {
    Metrics,
    EconomicBuyer,
    DecisionCriteria,
    DecisionProcess,
    PaperProcess,
    IdentifyPain,
    Champion,
    Competition,
}

impl ComponentId {
    /// Every dimension, in scorecard order.
    pub const ALL: [ComponentId; 8] = [
        Self::Metrics,
        Self::EconomicBuyer,
        Self::DecisionCriteria,
        Self::DecisionProcess,
        Self::PaperProcess,
        Self::IdentifyPain,
        Self::Champion,
        Self::Competition,
    ];

    /// Canonical identifier, also used as the stored component type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::EconomicBuyer => "economicBuyer",
            Self::DecisionCriteria => "decisionCriteria",
            Self::DecisionProcess => "decisionProcess",
            Self::PaperProcess => "paperProcess",
            Self::IdentifyPain => "identifyPain",
            Self::Champion => "champion",
            Self::Competition => "competition",
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Metrics => "Metrics",
            Self::EconomicBuyer => "Economic Buyer",
            Self::DecisionCriteria => "Decision Criteria",
            Self::DecisionProcess => "Decision Process",
            Self::PaperProcess => "Paper Process",
            Self::IdentifyPain => "Identify Pain",
            Self::Champion => "Champion",
            Self::Competition => "Competition",
        }
    }

    /// Static description of what the dimension measures.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Metrics => "Quantifiable business outcomes the customer expects to achieve.",
            Self::EconomicBuyer => "The person with final authority over budget and the purchase.",
            Self::DecisionCriteria => "The formal criteria used to evaluate competing solutions.",
            Self::DecisionProcess => "The steps, people and timeline involved in reaching a decision.",
            Self::PaperProcess => "Legal, procurement and contracting steps required to sign.",
            Self::IdentifyPain => "The business pain driving the need for change.",
            Self::Champion => "An internal advocate with influence who sells on your behalf.",
            Self::Competition => "Alternative vendors or approaches under consideration.",
        }
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComponentId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown component id: {s}"))
    }
}

// ---------------------------------------------------------------------------
// TagType
// ---------------------------------------------------------------------------

/// Canonical enrichment tag categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagType {
    Cloud,
    Tech,
    Compliance,
    Integration,
}

impl TagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Tech => "tech",
            Self::Compliance => "compliance",
            Self::Integration => "integration",
        }
    }
}

impl std::fmt::Display for TagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TagType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cloud" => Ok(Self::Cloud),
            "tech" => Ok(Self::Tech),
            "compliance" => Ok(Self::Compliance),
            "integration" => Ok(Self::Integration),
            other => Err(format!("unknown tag type: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate parts
// ---------------------------------------------------------------------------

/// Score for one qualification dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub id: ComponentId,
    pub name: String,
    pub description: String,
    /// 0..=3.
    pub score: u8,
    /// Summary of what the notes say about this dimension.
    pub text: String,
    /// 0.0..=1.0.
    pub confidence: f64,
    /// Verbatim excerpt from the notes. May be empty.
    #[serde(default)]
    pub citation: String,
}

impl ComponentScore {
    /// Build a score with name and description taken from the static lookup.
    ///
    /// `score` and `confidence` are clamped into their valid ranges.
    pub fn new(
        id: ComponentId,
        score: u8,
        text: impl Into<String>,
        confidence: f64,
        citation: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: id.name().to_string(),
            description: id.description().to_string(),
            score: score.min(MAX_COMPONENT_SCORE),
            text: text.into(),
            confidence: clamp_confidence(confidence),
            citation: citation.into(),
        }
    }
}

/// Clamp a confidence value into `0.0..=1.0`; non-finite values become 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// A classified fact extracted from the notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentTag {
    pub id: String,
    #[serde(rename = "type")]
    pub tag_type: TagType,
    pub value: String,
}

/// A question the seller should ask next, linked to a weak dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpQuestion {
    pub id: String,
    pub component: ComponentId,
    pub question: String,
}

// ---------------------------------------------------------------------------
// QualificationAnalysis
// ---------------------------------------------------------------------------

/// The canonical scorecard produced from one set of meeting notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationAnalysis {
    pub components: BTreeMap<ComponentId, ComponentScore>,
    /// Never repeated as a `cloud` entry in `tags`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider: Option<String>,
    #[serde(default)]
    pub tags: Vec<EnrichmentTag>,
    #[serde(default)]
    pub follow_up_questions: Vec<FollowUpQuestion>,
    #[serde(default)]
    pub email_draft: String,
}

/// Aggregate score figures stored alongside an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub overall: u32,
    pub max: u32,
    /// `round(100 * overall / max)`, or 0 with no components.
    pub percentage: u32,
}

impl QualificationAnalysis {
    pub fn score_summary(&self) -> ScoreSummary {
        let overall: u32 = self.components.values().map(|c| u32::from(c.score)).sum();
        let max = u32::from(MAX_COMPONENT_SCORE) * self.components.len() as u32;
        let percentage = if max == 0 {
            0
        } else {
            // Integer round-half-up of 100 * overall / max.
            (200 * overall + max) / (2 * max)
        };
        ScoreSummary {
            overall,
            max,
            percentage,
        }
    }

    /// Dimensions scored below 2, in scorecard order.
    pub fn weak_components(&self) -> Vec<ComponentId> {
        self.components
            .values()
            .filter(|c| c.score < 2)
            .map(|c| c.id)
            .collect()
    }
}
