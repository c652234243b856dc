//! Wire schema of the analysis service's success response.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scorecard_shared::{Result, ScorecardError};

/// Response body as returned by the analysis service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAnalysisResponse {
    /// Keyed by the service's snake_case component names.
    #[serde(default)]
    pub meddpicc_scores: BTreeMap<String, RawComponentScore>,
    #[serde(default)]
    pub tags: Vec<RawTag>,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
    #[serde(default)]
    pub email_draft: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawComponentScore {
    pub score: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTag {
    #[serde(rename = "type")]
    pub tag_type: String,
    pub value: String,
}

impl RawAnalysisResponse {
    /// Decode a response body.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| ScorecardError::parse(format!("invalid analysis response: {e}")))
    }
}
