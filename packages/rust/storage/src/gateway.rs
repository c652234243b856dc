//! Maps [`QualificationAnalysis`] onto the relational tables and back.
//!
//! `save` writes meeting → analysis → components → tags → questions in that
//! order, each later row referencing ids produced earlier. The whole sequence
//! runs in one transaction: if any step fails nothing is committed.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use scorecard_shared::{
    AnalysisId, EnrichmentTag, MeetingId, QualificationAnalysis, Result, ScoreSummary,
    ScorecardError, TagType,
};

use crate::Storage;
use crate::rows::{self, AnalysisRow};

/// Ids created by a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedAnalysis {
    pub meeting_id: MeetingId,
    pub analysis_id: AnalysisId,
}

/// Meeting fields returned with a loaded analysis.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingMeta {
    pub id: MeetingId,
    pub user_id: String,
    pub title: Option<String>,
    pub date: DateTime<Utc>,
}

/// A stored analysis rebuilt into its canonical form.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedAnalysis {
    pub analysis_id: AnalysisId,
    pub notes: String,
    pub analysis: QualificationAnalysis,
    pub meeting: MeetingMeta,
    /// Figures as stored at save time.
    pub summary: ScoreSummary,
    pub created_at: DateTime<Utc>,
}

/// One entry of a user's analysis history.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub analysis_id: AnalysisId,
    pub meeting_id: MeetingId,
    pub title: Option<String>,
    pub date: DateTime<Utc>,
    pub summary: ScoreSummary,
    pub created_at: DateTime<Utc>,
}

impl Storage {
    /// Persist an analysis together with the notes it was produced from.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn save_analysis(
        &self,
        user_id: &str,
        notes: &str,
        analysis: &QualificationAnalysis,
        title: Option<&str>,
    ) -> Result<SavedAnalysis> {
        let meeting_id = MeetingId::new();
        let analysis_id = AnalysisId::new();
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let summary = analysis.score_summary();

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(ScorecardError::persistence)?;

        let written = async {
            let meeting_key = meeting_id.to_string();
            let analysis_key = analysis_id.to_string();

            rows::insert_meeting(&tx, &meeting_key, user_id, title, notes, &now).await?;
            rows::insert_analysis(
                &tx,
                &analysis_key,
                &meeting_key,
                user_id,
                &summary,
                &analysis.email_draft,
                &now,
            )
            .await?;
            rows::insert_components(&tx, &analysis_key, analysis.components.values()).await?;
            rows::insert_tags(&tx, &analysis_key, &tag_rows(analysis)).await?;
            rows::insert_questions(&tx, &analysis_key, &analysis.follow_up_questions).await?;
            Ok::<_, ScorecardError>(())
        }
        .await;

        if let Err(e) = written {
            warn!(error = %e, "save failed, rolling back");
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "rollback failed");
            }
            return Err(e);
        }
        tx.commit().await.map_err(ScorecardError::persistence)?;

        info!(
            %meeting_id,
            %analysis_id,
            overall = summary.overall,
            max = summary.max,
            percentage = summary.percentage,
            "analysis saved"
        );

        Ok(SavedAnalysis {
            meeting_id,
            analysis_id,
        })
    }

    /// Load a stored analysis by id.
    #[instrument(skip_all, fields(analysis_id = %analysis_id))]
    pub async fn load_analysis(&self, analysis_id: &AnalysisId) -> Result<LoadedAnalysis> {
        let key = analysis_id.to_string();
        let row = rows::get_analysis(&self.conn, &key)
            .await?
            .ok_or_else(|| ScorecardError::NotFound {
                entity: "analysis",
                id: key.clone(),
            })?;

        let components = rows::get_components(&self.conn, &key).await?;
        let tag_rows = rows::get_tags(&self.conn, &key).await?;
        let follow_up_questions = rows::get_questions(&self.conn, &key).await?;

        let mut cloud_provider = None;
        let mut tags = Vec::new();
        for (tag_type, value) in tag_rows {
            if tag_type == TagType::Cloud {
                if cloud_provider.is_none() {
                    cloud_provider = Some(value);
                }
                continue;
            }
            tags.push(EnrichmentTag {
                id: (tags.len() + 1).to_string(),
                tag_type,
                value,
            });
        }

        let analysis = QualificationAnalysis {
            components: components
                .into_iter()
                .map(|c| (c.id, c))
                .collect::<BTreeMap<_, _>>(),
            cloud_provider,
            tags,
            follow_up_questions,
            email_draft: row.email_draft.clone(),
        };

        debug!(
            components = analysis.components.len(),
            tags = analysis.tags.len(),
            questions = analysis.follow_up_questions.len(),
            "analysis loaded"
        );

        let meeting = meeting_meta(&row)?;
        let summary = stored_summary(&row);
        Ok(LoadedAnalysis {
            analysis_id: analysis_id.clone(),
            notes: row.notes,
            analysis,
            meeting,
            summary,
            created_at: row.created_at,
        })
    }

    /// A user's analyses, newest first.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn list_analyses(&self, user_id: &str) -> Result<Vec<AnalysisSummary>> {
        rows::list_analyses(&self.conn, user_id)
            .await?
            .into_iter()
            .map(|row| {
                Ok(AnalysisSummary {
                    analysis_id: parse_id(&row.analysis_id)?,
                    meeting_id: parse_id(&row.meeting_id)?,
                    summary: stored_summary(&row),
                    title: row.title,
                    date: row.date,
                    created_at: row.created_at,
                })
            })
            .collect()
    }
}

/// Cloud provider first (as a `cloud` row), then the generic tags.
fn tag_rows(analysis: &QualificationAnalysis) -> Vec<(TagType, &str)> {
    analysis
        .cloud_provider
        .iter()
        .map(|provider| (TagType::Cloud, provider.as_str()))
        .chain(
            analysis
                .tags
                .iter()
                .map(|tag| (tag.tag_type, tag.value.as_str())),
        )
        .collect()
}

fn stored_summary(row: &AnalysisRow) -> ScoreSummary {
    ScoreSummary {
        overall: row.overall_score,
        max: row.max_score,
        percentage: row.score_percentage,
    }
}

fn meeting_meta(row: &AnalysisRow) -> Result<MeetingMeta> {
    Ok(MeetingMeta {
        id: parse_id(&row.meeting_id)?,
        user_id: row.user_id.clone(),
        title: row.title.clone(),
        date: row.date,
    })
}

fn parse_id<T: std::str::FromStr<Err = uuid::Error>>(s: &str) -> Result<T> {
    s.parse()
        .map_err(|e| ScorecardError::Persistence(format!("invalid stored id '{s}': {e}")))
}
