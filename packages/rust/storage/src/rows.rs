//! Row-level reads and writes.
//!
//! Every function takes a [`Connection`] so the gateway can run them either
//! directly or inside a transaction.

use chrono::{DateTime, Utc};
use libsql::{Connection, params};

use scorecard_shared::{
    ComponentId, ComponentScore, FollowUpQuestion, Result, ScoreSummary,
    ScorecardError, TagType,
};

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

pub(crate) async fn insert_meeting(
    conn: &Connection,
    id: &str,
    user_id: &str,
    title: Option<&str>,
    notes: &str,
    date: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO meetings (id, user_id, title, notes, date) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, user_id, title, notes, date],
    )
    .await
    .map_err(ScorecardError::persistence)?;
    Ok(())
}

pub(crate) async fn insert_analysis(
    conn: &Connection,
    id: &str,
    meeting_id: &str,
    user_id: &str,
    summary: &ScoreSummary,
    email_draft: &str,
    created_at: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO analyses (id, meeting_id, user_id, overall_score, max_score, score_percentage, email_draft, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            meeting_id,
            user_id,
            i64::from(summary.overall),
            i64::from(summary.max),
            i64::from(summary.percentage),
            email_draft,
            created_at,
        ],
    )
    .await
    .map_err(ScorecardError::persistence)?;
    Ok(())
}

pub(crate) async fn insert_components<'a>(
    conn: &Connection,
    analysis_id: &str,
    components: impl IntoIterator<Item = &'a ComponentScore>,
) -> Result<()> {
    for component in components {
        conn.execute(
            "INSERT INTO meddpicc_components (analysis_id, component_type, score, summary, confidence, citation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                analysis_id,
                component.id.as_str(),
                i64::from(component.score),
                component.text.as_str(),
                component.confidence,
                component.citation.as_str(),
            ],
        )
        .await
        .map_err(ScorecardError::persistence)?;
    }
    Ok(())
}

/// Insert tags in order; `position` records the sequence.
pub(crate) async fn insert_tags(
    conn: &Connection,
    analysis_id: &str,
    tags: &[(TagType, &str)],
) -> Result<()> {
    for (position, (tag_type, value)) in tags.iter().enumerate() {
        conn.execute(
            "INSERT INTO enrichment_tags (analysis_id, tag_type, value, position) VALUES (?1, ?2, ?3, ?4)",
            params![analysis_id, tag_type.as_str(), *value, position as i64],
        )
        .await
        .map_err(ScorecardError::persistence)?;
    }
    Ok(())
}

pub(crate) async fn insert_questions(
    conn: &Connection,
    analysis_id: &str,
    questions: &[FollowUpQuestion],
) -> Result<()> {
    for (position, question) in questions.iter().enumerate() {
        conn.execute(
            "INSERT INTO follow_up_questions (analysis_id, component_type, question, position) VALUES (?1, ?2, ?3, ?4)",
            params![
                analysis_id,
                question.component.as_str(),
                question.question.as_str(),
                position as i64,
            ],
        )
        .await
        .map_err(ScorecardError::persistence)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Analysis row joined with its meeting.
#[derive(Debug, Clone)]
pub(crate) struct AnalysisRow {
    pub analysis_id: String,
    pub meeting_id: String,
    pub user_id: String,
    pub overall_score: u32,
    pub max_score: u32,
    pub score_percentage: u32,
    pub email_draft: String,
    pub created_at: DateTime<Utc>,
    pub title: Option<String>,
    pub notes: String,
    pub date: DateTime<Utc>,
}

const ANALYSIS_COLUMNS: &str = "a.id, a.meeting_id, a.user_id, a.overall_score, a.max_score, \
     a.score_percentage, a.email_draft, a.created_at, m.title, m.notes, m.date";

pub(crate) async fn get_analysis(conn: &Connection, analysis_id: &str) -> Result<Option<AnalysisRow>> {
    let sql = format!(
        "SELECT {ANALYSIS_COLUMNS} FROM analyses a JOIN meetings m ON m.id = a.meeting_id WHERE a.id = ?1"
    );
    let mut rows = conn
        .query(&sql, params![analysis_id])
        .await
        .map_err(ScorecardError::persistence)?;

    match rows.next().await {
        Ok(Some(row)) => Ok(Some(row_to_analysis(&row)?)),
        Ok(None) => Ok(None),
        Err(e) => Err(ScorecardError::persistence(e)),
    }
}

pub(crate) async fn list_analyses(conn: &Connection, user_id: &str) -> Result<Vec<AnalysisRow>> {
    let sql = format!(
        "SELECT {ANALYSIS_COLUMNS} FROM analyses a JOIN meetings m ON m.id = a.meeting_id
         WHERE a.user_id = ?1 ORDER BY a.created_at DESC, a.id DESC"
    );
    let mut rows = conn
        .query(&sql, params![user_id])
        .await
        .map_err(ScorecardError::persistence)?;

    let mut results = Vec::new();
    while let Some(row) = rows.next().await.map_err(ScorecardError::persistence)? {
        results.push(row_to_analysis(&row)?);
    }
    Ok(results)
}

pub(crate) async fn get_components(conn: &Connection, analysis_id: &str) -> Result<Vec<ComponentScore>> {
    let mut rows = conn
        .query(
            "SELECT component_type, score, summary, confidence, citation
             FROM meddpicc_components WHERE analysis_id = ?1 ORDER BY id",
            params![analysis_id],
        )
        .await
        .map_err(ScorecardError::persistence)?;

    let mut results = Vec::new();
    while let Some(row) = rows.next().await.map_err(ScorecardError::persistence)? {
        let id: ComponentId = get_string(&row, 0)?
            .parse()
            .map_err(ScorecardError::Persistence)?;
        let score = get_i64(&row, 1)?.clamp(0, 3) as u8;
        let text = get_string(&row, 2)?;
        let confidence: f64 = row.get(3).map_err(ScorecardError::persistence)?;
        let citation = row.get::<String>(4).unwrap_or_default();
        results.push(ComponentScore::new(id, score, text, confidence, citation));
    }
    Ok(results)
}

/// Tag rows in stored order.
pub(crate) async fn get_tags(conn: &Connection, analysis_id: &str) -> Result<Vec<(TagType, String)>> {
    let mut rows = conn
        .query(
            "SELECT tag_type, value FROM enrichment_tags WHERE analysis_id = ?1 ORDER BY position, id",
            params![analysis_id],
        )
        .await
        .map_err(ScorecardError::persistence)?;

    let mut results = Vec::new();
    while let Some(row) = rows.next().await.map_err(ScorecardError::persistence)? {
        let tag_type: TagType = get_string(&row, 0)?
            .parse()
            .map_err(ScorecardError::Persistence)?;
        results.push((tag_type, get_string(&row, 1)?));
    }
    Ok(results)
}

pub(crate) async fn get_questions(conn: &Connection, analysis_id: &str) -> Result<Vec<FollowUpQuestion>> {
    let mut rows = conn
        .query(
            "SELECT component_type, question FROM follow_up_questions
             WHERE analysis_id = ?1 ORDER BY position, id",
            params![analysis_id],
        )
        .await
        .map_err(ScorecardError::persistence)?;

    let mut results = Vec::new();
    while let Some(row) = rows.next().await.map_err(ScorecardError::persistence)? {
        let component: ComponentId = get_string(&row, 0)?
            .parse()
            .map_err(ScorecardError::Persistence)?;
        results.push(FollowUpQuestion {
            id: (results.len() + 1).to_string(),
            component,
            question: get_string(&row, 1)?,
        });
    }
    Ok(results)
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

fn row_to_analysis(row: &libsql::Row) -> Result<AnalysisRow> {
    Ok(AnalysisRow {
        analysis_id: get_string(row, 0)?,
        meeting_id: get_string(row, 1)?,
        user_id: get_string(row, 2)?,
        overall_score: get_i64(row, 3)? as u32,
        max_score: get_i64(row, 4)? as u32,
        score_percentage: get_i64(row, 5)? as u32,
        email_draft: get_string(row, 6)?,
        created_at: parse_timestamp(&get_string(row, 7)?)?,
        title: row.get::<String>(8).ok(),
        notes: get_string(row, 9)?,
        date: parse_timestamp(&get_string(row, 10)?)?,
    })
}

fn get_string(row: &libsql::Row, idx: i32) -> Result<String> {
    row.get::<String>(idx).map_err(ScorecardError::persistence)
}

fn get_i64(row: &libsql::Row, idx: i32) -> Result<i64> {
    row.get::<i64>(idx).map_err(ScorecardError::persistence)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ScorecardError::Persistence(format!("invalid date '{s}': {e}")))
}
