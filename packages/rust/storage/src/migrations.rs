//! SQL migration definitions for the Scorecard database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: meetings, analyses, components, tags, questions",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Meeting notes as submitted
CREATE TABLE IF NOT EXISTS meetings (
    id      TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title   TEXT,
    notes   TEXT NOT NULL,
    date    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_meetings_user_id ON meetings(user_id);

-- One analysis per meeting
CREATE TABLE IF NOT EXISTS analyses (
    id               TEXT PRIMARY KEY,
    meeting_id       TEXT NOT NULL UNIQUE REFERENCES meetings(id) ON DELETE CASCADE,
    user_id          TEXT NOT NULL,
    overall_score    INTEGER NOT NULL,
    max_score        INTEGER NOT NULL,
    score_percentage INTEGER NOT NULL,
    email_draft      TEXT NOT NULL,
    created_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_analyses_user_created ON analyses(user_id, created_at);

-- Per-dimension scores
CREATE TABLE IF NOT EXISTS meddpicc_components (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    analysis_id    TEXT NOT NULL REFERENCES analyses(id) ON DELETE CASCADE,
    component_type TEXT NOT NULL,
    score          INTEGER NOT NULL CHECK (score BETWEEN 0 AND 3),
    summary        TEXT NOT NULL,
    confidence     REAL NOT NULL CHECK (confidence BETWEEN 0 AND 1),
    citation       TEXT NOT NULL DEFAULT '',
    UNIQUE(analysis_id, component_type)
);

CREATE INDEX IF NOT EXISTS idx_components_analysis ON meddpicc_components(analysis_id);

-- Enrichment tags; the cloud provider is stored as tag_type 'cloud'
CREATE TABLE IF NOT EXISTS enrichment_tags (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    analysis_id TEXT NOT NULL REFERENCES analyses(id) ON DELETE CASCADE,
    tag_type    TEXT NOT NULL CHECK (tag_type IN ('cloud', 'tech', 'compliance', 'integration')),
    value       TEXT NOT NULL,
    position    INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tags_analysis ON enrichment_tags(analysis_id);

-- Follow-up questions
CREATE TABLE IF NOT EXISTS follow_up_questions (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    analysis_id    TEXT NOT NULL REFERENCES analyses(id) ON DELETE CASCADE,
    component_type TEXT NOT NULL,
    question       TEXT NOT NULL,
    position       INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_questions_analysis ON follow_up_questions(analysis_id);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
