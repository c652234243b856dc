//! libSQL persistence for qualification analyses (local embedded mode).
//!
//! The [`Storage`] struct owns the database handle. Saving, loading and
//! listing analyses live in [`gateway`]; SQL row mapping lives in `rows`.

mod gateway;
mod migrations;
mod rows;

use std::path::Path;

use libsql::{Connection, Database, params};
use tracing::{debug, info};

use scorecard_shared::{Result, ScorecardError};

pub use gateway::{AnalysisSummary, LoadedAnalysis, MeetingMeta, SavedAnalysis};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path` and bring its schema up to date.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ScorecardError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(ScorecardError::persistence)?;
        let conn = db.connect().map_err(ScorecardError::persistence)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .await
            .map_err(ScorecardError::persistence)?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        debug!(path = %path.display(), "storage opened");
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ScorecardError::Persistence(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 before the first migration.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            // Table doesn't exist yet
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn temp_db() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("sc_test_{}.db", Uuid::now_v7()))
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = Storage::open(&temp_db()).await.expect("open test db");
        assert_eq!(storage.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let path = temp_db();
        let first = Storage::open(&path).await.expect("first open");
        drop(first);
        let second = Storage::open(&path).await.expect("second open");
        assert_eq!(second.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn creates_missing_parent_directory() {
        let dir = std::env::temp_dir().join(format!("sc_dir_{}", Uuid::now_v7()));
        let path = dir.join("nested").join("scorecard.db");
        Storage::open(&path).await.expect("open nested");
        assert!(path.exists());
    }
}
