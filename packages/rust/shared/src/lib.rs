//! Shared types, error model, and configuration for Scorecard.
//!
//! This crate is the foundation depended on by all other Scorecard crates.
//! It provides:
//! - [`ScorecardError`] — the unified error type
//! - Domain types ([`QualificationAnalysis`], [`ComponentScore`], [`EnrichmentTag`],
//!   [`FollowUpQuestion`])
//! - Configuration ([`AppConfig`], [`RetryPolicy`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DemoConfig, IdentityConfig, RetryConfig, RetryPolicy, ServiceConfig,
    StorageConfig, config_dir, config_file_path, expand_home, init_config, load_config,
    load_config_from, service_api_key, validate_config,
};
pub use error::{Result, ScorecardError};
pub use types::{
    AnalysisId, ComponentId, ComponentScore, EnrichmentTag, FollowUpQuestion,
    MAX_COMPONENT_SCORE, MeetingId, QualificationAnalysis, ScoreSummary, TagType,
    clamp_confidence,
};
