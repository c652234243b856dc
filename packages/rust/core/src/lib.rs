//! Analysis orchestration for Scorecard.
//!
//! This crate ties the transport and normalizer together behind
//! [`AnalysisOrchestrator`], which owns the analyze lifecycle, the demo/live
//! switch and the remembered notes (via a [`PreferenceStore`]).

pub mod demo;
pub mod orchestrator;
pub mod preferences;

pub use demo::demo_analysis;
pub use orchestrator::{
    AnalysisOrchestrator, AnalysisPhase, OrchestratorConfig, OrchestratorSnapshot, ToggleOutcome,
};
pub use preferences::{FilePreferences, MemoryPreferences, PreferenceStore};
