//! The analyze lifecycle: `Idle → Analyzing → Succeeded | Failed`.
//!
//! One [`AnalysisOrchestrator`] owns the current result, the user-facing
//! error, the demo/live switch and the last submitted notes. Demo mode
//! resolves to a fixed scorecard after a short delay; live mode posts the
//! notes to the analysis service through [`RetryingTransport`] and
//! normalizes the answer.
//!
//! Only one analysis runs at a time. A second `analyze` while one is in
//! flight fails with [`ScorecardError::Busy`]. `clear` and `toggle_mode`
//! invalidate the in-flight analysis, whose result is then dropped on
//! arrival with [`ScorecardError::Discarded`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use scorecard_normalizer::normalize_body;
use scorecard_shared::{
    AppConfig, QualificationAnalysis, Result, RetryPolicy, ScorecardError, service_api_key,
};
use scorecard_transport::{HttpBackend, ReqwestBackend, RetryingTransport, ServiceRequest};

use crate::demo::demo_analysis;
use crate::preferences::{DEMO_MODE_KEY, LAST_NOTES_KEY, PreferenceStore};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Runtime settings for the orchestrator, resolved from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub user_id: String,
    pub organization: String,
    pub demo_latency: Duration,
}

impl From<&AppConfig> for OrchestratorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            endpoint: config.service.endpoint.clone(),
            api_key: service_api_key(config),
            user_id: config.identity.user_id.clone(),
            organization: config.identity.organization.clone(),
            demo_latency: Duration::from_millis(config.demo.latency_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisPhase {
    Idle,
    Analyzing,
    Succeeded,
    Failed,
}

impl std::fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Point-in-time copy of the orchestrator's state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorSnapshot {
    pub phase: AnalysisPhase,
    pub demo_mode: bool,
    pub result: Option<QualificationAnalysis>,
    /// User-safe message from the last failure.
    pub error: Option<String>,
    pub last_notes: String,
}

/// Result of [`AnalysisOrchestrator::toggle_mode`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    pub demo_mode: bool,
    /// The re-run analysis when switching into demo mode with notes on hand.
    pub replayed: Option<QualificationAnalysis>,
}

#[derive(Debug)]
struct State {
    phase: AnalysisPhase,
    demo_mode: bool,
    result: Option<QualificationAnalysis>,
    error: Option<String>,
    last_notes: String,
    /// Bumped by `clear` and `toggle_mode`; an analysis started under an
    /// older generation is discarded when it finishes.
    generation: u64,
}

/// Body posted to the analysis service.
#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    identity: &'a str,
    organization: &'a str,
    raw_notes: &'a str,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct AnalysisOrchestrator {
    transport: RetryingTransport,
    preferences: Arc<dyn PreferenceStore>,
    config: OrchestratorConfig,
    /// Never held across an await.
    state: Mutex<State>,
}

/// Marks an analysis as in flight. Dropping it while the phase is still
/// `Analyzing` under the same generation (the future was cancelled, or
/// failed before finishing) returns the orchestrator to `Idle`.
struct InFlight<'a> {
    state: &'a Mutex<State>,
    generation: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        if state.generation == self.generation && state.phase == AnalysisPhase::Analyzing {
            debug!("analysis abandoned before completion");
            state.phase = AnalysisPhase::Idle;
        }
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AnalysisOrchestrator {
    /// Build an orchestrator; `demo_mode` and `last_notes` are read from
    /// `preferences` (defaulting to live mode and no notes).
    pub fn new(
        transport: RetryingTransport,
        preferences: Arc<dyn PreferenceStore>,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        let demo_mode = preferences.get_bool(DEMO_MODE_KEY)?.unwrap_or(false);
        let last_notes = preferences.get_string(LAST_NOTES_KEY)?.unwrap_or_default();
        debug!(demo_mode, has_last_notes = !last_notes.is_empty(), "orchestrator ready");

        Ok(Self {
            transport,
            preferences,
            config,
            state: Mutex::new(State {
                phase: AnalysisPhase::Idle,
                demo_mode,
                result: None,
                error: None,
                last_notes,
                generation: 0,
            }),
        })
    }

    /// Wire up the HTTP backend, retry policy and settings from config.
    pub fn from_config(config: &AppConfig, preferences: Arc<dyn PreferenceStore>) -> Result<Self> {
        let backend: Arc<dyn HttpBackend> = Arc::new(ReqwestBackend::new(Duration::from_secs(
            config.service.timeout_secs,
        ))?);
        let transport = RetryingTransport::new(backend, RetryPolicy::from(config));
        Self::new(transport, preferences, OrchestratorConfig::from(config))
    }

    pub fn snapshot(&self) -> OrchestratorSnapshot {
        let state = lock(&self.state);
        OrchestratorSnapshot {
            phase: state.phase,
            demo_mode: state.demo_mode,
            result: state.result.clone(),
            error: state.error.clone(),
            last_notes: state.last_notes.clone(),
        }
    }

    pub fn demo_mode(&self) -> bool {
        lock(&self.state).demo_mode
    }

    /// Analyze `notes` and store the result.
    ///
    /// Blank notes are rejected before any state change or I/O. On failure
    /// the previous result is kept and a user-safe message is recorded.
    /// Dropping the returned future before it resolves leaves the
    /// orchestrator `Idle`.
    #[instrument(skip_all, fields(notes_len = notes.len()))]
    pub async fn analyze(&self, notes: &str) -> Result<QualificationAnalysis> {
        if notes.trim().is_empty() {
            return Err(ScorecardError::validation("meeting notes are empty"));
        }

        let (generation, demo_mode) = {
            let mut state = lock(&self.state);
            if state.phase == AnalysisPhase::Analyzing {
                warn!("analysis already in progress");
                return Err(ScorecardError::Busy);
            }
            state.last_notes = notes.to_string();
            state.phase = AnalysisPhase::Analyzing;
            (state.generation, state.demo_mode)
        };
        let _in_flight = InFlight {
            state: &self.state,
            generation,
        };

        let remembered = notes.to_string();
        self.persist(move |prefs| prefs.set_string(LAST_NOTES_KEY, &remembered))
            .await?;

        info!(demo_mode, "analysis started");
        let outcome = if demo_mode {
            self.run_demo().await
        } else {
            self.run_live(notes).await
        };
        self.finish(generation, outcome)
    }

    /// Store the outcome unless the analysis was invalidated meanwhile.
    fn finish(
        &self,
        generation: u64,
        outcome: Result<QualificationAnalysis>,
    ) -> Result<QualificationAnalysis> {
        let mut state = lock(&self.state);
        if state.generation != generation {
            info!("analysis invalidated while in flight, discarding result");
            return Err(ScorecardError::Discarded);
        }

        match outcome {
            Ok(analysis) => {
                let summary = analysis.score_summary();
                info!(
                    components = analysis.components.len(),
                    percentage = summary.percentage,
                    "analysis succeeded"
                );
                state.result = Some(analysis.clone());
                state.error = None;
                state.phase = AnalysisPhase::Succeeded;
                Ok(analysis)
            }
            Err(e) => {
                warn!(error = %e, "analysis failed");
                state.error = Some(e.user_message());
                state.phase = AnalysisPhase::Failed;
                Err(e)
            }
        }
    }

    /// Flip demo mode, persist it and drop the current result.
    ///
    /// Switching into demo mode with notes on hand re-runs the analysis.
    /// If the new mode cannot be persisted the in-memory mode is restored.
    #[instrument(skip_all)]
    pub async fn toggle_mode(&self) -> Result<ToggleOutcome> {
        let (demo_mode, generation, replay) = {
            let mut state = lock(&self.state);
            let next = !state.demo_mode;

            state.demo_mode = next;
            state.result = None;
            state.error = None;
            state.phase = AnalysisPhase::Idle;
            state.generation += 1;

            let replay = (next && !state.last_notes.trim().is_empty())
                .then(|| state.last_notes.clone());
            (next, state.generation, replay)
        };

        if let Err(e) = self
            .persist(move |prefs| prefs.set_bool(DEMO_MODE_KEY, demo_mode))
            .await
        {
            let mut state = lock(&self.state);
            if state.generation == generation {
                state.demo_mode = !demo_mode;
            }
            return Err(e);
        }
        info!(demo_mode, "mode toggled");

        let replayed = match replay {
            Some(notes) => Some(self.analyze(&notes).await?),
            None => None,
        };
        Ok(ToggleOutcome {
            demo_mode,
            replayed,
        })
    }

    /// Reset result, error and the remembered notes.
    #[instrument(skip_all)]
    pub async fn clear(&self) -> Result<()> {
        {
            let mut state = lock(&self.state);
            state.result = None;
            state.error = None;
            state.last_notes.clear();
            state.phase = AnalysisPhase::Idle;
            state.generation += 1;
        }
        self.persist(|prefs| prefs.set_string(LAST_NOTES_KEY, ""))
            .await?;
        info!("analysis state cleared");
        Ok(())
    }

    /// Run a preference write on the blocking pool.
    async fn persist<F>(&self, write: F) -> Result<()>
    where
        F: FnOnce(&dyn PreferenceStore) -> Result<()> + Send + 'static,
    {
        let preferences = Arc::clone(&self.preferences);
        tokio::task::spawn_blocking(move || write(preferences.as_ref()))
            .await
            .map_err(|e| ScorecardError::persistence(format!("preference write task failed: {e}")))?
    }

    async fn run_demo(&self) -> Result<QualificationAnalysis> {
        debug!(latency_ms = self.config.demo_latency.as_millis() as u64, "serving demo analysis");
        tokio::time::sleep(self.config.demo_latency).await;
        Ok(demo_analysis())
    }

    async fn run_live(&self, notes: &str) -> Result<QualificationAnalysis> {
        let url = Url::parse(&self.config.endpoint).map_err(|e| {
            ScorecardError::config(format!(
                "invalid service endpoint '{}': {e}",
                self.config.endpoint
            ))
        })?;
        let payload = AnalyzeRequest {
            identity: &self.config.user_id,
            organization: &self.config.organization,
            raw_notes: notes,
        };

        let mut request = ServiceRequest::post_json(url, &payload)?;
        if let Some(token) = &self.config.api_key {
            request = request.bearer(token);
        }

        let response = match self.transport.execute(&request).await {
            Ok(response) => response,
            Err(ScorecardError::Network(cause)) => {
                return Err(ScorecardError::AnalysisFailed(cause));
            }
            Err(e) => return Err(e),
        };

        if !response.is_success() {
            return Err(ScorecardError::Http {
                status: response.status,
                body: response.body,
            });
        }

        normalize_body(&response.body)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use scorecard_shared::ComponentId;
    use scorecard_transport::ServiceResponse;
    use tokio::time::Instant;

    use super::*;
    use crate::preferences::{FilePreferences, MemoryPreferences};

    const BODY: &str = r#"{
        "meddpicc_scores": {
            "metrics": {"score": 2, "text": "20% faster onboarding", "confidence": 0.8},
            "champion": {"score": 1, "text": "Possible champion in IT", "confidence": 0.5}
        },
        "tags": [{"type": "cloud_provider", "value": "GCP"}],
        "follow_up_questions": ["Who else is involved?"],
        "email_draft": "Thanks!"
    }"#;

    struct FakeBackend {
        script: StdMutex<VecDeque<Result<ServiceResponse>>>,
        bodies: StdMutex<Vec<String>>,
    }

    impl FakeBackend {
        fn new(script: Vec<Result<ServiceResponse>>) -> Arc<Self> {
            Arc::new(Self {
                script: StdMutex::new(script.into()),
                bodies: StdMutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.bodies.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn send(&self, request: &ServiceRequest) -> Result<ServiceResponse> {
            self.bodies
                .lock()
                .unwrap()
                .push(request.body.clone().unwrap_or_default());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("backend called more often than scripted")
        }
    }

    fn config() -> OrchestratorConfig {
        OrchestratorConfig {
            endpoint: "http://localhost:8787/v1/analyze-notes".into(),
            api_key: None,
            user_id: "rep-1".into(),
            organization: "acme-sales".into(),
            demo_latency: Duration::from_millis(1500),
        }
    }

    fn orchestrator(
        backend: Arc<FakeBackend>,
        prefs: Arc<MemoryPreferences>,
    ) -> AnalysisOrchestrator {
        let policy = RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(2000),
        };
        AnalysisOrchestrator::new(RetryingTransport::new(backend, policy), prefs, config())
            .expect("orchestrator")
    }

    #[tokio::test]
    async fn blank_notes_rejected_without_io() {
        let backend = FakeBackend::new(vec![]);
        let prefs = Arc::new(MemoryPreferences::new());
        let orch = orchestrator(backend.clone(), prefs.clone());

        let err = orch.analyze("   \n").await.unwrap_err();
        assert!(matches!(err, ScorecardError::Validation { .. }));

        let snap = orch.snapshot();
        assert_eq!(snap.phase, AnalysisPhase::Idle);
        assert_eq!(backend.calls(), 0);
        assert_eq!(prefs.get_string(LAST_NOTES_KEY).unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn demo_mode_returns_fixture_after_latency() {
        let backend = FakeBackend::new(vec![]);
        let prefs = Arc::new(MemoryPreferences::with_demo_mode(true));
        let orch = orchestrator(backend.clone(), prefs);

        let start = Instant::now();
        let analysis = orch.analyze("anything at all").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(1500));
        assert_eq!(analysis, demo_analysis());
        assert_eq!(backend.calls(), 0);
        assert_eq!(orch.snapshot().phase, AnalysisPhase::Succeeded);
    }

    #[tokio::test]
    async fn live_success_posts_payload_and_normalizes() {
        let backend = FakeBackend::new(vec![Ok(ServiceResponse::new(200, BODY))]);
        let prefs = Arc::new(MemoryPreferences::new());
        let orch = orchestrator(backend.clone(), prefs.clone());

        let analysis = orch.analyze("Met the IT lead").await.unwrap();
        assert_eq!(analysis.cloud_provider.as_deref(), Some("GCP"));
        assert_eq!(
            analysis.follow_up_questions[0].component,
            ComponentId::Champion
        );

        let sent: serde_json::Value =
            serde_json::from_str(&backend.bodies.lock().unwrap()[0]).unwrap();
        assert_eq!(sent["identity"], "rep-1");
        assert_eq!(sent["organization"], "acme-sales");
        assert_eq!(sent["raw_notes"], "Met the IT lead");

        let snap = orch.snapshot();
        assert_eq!(snap.phase, AnalysisPhase::Succeeded);
        assert_eq!(snap.result, Some(analysis));
        assert!(snap.error.is_none());
        assert_eq!(
            prefs.get_string(LAST_NOTES_KEY).unwrap().as_deref(),
            Some("Met the IT lead")
        );
    }

    #[tokio::test]
    async fn failure_keeps_previous_result() {
        let backend = FakeBackend::new(vec![
            Ok(ServiceResponse::new(200, BODY)),
            Ok(ServiceResponse::new(500, "stack trace")),
        ]);
        let orch = orchestrator(backend, Arc::new(MemoryPreferences::new()));

        let first = orch.analyze("first").await.unwrap();
        let err = orch.analyze("second").await.unwrap_err();
        assert!(matches!(err, ScorecardError::Http { status: 500, .. }));

        let snap = orch.snapshot();
        assert_eq!(snap.phase, AnalysisPhase::Failed);
        assert_eq!(snap.result, Some(first));
        let message = snap.error.unwrap();
        assert!(!message.contains("stack trace"));
    }

    #[tokio::test]
    async fn network_exhaustion_is_analysis_failed() {
        let backend = FakeBackend::new(vec![Err(ScorecardError::Network(
            "connection refused".into(),
        ))]);
        let orch = orchestrator(backend, Arc::new(MemoryPreferences::new()));

        let err = orch.analyze("notes").await.unwrap_err();
        assert!(matches!(err, ScorecardError::AnalysisFailed(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let backend = FakeBackend::new(vec![Ok(ServiceResponse::new(200, "<html>"))]);
        let orch = orchestrator(backend, Arc::new(MemoryPreferences::new()));

        let err = orch.analyze("notes").await.unwrap_err();
        assert!(matches!(err, ScorecardError::Parse { .. }));
        assert_eq!(orch.snapshot().phase, AnalysisPhase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn second_analyze_while_in_flight_is_busy() {
        let orch = orchestrator(
            FakeBackend::new(vec![]),
            Arc::new(MemoryPreferences::with_demo_mode(true)),
        );

        let (first, second) = tokio::join!(orch.analyze("one"), async {
            tokio::task::yield_now().await;
            orch.analyze("two").await
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(ScorecardError::Busy)));
        assert_eq!(orch.snapshot().last_notes, "one");
    }

    #[tokio::test(start_paused = true)]
    async fn clear_mid_flight_discards_result() {
        let prefs = Arc::new(MemoryPreferences::with_demo_mode(true));
        let orch = orchestrator(FakeBackend::new(vec![]), prefs.clone());

        let (analyzed, cleared) = tokio::join!(orch.analyze("notes"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            orch.clear().await
        });

        assert!(cleared.is_ok());
        assert!(matches!(analyzed, Err(ScorecardError::Discarded)));

        let snap = orch.snapshot();
        assert_eq!(snap.phase, AnalysisPhase::Idle);
        assert!(snap.result.is_none());
        assert!(snap.last_notes.is_empty());
        assert_eq!(prefs.get_string(LAST_NOTES_KEY).unwrap().as_deref(), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_into_demo_replays_last_notes() {
        let prefs = Arc::new(MemoryPreferences::new());
        prefs.set_string(LAST_NOTES_KEY, "X").unwrap();
        let backend = FakeBackend::new(vec![]);
        let orch = orchestrator(backend.clone(), prefs.clone());

        let outcome = orch.toggle_mode().await.unwrap();
        assert!(outcome.demo_mode);
        assert_eq!(outcome.replayed, Some(demo_analysis()));
        assert_eq!(prefs.get_bool(DEMO_MODE_KEY).unwrap(), Some(true));
        assert_eq!(backend.calls(), 0);

        let snap = orch.snapshot();
        assert_eq!(snap.phase, AnalysisPhase::Succeeded);
        assert_eq!(snap.last_notes, "X");
    }

    #[tokio::test]
    async fn toggle_into_live_clears_result() {
        let prefs = Arc::new(MemoryPreferences::with_demo_mode(true));
        let orch = orchestrator(FakeBackend::new(vec![]), prefs.clone());

        let outcome = orch.toggle_mode().await.unwrap();
        assert!(!outcome.demo_mode);
        assert!(outcome.replayed.is_none());
        assert_eq!(prefs.get_bool(DEMO_MODE_KEY).unwrap(), Some(false));

        let snap = orch.snapshot();
        assert!(snap.result.is_none());
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn toggle_without_notes_does_not_analyze() {
        let orch = orchestrator(FakeBackend::new(vec![]), Arc::new(MemoryPreferences::new()));
        let outcome = orch.toggle_mode().await.unwrap();
        assert!(outcome.demo_mode);
        assert!(outcome.replayed.is_none());
        assert_eq!(orch.snapshot().phase, AnalysisPhase::Idle);
    }

    /// Preference store whose writes always fail.
    struct ReadOnlyPreferences;

    impl PreferenceStore for ReadOnlyPreferences {
        fn get_bool(&self, _key: &str) -> Result<Option<bool>> {
            Ok(Some(true))
        }
        fn set_bool(&self, _key: &str, _value: bool) -> Result<()> {
            Err(ScorecardError::persistence("read-only"))
        }
        fn get_string(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn set_string(&self, _key: &str, _value: &str) -> Result<()> {
            Err(ScorecardError::persistence("read-only"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_analyze_does_not_leave_orchestrator_busy() {
        let orch = orchestrator(
            FakeBackend::new(vec![]),
            Arc::new(MemoryPreferences::with_demo_mode(true)),
        );

        let timed_out = tokio::time::timeout(Duration::from_millis(100), orch.analyze("one")).await;
        assert!(timed_out.is_err());
        assert_eq!(orch.snapshot().phase, AnalysisPhase::Idle);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let analysis = orch.analyze("two").await.unwrap();
        assert_eq!(analysis, demo_analysis());
        assert_eq!(orch.snapshot().phase, AnalysisPhase::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_analyze_keeps_previous_result() {
        let orch = orchestrator(
            FakeBackend::new(vec![]),
            Arc::new(MemoryPreferences::with_demo_mode(true)),
        );
        let first = orch.analyze("one").await.unwrap();

        let _ = tokio::time::timeout(Duration::from_millis(100), orch.analyze("two")).await;

        let snap = orch.snapshot();
        assert_eq!(snap.phase, AnalysisPhase::Idle);
        assert_eq!(snap.result, Some(first));
    }

    #[tokio::test]
    async fn failed_notes_write_returns_to_idle() {
        let backend = FakeBackend::new(vec![]);
        let orch = AnalysisOrchestrator::new(
            RetryingTransport::new(backend.clone(), RetryPolicy::default()),
            Arc::new(ReadOnlyPreferences),
            config(),
        )
        .unwrap();

        let err = orch.analyze("notes").await.unwrap_err();
        assert!(matches!(err, ScorecardError::Persistence(_)));
        assert_eq!(orch.snapshot().phase, AnalysisPhase::Idle);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn failed_mode_write_restores_mode() {
        let orch = AnalysisOrchestrator::new(
            RetryingTransport::new(FakeBackend::new(vec![]), RetryPolicy::default()),
            Arc::new(ReadOnlyPreferences),
            config(),
        )
        .unwrap();
        assert!(orch.demo_mode());

        assert!(orch.toggle_mode().await.is_err());
        assert!(orch.demo_mode());
    }

    #[tokio::test(start_paused = true)]
    async fn file_preferences_written_off_the_async_thread() {
        let dir = std::env::temp_dir().join(format!("sc_orch_{}", uuid::Uuid::now_v7()));
        let path = dir.join("preferences.toml");
        let prefs = Arc::new(FilePreferences::new(&path));
        prefs.set_bool(DEMO_MODE_KEY, true).unwrap();

        let orch = AnalysisOrchestrator::new(
            RetryingTransport::new(FakeBackend::new(vec![]), RetryPolicy::default()),
            prefs,
            config(),
        )
        .unwrap();
        orch.analyze("Met the CFO").await.unwrap();

        let reopened = FilePreferences::new(&path);
        assert_eq!(
            reopened.get_string(LAST_NOTES_KEY).unwrap().as_deref(),
            Some("Met the CFO")
        );

        orch.clear().await.unwrap();
        assert_eq!(reopened.get_string(LAST_NOTES_KEY).unwrap().as_deref(), Some(""));
    }
}
