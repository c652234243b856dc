//! Linear-backoff retry around an [`HttpBackend`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use scorecard_shared::{Result, RetryPolicy};

use crate::backend::{HttpBackend, ServiceRequest, ServiceResponse};

/// Issues one logical request, retrying transient failures.
///
/// A 503/504 response or a network-level error is retried while budget
/// remains. Any other response is returned as-is on the first attempt.
/// When the budget runs out a transient response is returned to the caller
/// and a network error is propagated. At most `max_retries + 1` attempts
/// are made.
#[derive(Clone)]
pub struct RetryingTransport {
    backend: Arc<dyn HttpBackend>,
    policy: RetryPolicy,
}

impl RetryingTransport {
    pub fn new(backend: Arc<dyn HttpBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    #[instrument(skip_all, fields(url = %request.url, max_retries = self.policy.max_retries))]
    pub async fn execute(&self, request: &ServiceRequest) -> Result<ServiceResponse> {
        let mut remaining = self.policy.max_retries;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(attempt, remaining, "attempting request");

            match self.backend.send(request).await {
                Ok(response) if response.is_transient() && remaining > 0 => {
                    let delay = backoff_delay(&self.policy, remaining);
                    warn!(
                        attempt,
                        status = response.status,
                        delay_ms = delay.as_millis() as u64,
                        "transient status, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => {
                    debug!(attempt, status = response.status, "request finished");
                    return Ok(response);
                }
                Err(e) if e.is_transient() && remaining > 0 => {
                    let delay = backoff_delay(&self.policy, remaining);
                    warn!(
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "network failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "request failed");
                    return Err(e);
                }
            }

            remaining -= 1;
        }
    }
}

/// Wait before the next attempt: `base * (max_retries - remaining + 1)`.
///
/// With `remaining == max_retries` (first retry) this is `base`, then
/// `2 * base`, and so on up to `max_retries * base`.
pub fn backoff_delay(policy: &RetryPolicy, remaining: u32) -> Duration {
    let step = policy.max_retries.saturating_sub(remaining) + 1;
    policy.base_delay.saturating_mul(step)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use scorecard_shared::ScorecardError;
    use tokio::time::Instant;
    use url::Url;

    use super::*;

    /// Backend that replays a fixed script and records when it was called.
    struct ScriptedBackend {
        script: Mutex<VecDeque<Result<ServiceResponse>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<ServiceResponse>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }

        fn gaps(&self) -> Vec<Duration> {
            self.call_times()
                .windows(2)
                .map(|w| w[1].duration_since(w[0]))
                .collect()
        }
    }

    #[async_trait]
    impl HttpBackend for ScriptedBackend {
        async fn send(&self, _request: &ServiceRequest) -> Result<ServiceResponse> {
            self.calls.lock().unwrap().push(Instant::now());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("backend called more often than scripted")
        }
    }

    fn policy(max_retries: u32, base_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(base_ms),
        }
    }

    fn request() -> ServiceRequest {
        let url = Url::parse("https://analysis.example.com/v1/analyze").unwrap();
        ServiceRequest::post_json(url, &serde_json::json!({"raw_notes": "x"})).unwrap()
    }

    fn unavailable() -> Result<ServiceResponse> {
        Ok(ServiceResponse::new(503, "unavailable"))
    }

    fn connection_reset() -> Result<ServiceResponse> {
        Err(ScorecardError::Network("connection reset".into()))
    }

    #[test]
    fn backoff_grows_linearly() {
        let p = policy(3, 2000);
        assert_eq!(backoff_delay(&p, 3), Duration::from_millis(2000));
        assert_eq!(backoff_delay(&p, 2), Duration::from_millis(4000));
        assert_eq!(backoff_delay(&p, 1), Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_twice_then_success() {
        let backend = ScriptedBackend::new(vec![
            unavailable(),
            Ok(ServiceResponse::new(504, "")),
            Ok(ServiceResponse::new(200, "{}")),
        ]);
        let transport = RetryingTransport::new(backend.clone(), policy(3, 2000));

        let response = transport.execute(&request()).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(backend.call_times().len(), 3);
        assert_eq!(
            backend.gaps(),
            vec![Duration::from_millis(2000), Duration::from_millis(4000)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn always_transient_returns_last_response() {
        let backend = ScriptedBackend::new(vec![
            unavailable(),
            unavailable(),
            unavailable(),
            unavailable(),
        ]);
        let transport = RetryingTransport::new(backend.clone(), policy(3, 2000));

        let response = transport.execute(&request()).await.unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(backend.call_times().len(), 4);
        assert_eq!(
            backend.gaps(),
            vec![
                Duration::from_millis(2000),
                Duration::from_millis(4000),
                Duration::from_millis(6000)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_failure_is_not_retried() {
        let backend = ScriptedBackend::new(vec![Ok(ServiceResponse::new(500, "boom"))]);
        let transport = RetryingTransport::new(backend.clone(), policy(3, 2000));

        let response = transport.execute(&request()).await.unwrap();

        assert_eq!(response.status, 500);
        assert_eq!(backend.call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn network_failure_recovers() {
        let backend = ScriptedBackend::new(vec![
            connection_reset(),
            Ok(ServiceResponse::new(200, "{}")),
        ]);
        let transport = RetryingTransport::new(backend.clone(), policy(3, 2000));

        let response = transport.execute(&request()).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(backend.gaps(), vec![Duration::from_millis(2000)]);
    }

    #[tokio::test(start_paused = true)]
    async fn network_failure_reraised_when_exhausted() {
        let backend = ScriptedBackend::new(vec![
            connection_reset(),
            connection_reset(),
            connection_reset(),
            connection_reset(),
        ]);
        let transport = RetryingTransport::new(backend.clone(), policy(3, 2000));

        let err = transport.execute(&request()).await.unwrap_err();

        assert!(matches!(err, ScorecardError::Network(_)));
        assert_eq!(backend.call_times().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn non_network_error_is_not_retried() {
        let backend = ScriptedBackend::new(vec![Err(ScorecardError::config("bad url"))]);
        let transport = RetryingTransport::new(backend.clone(), policy(3, 2000));

        let err = transport.execute(&request()).await.unwrap_err();

        assert!(matches!(err, ScorecardError::Config { .. }));
        assert_eq!(backend.call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_single_attempt() {
        let backend = ScriptedBackend::new(vec![unavailable()]);
        let transport = RetryingTransport::new(backend.clone(), policy(0, 2000));

        let response = transport.execute(&request()).await.unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(backend.call_times().len(), 1);
    }

    #[tokio::test]
    async fn retries_against_mock_server() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/v1/analyze"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/v1/analyze"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let backend = crate::ReqwestBackend::new(Duration::from_secs(5)).unwrap();
        let transport = RetryingTransport::new(Arc::new(backend), policy(3, 10));

        let url = Url::parse(&format!("{}/v1/analyze", server.uri())).unwrap();
        let req = ServiceRequest::post_json(url, &serde_json::json!({"raw_notes": "x"})).unwrap();
        let response = transport.execute(&req).await.unwrap();

        assert_eq!(response.status, 200);
        server.verify().await;
    }
}
