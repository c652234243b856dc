//! Single-attempt HTTP backends.
//!
//! A backend performs exactly one request and reports either the status and
//! body it got back, or a [`ScorecardError::Network`] when no response was
//! received at all. Retry decisions live in [`crate::RetryingTransport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Serialize;
use tracing::debug;
use url::Url;

use scorecard_shared::{Result, ScorecardError};

/// User-Agent string for analysis requests.
const USER_AGENT: &str = concat!("Scorecard/", env!("CARGO_PKG_VERSION"));

/// HTTP statuses the transport treats as transient.
const GATEWAY_TIMEOUT: u16 = 504;
const SERVICE_UNAVAILABLE: u16 = 503;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// One logical request against the analysis service.
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ServiceRequest {
    /// Build a `POST` request with a JSON body.
    pub fn post_json<T: Serialize>(url: Url, payload: &T) -> Result<Self> {
        let body = serde_json::to_string(payload)
            .map_err(|e| ScorecardError::parse(format!("failed to encode request: {e}")))?;
        Ok(Self {
            method: Method::POST,
            url,
            headers: vec![("content-type".into(), "application/json".into())],
            body: Some(body),
        })
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add an `Authorization: Bearer` header.
    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", format!("Bearer {token}"))
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
}

impl ServiceResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Gateway timeout or service unavailable.
    pub fn is_transient(&self) -> bool {
        self.status == GATEWAY_TIMEOUT || self.status == SERVICE_UNAVAILABLE
    }
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

/// Sends a single request. Implementations must not retry.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn send(&self, request: &ServiceRequest) -> Result<ServiceResponse>;
}

/// [`HttpBackend`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: Client,
}

impl ReqwestBackend {
    /// Create a backend whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ScorecardError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: &ServiceRequest) -> Result<ServiceResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                ScorecardError::config(format!("invalid request to {}: {e}", request.url))
            } else {
                ScorecardError::Network(format!("{}: {e}", request.url))
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            ScorecardError::Network(format!("{}: body read failed: {e}", request.url))
        })?;

        Ok(ServiceResponse { status, body })
    }
}
