//! Resilient HTTP transport for the external analysis service.
//!
//! This crate provides:
//! - [`backend`] — single-attempt HTTP backends ([`ReqwestBackend`])
//! - [`retry`] — [`RetryingTransport`], linear backoff over transient failures

pub mod backend;
pub mod retry;

pub use backend::{HttpBackend, ReqwestBackend, ServiceRequest, ServiceResponse};
pub use retry::{RetryingTransport, backoff_delay};
