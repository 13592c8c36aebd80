// src/submit/mod.rs

//! Submission Client: one HTTP POST of a QUBO document to the solver endpoint.
//!
//! No retries and no caching. A call makes exactly one exchange; transport
//! timeouts come from [`SolverSettings::timeout_secs`].

mod error;
pub mod http;
mod reply;

pub use error::SubmitError;
pub use reply::{Explanation, QuboReply};

use crate::config::SolverSettings;
use crate::qubo::QuboDocument;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client bound to one solver endpoint.
#[derive(Debug, Clone)]
pub struct SolverClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SolverClient {
    /// Builds a client for the configured endpoint.
    ///
    /// # Errors
    /// [`SubmitError::Transport`] if the underlying HTTP client cannot be built.
    pub fn new(settings: &SolverSettings) -> Result<Self, SubmitError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tacqubo/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self { http, endpoint: settings.endpoint.clone() })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POSTs `document` as JSON and returns the response body verbatim.
    ///
    /// # Errors
    /// - [`SubmitError::Encode`] if the document cannot be serialized.
    /// - [`SubmitError::Transport`] if the endpoint is unreachable or the body cannot be read.
    /// - [`SubmitError::Rejected`] for a non-success status.
    /// - [`SubmitError::MalformedResponse`] for a success status with a non-JSON body.
    pub async fn submit(&self, document: &QuboDocument) -> Result<serde_json::Value, SubmitError> {
        let body = document.to_json().map_err(|err| SubmitError::Encode { message: err.to_string() })?;
        debug!(endpoint = %self.endpoint, bytes = body.len(), "submitting document");

        let resp = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .inspect_err(|err| warn!(endpoint = %self.endpoint, %err, "solver unreachable"))?;

        let resp = http::check_response(resp).await?;
        let reply = http::read_json(resp).await?;
        debug!(endpoint = %self.endpoint, "solver accepted document");
        Ok(reply)
    }
}
