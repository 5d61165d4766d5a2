//! Snapshot sources
//!
//! A [`SnapshotSource`] performs one raw fetch. Status classification and JSON
//! parsing stay in the poller so every source is judged by the same rules.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::PollerConfig;
use crate::error::PollError;

/// Status and body of one upstream response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// 200 response with the given body
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Response with an arbitrary status code
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can fetch the current snapshot body
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    /// Perform one fetch. Only transport-level problems are errors here.
    async fn fetch(&self) -> Result<RawResponse, PollError>;
}

/// Plain unauthenticated GET against the configured endpoint
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(config: &PollerConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.url.clone(),
            timeout: config.request_timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SnapshotSource for HttpSource {
    async fn fetch(&self) -> Result<RawResponse, PollError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "Fetched snapshot from {}", self.url);

        Ok(RawResponse { status, body })
    }
}
