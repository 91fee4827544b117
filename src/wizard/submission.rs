//! Submission state machine and the outbound registration seam.
//!
//! The final step of a submitting flow runs one [`SubmitEffect`]. The
//! default effect logs the payload the real backend will receive and waits a
//! fixed delay; [`HttpSubmitter`] posts it instead.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::SubmissionError;

/// Lifecycle of a flow's final submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed {
        reason: String,
    },
}

impl SubmissionState {
    /// The form accepts input and navigation.
    pub fn is_editable(&self) -> bool {
        !matches!(self, Self::Submitting | Self::Succeeded)
    }
}

/// The single effect a submitting flow invokes on its final step.
#[async_trait]
pub trait SubmitEffect: Send + Sync {
    /// POST `payload` to `endpoint` (a path such as
    /// `/api/climate-finance/register`).
    async fn submit(&self, endpoint: &str, payload: &serde_json::Value)
    -> Result<(), SubmissionError>;
}

/// Logs the payload in place of the backend call, after a fixed delay.
pub struct LoggingSubmitter {
    delay: Duration,
}

impl LoggingSubmitter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl SubmitEffect for LoggingSubmitter {
    async fn submit(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<(), SubmissionError> {
        info!(endpoint, payload = %payload, "API Ready - POST {}", endpoint);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(())
    }
}

/// Posts the payload as JSON to `base_url` + endpoint.
pub struct HttpSubmitter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSubmitter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SubmitEffect for HttpSubmitter {
    async fn submit(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<(), SubmissionError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            info!(url = %url, status = status.as_u16(), "Registration submitted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(url = %url, status = status.as_u16(), "Registration endpoint rejected submission");
        Err(SubmissionError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Submission id in the `prefix_<epoch-millis>` format the backend expects.
pub fn submission_id(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}_{}", at.timestamp_millis())
}

/// ISO-8601 timestamp with millisecond precision and a `Z` suffix.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
