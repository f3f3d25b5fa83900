//! Request/response schemas for the backend HTTP API.
//!
//! Responses are deserialized leniently: every field the tracker merges is
//! optional on the wire, and malformed values degrade to "no update" rather
//! than a deserialization failure.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::{ImportJob, ImportStage, JobId};

/// Body for the submit-import endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImportRequest {
    /// Source video URL to import
    pub url: String,
}

/// Response from the submit-import endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImportResponse {
    /// Backend-assigned job ID
    #[serde(default)]
    pub job_id: String,

    /// Normalized source URL
    #[serde(default)]
    pub url: Option<String>,

    /// Initial stage, typically "Queued"
    #[serde(default)]
    pub status: Option<String>,

    /// Initial progress, typically 0
    #[serde(default)]
    pub progress: Option<u8>,

    /// Initial status text
    #[serde(default)]
    pub message: Option<String>,

    /// Application-level rejection, e.g. the duplicate-submission guard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportResponse {
    /// Build the tracked job record for this submission.
    ///
    /// `submitted_url` is the URL the caller sent; the backend's normalized
    /// URL wins when present.
    pub fn into_job(self, submitted_url: &str) -> ImportJob {
        let mut job = ImportJob::new(
            JobId::from_string(self.job_id),
            self.url.unwrap_or_else(|| submitted_url.to_string()),
        );
        if let Some(stage) = self.status.as_deref().and_then(|s| s.parse::<ImportStage>().ok()) {
            job.stage = stage;
        }
        if let Some(progress) = self.progress {
            job.progress = progress.min(100);
        }
        if let Some(message) = self.message.filter(|m| !m.is_empty()) {
            job.message = message;
        }
        job
    }
}

/// Response from the poll-progress endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProgressResponse {
    /// Echoed job ID; the poller's own ID is substituted when absent
    #[serde(default)]
    pub job_id: Option<JobId>,

    /// Current stage name
    #[serde(default)]
    pub status: Option<String>,

    /// Current progress percentage
    #[serde(default)]
    pub progress: Option<u8>,

    /// Current status text
    #[serde(default)]
    pub message: Option<String>,

    /// Application-level poll failure; treated like a transport error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressResponse {
    /// Parse the reported stage, if present and recognized.
    pub fn stage(&self) -> Option<ImportStage> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}
