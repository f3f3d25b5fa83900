//! Import job definitions for progress tracking.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Message shown for a job that has not reported progress yet.
pub const INITIAL_JOB_MESSAGE: &str = "Waiting to start processing";

/// Unique identifier for an import job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty string, which is never a valid backend-assigned ID.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Import pipeline stage as reported by the backend.
///
/// Stages progress `Queued → Downloading → Transcribing → Analyzing →
/// Saving → Completed`; `Failed` is reachable from any non-terminal stage.
/// The wire format uses the capitalized stage names verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum ImportStage {
    /// Waiting for a worker to pick the job up
    #[default]
    Queued,
    /// Fetching the source video
    Downloading,
    /// Extracting the transcript
    Transcribing,
    /// Running AI analysis over the transcript
    Analyzing,
    /// Persisting the video and analysis results
    Saving,
    /// Import finished successfully
    Completed,
    /// Import failed
    Failed,
}

impl ImportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStage::Queued => "Queued",
            ImportStage::Downloading => "Downloading",
            ImportStage::Transcribing => "Transcribing",
            ImportStage::Analyzing => "Analyzing",
            ImportStage::Saving => "Saving",
            ImportStage::Completed => "Completed",
            ImportStage::Failed => "Failed",
        }
    }

    /// Check if this is a terminal stage (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportStage::Completed | ImportStage::Failed)
    }
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a stage string is not recognized.
#[derive(Debug, Error)]
#[error("Unknown import stage: {0}")]
pub struct ParseStageError(String);

impl FromStr for ImportStage {
    type Err = ParseStageError;

    /// Parse a backend stage string.
    ///
    /// Accepts the exact stage names plus the decorated terminal forms the
    /// backend emits, e.g. `"Completed (linked)"` for a video that already
    /// existed and `"Failed: <reason>"` with the error inlined.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Queued" => Ok(ImportStage::Queued),
            "Downloading" => Ok(ImportStage::Downloading),
            "Transcribing" => Ok(ImportStage::Transcribing),
            "Analyzing" => Ok(ImportStage::Analyzing),
            "Saving" => Ok(ImportStage::Saving),
            s if s.starts_with("Completed") => Ok(ImportStage::Completed),
            s if s.starts_with("Failed") => Ok(ImportStage::Failed),
            other => Err(ParseStageError(other.to_string())),
        }
    }
}

/// One tracked video import.
///
/// Created from the submit-import response and mutated only by the
/// tracker's poll-merge cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImportJob {
    /// Backend-assigned job ID, stable for the job's lifetime
    pub job_id: JobId,

    /// Source URL submitted for import (display-only)
    pub url: String,

    /// Current pipeline stage
    #[serde(default)]
    pub stage: ImportStage,

    /// Progress percentage, 0-100, never decreases while tracked
    #[serde(default)]
    pub progress: u8,

    /// Human-readable status text, replaced wholesale on each update
    #[serde(default = "initial_message")]
    pub message: String,
}

fn initial_message() -> String {
    INITIAL_JOB_MESSAGE.to_string()
}

impl ImportJob {
    /// Create a freshly submitted job record.
    pub fn new(job_id: JobId, url: impl Into<String>) -> Self {
        Self {
            job_id,
            url: url.into(),
            stage: ImportStage::Queued,
            progress: 0,
            message: initial_message(),
        }
    }

    /// Check if the job reached a terminal stage.
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Merge a polled update into this record.
    ///
    /// Stage and message are applied verbatim when the update carries them;
    /// empty or unparseable fields fall back to the prior value. Progress is
    /// clamped to 100 and never regresses, which shields the record from
    /// stale or out-of-order poll responses.
    pub fn apply_update(&mut self, update: &crate::api::ProgressResponse) {
        if let Some(stage) = update.stage() {
            self.stage = stage;
        }
        if let Some(message) = update.message.as_deref() {
            if !message.is_empty() {
                self.message = message.to_string();
            }
        }
        self.progress = self.progress.max(update.progress.unwrap_or(0).min(100));
    }
}
