//! Transcoding job records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::media::MediaId;

/// Maximum dispatch attempts per media item (initial + one sweep retry).
pub const MAX_ATTEMPTS: u32 = 2;

/// Identifier assigned to a job by the external worker at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Per-job shared secret used to verify the completion callback.
///
/// Debug and Display are redacted so the secret never reaches logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct CallbackSecret(String);

impl CallbackSecret {
    /// Generate a fresh random secret.
    pub fn generate() -> Self {
        Self(format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        ))
    }

    /// Create from an existing string (tests, persistence round-trips).
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Expose the secret bytes for MAC computation.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CallbackSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallbackSecret([redacted])")
    }
}

impl fmt::Display for CallbackSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[redacted]")
    }
}

/// Job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Dispatched, awaiting the worker's callback
    #[default]
    InFlight,
    /// Worker reported success
    Completed,
    /// Worker reported failure, or the sweep timed it out
    Failed,
    /// Replaced by a newer dispatch for the same media item
    Superseded,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::InFlight => "in_flight",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Superseded => "superseded",
        }
    }

    /// True once no further callback can change this job.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::InFlight)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One attempt to transcode a media item.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TranscodingJob {
    /// Worker-assigned job ID
    pub job_id: JobId,

    /// The media item this job transcodes
    pub media_id: MediaId,

    /// Attempt number (1 or 2)
    pub attempt: u32,

    /// Job state
    #[serde(default)]
    pub status: JobStatus,

    /// Secret for callback signature verification
    pub callback_secret: CallbackSecret,

    /// Creator-scoped prefix for derived outputs
    pub output_prefix: String,

    /// Dispatch timestamp
    pub dispatched_at: DateTime<Utc>,

    /// Completion timestamp (terminal states only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TranscodingJob {
    /// Create a new in-flight job record.
    pub fn new(
        job_id: JobId,
        media_id: MediaId,
        attempt: u32,
        callback_secret: CallbackSecret,
        output_prefix: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            media_id,
            attempt,
            status: JobStatus::InFlight,
            callback_secret,
            output_prefix: output_prefix.into(),
            dispatched_at: Utc::now(),
            completed_at: None,
        }
    }

    /// True if another sweep retry is allowed after this job times out.
    pub fn can_retry(&self) -> bool {
        self.attempt < MAX_ATTEMPTS
    }

    /// Age of the dispatch relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.dispatched_at
    }
}
