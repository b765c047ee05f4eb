//! Completion-callback wire payload.
//!
//! The external worker posts this JSON body back to the webhook endpoint,
//! signed with the per-job secret. Field names are camelCase on the wire.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::JobId;
use crate::media::LoudnessStats;

/// Header carrying the hex-encoded HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "x-mezzo-signature";

/// Header carrying the send time as unix seconds.
pub const TIMESTAMP_HEADER: &str = "x-mezzo-timestamp";

/// Callback outcome reported by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    Completed,
    Failed,
}

/// Derived-output keys and probe metadata for a completed job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeOutput {
    /// HLS master playlist key
    pub stream_manifest_key: String,

    /// Preview playlist key (video only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_manifest_key: Option<String>,

    /// Thumbnail key; absent when no acceptable frame was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_key: Option<String>,

    /// Waveform peaks JSON key (audio only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform_key: Option<String>,

    /// Rendered waveform image key (audio only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform_image_key: Option<String>,

    /// Archival mezzanine key (video only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mezzanine_key: Option<String>,

    /// Probed duration in seconds
    pub duration_seconds: u32,

    /// Source width (video only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Source height (video only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Quality tiers actually produced, in descending order
    #[serde(default)]
    pub ready_variants: Vec<String>,

    /// Loudness analysis results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loudness: Option<LoudnessStats>,
}

/// Completion callback body: `{jobId, status, output?, error?}`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload {
    /// Worker-assigned job ID
    pub job_id: JobId,

    /// Completed or failed
    pub status: CallbackStatus,

    /// Present when completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<TranscodeOutput>,

    /// Present when failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompletionPayload {
    /// Successful completion with output fields.
    pub fn completed(job_id: JobId, output: TranscodeOutput) -> Self {
        Self {
            job_id,
            status: CallbackStatus::Completed,
            output: Some(output),
            error: None,
        }
    }

    /// Failure with the worker's error string.
    pub fn failed(job_id: JobId, error: impl Into<String>) -> Self {
        Self {
            job_id,
            status: CallbackStatus::Failed,
            output: None,
            error: Some(error.into()),
        }
    }
}
