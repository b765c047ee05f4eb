//! Media item models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum stored length for a failure diagnostic, in bytes.
///
/// The worker caps its own error payloads, but we bound again on our side
/// and never persist the raw payload.
pub const MAX_ERROR_LEN: usize = 512;

/// Unique identifier for a media item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct MediaId(pub String);

impl MediaId {
    /// Generate a new random media ID.
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
}

impl Default for MediaId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MediaId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of the creator who owns a media item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct CreatorId(pub String);

impl CreatorId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CreatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of uploaded media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Video,
    Audio,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Media lifecycle status.
///
/// Transitions are monotonic except the single `Failed -> Transcoding`
/// retry edge; see [`MediaStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaStatus {
    /// Raw upload confirmed persisted, no job dispatched yet
    #[default]
    Uploaded,
    /// A transcoding job is in flight
    Transcoding,
    /// Derived outputs are available; terminal for this subsystem
    Ready,
    /// Transcoding failed; terminal unless the retry edge is taken
    Failed,
}

impl MediaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Uploaded => "uploaded",
            MediaStatus::Transcoding => "transcoding",
            MediaStatus::Ready => "ready",
            MediaStatus::Failed => "failed",
        }
    }

    /// True once derived outputs are immutable.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MediaStatus::Ready)
    }

    /// True if a dispatch is permitted from this state.
    pub fn can_dispatch(&self) -> bool {
        matches!(self, MediaStatus::Uploaded | MediaStatus::Failed)
    }

    /// Validate a lifecycle transition.
    ///
    /// `Uploaded -> Transcoding -> {Ready | Failed}`, plus the single
    /// documented retry edge `Failed -> Transcoding`. Nothing else.
    pub fn can_transition_to(&self, next: MediaStatus) -> bool {
        matches!(
            (self, next),
            (MediaStatus::Uploaded, MediaStatus::Transcoding)
                | (MediaStatus::Transcoding, MediaStatus::Ready)
                | (MediaStatus::Transcoding, MediaStatus::Failed)
                | (MediaStatus::Failed, MediaStatus::Transcoding)
        )
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Loudness statistics from the worker's two-pass loudnorm analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LoudnessStats {
    /// Integrated loudness (LUFS)
    pub integrated_lufs: f64,
    /// True peak (dBTP)
    pub true_peak_db: f64,
    /// Loudness range (LU)
    pub loudness_range: f64,
}

/// A unit of uploaded raw media owned by a creator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MediaItem {
    /// Unique media ID
    pub id: MediaId,

    /// Owning creator (immutable)
    pub creator_id: CreatorId,

    /// Video or audio
    pub media_type: MediaType,

    /// Lifecycle status
    #[serde(default)]
    pub status: MediaStatus,

    /// Storage key of the raw upload
    pub original_key: String,

    /// HLS master playlist key (set on ready)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_manifest_key: Option<String>,

    /// Preview playlist key (video only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_manifest_key: Option<String>,

    /// Thumbnail key (video only; may be absent if no acceptable frame was found)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_key: Option<String>,

    /// Waveform peaks JSON key (audio only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waveform_key: Option<String>,

    /// Rendered waveform image key (audio only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waveform_image_key: Option<String>,

    /// Archival mezzanine key (video only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mezzanine_key: Option<String>,

    /// Duration in seconds (set on ready)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,

    /// Source width in pixels (video only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Source height in pixels (video only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Quality tiers actually produced, in descending order
    #[serde(default)]
    pub ready_variants: Vec<String>,

    /// Loudness statistics (audio analysis)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loudness: Option<LoudnessStats>,

    /// Bounded failure diagnostic, present only when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl MediaItem {
    /// Create a new item for a confirmed upload.
    pub fn new(
        id: MediaId,
        creator_id: CreatorId,
        media_type: MediaType,
        original_key: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            creator_id,
            media_type,
            status: MediaStatus::Uploaded,
            original_key: original_key.into(),
            stream_manifest_key: None,
            preview_manifest_key: None,
            thumbnail_key: None,
            waveform_key: None,
            waveform_image_key: None,
            mezzanine_key: None,
            duration_seconds: None,
            width: None,
            height: None,
            ready_variants: Vec::new(),
            loudness: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creator-scoped prefix under which all derived outputs are written.
    pub fn output_prefix(&self) -> String {
        format!("{}/", self.creator_id)
    }

    /// Transition to transcoding, clearing any previous failure diagnostic.
    pub fn begin_transcoding(&mut self) {
        self.status = MediaStatus::Transcoding;
        self.last_error = None;
        self.updated_at = Utc::now();
    }

    /// Mark as failed with a bounded diagnostic.
    pub fn fail(&mut self, error: &str) {
        self.status = MediaStatus::Failed;
        self.last_error = Some(truncate_error(error));
        self.updated_at = Utc::now();
    }
}

/// Truncate a worker-supplied error string to [`MAX_ERROR_LEN`] bytes,
/// respecting char boundaries.
pub fn truncate_error(error: &str) -> String {
    if error.len() <= MAX_ERROR_LEN {
        return error.to_string();
    }
    let mut end = MAX_ERROR_LEN;
    while !error.is_char_boundary(end) {
        end -= 1;
    }
    error[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_id_generation() {
        let id1 = MediaId::new();
        let id2 = MediaId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_media_item_creation() {
        let item = MediaItem::new(
            MediaId::new(),
            CreatorId::from_string("creator-1"),
            MediaType::Video,
            "creator-1/originals/raw.mp4",
        );

        assert_eq!(item.status, MediaStatus::Uploaded);
        assert!(item.status.can_dispatch());
        assert!(item.ready_variants.is_empty());
        assert_eq!(item.output_prefix(), "creator-1/");
    }

    #[test]
    fn test_status_transitions() {
        assert!(MediaStatus::Uploaded.can_transition_to(MediaStatus::Transcoding));
        assert!(MediaStatus::Transcoding.can_transition_to(MediaStatus::Ready));
        assert!(MediaStatus::Transcoding.can_transition_to(MediaStatus::Failed));
        assert!(MediaStatus::Failed.can_transition_to(MediaStatus::Transcoding));

        // No skips, no regressions
        assert!(!MediaStatus::Uploaded.can_transition_to(MediaStatus::Ready));
        assert!(!MediaStatus::Uploaded.can_transition_to(MediaStatus::Failed));
        assert!(!MediaStatus::Ready.can_transition_to(MediaStatus::Transcoding));
        assert!(!MediaStatus::Ready.can_transition_to(MediaStatus::Failed));
        assert!(!MediaStatus::Transcoding.can_transition_to(MediaStatus::Uploaded));
    }

    #[test]
    fn test_fail_bounds_error() {
        let mut item = MediaItem::new(
            MediaId::new(),
            CreatorId::from_string("creator-1"),
            MediaType::Audio,
            "creator-1/originals/raw.flac",
        );

        let long_error = "x".repeat(4096);
        item.fail(&long_error);

        assert_eq!(item.status, MediaStatus::Failed);
        assert_eq!(item.last_error.as_ref().unwrap().len(), MAX_ERROR_LEN);
    }

    #[test]
    fn test_truncate_error_char_boundary() {
        // Multi-byte char straddling the limit must not panic
        let error = format!("{}é", "a".repeat(MAX_ERROR_LEN - 1));
        let truncated = truncate_error(&error);
        assert!(truncated.len() <= MAX_ERROR_LEN);
        assert!(truncated.starts_with('a'));
    }
}
