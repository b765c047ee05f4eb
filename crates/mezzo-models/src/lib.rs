//! Shared data models for the Mezzo transcoding backend.
//!
//! This crate provides Serde-serializable types for:
//! - Media items and their lifecycle status
//! - Transcoding jobs and callback secrets
//! - The signed completion-callback wire payload
//! - Lifecycle events published to downstream consumers

pub mod callback;
pub mod event;
pub mod job;
pub mod media;

// Re-export common types
pub use callback::{
    CallbackStatus, CompletionPayload, TranscodeOutput, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
pub use event::LifecycleEvent;
pub use job::{CallbackSecret, JobId, JobStatus, TranscodingJob};
pub use media::{
    truncate_error, CreatorId, LoudnessStats, MediaId, MediaItem, MediaStatus, MediaType,
    MAX_ERROR_LEN,
};
