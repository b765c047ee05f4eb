//! Store traits.
//!
//! Every pipeline component receives the store as an explicit dependency;
//! there is no process-wide singleton. Concurrency safety rests entirely on
//! the conditional updates below: an update applies only if the record is
//! still in the expected state, and the caller learns whether it won.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use mezzo_models::{
    JobId, JobStatus, MediaId, MediaItem, MediaStatus, TranscodeOutput, TranscodingJob,
};

use crate::error::StoreResult;

/// A guarded mutation of a media item.
///
/// Each variant implies its target status; the store applies it only when
/// the current status matches the caller's expectation and the implied
/// transition is legal.
#[derive(Debug, Clone)]
pub enum MediaUpdate {
    /// `Uploaded|Failed -> Transcoding`; clears any previous diagnostic.
    BeginTranscoding,
    /// `Transcoding -> Ready`; copies derived output fields.
    Complete(TranscodeOutput),
    /// `Transcoding -> Failed`; stores a bounded diagnostic.
    Fail { error: String },
}

impl MediaUpdate {
    /// Status this update transitions the item into.
    pub fn target_status(&self) -> MediaStatus {
        match self {
            MediaUpdate::BeginTranscoding => MediaStatus::Transcoding,
            MediaUpdate::Complete(_) => MediaStatus::Ready,
            MediaUpdate::Fail { .. } => MediaStatus::Failed,
        }
    }
}

/// Keyed table of media items.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Insert a new media item. Fails if the ID already exists.
    async fn insert_media(&self, item: MediaItem) -> StoreResult<()>;

    /// Fetch a media item by ID.
    async fn get_media(&self, id: &MediaId) -> StoreResult<Option<MediaItem>>;

    /// Conditionally apply `update` if the item's status equals `expected`.
    ///
    /// Returns `Ok(true)` when the write was applied, `Ok(false)` when the
    /// condition no longer held (another writer got there first). This is
    /// the compare-and-set primitive the whole pipeline relies on.
    async fn apply_media_update(
        &self,
        id: &MediaId,
        expected: MediaStatus,
        update: MediaUpdate,
    ) -> StoreResult<bool>;
}

/// Keyed table of transcoding jobs.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job record. Fails if the job ID already exists.
    async fn insert_job(&self, job: TranscodingJob) -> StoreResult<()>;

    /// Fetch a job by its worker-assigned ID.
    async fn get_job(&self, job_id: &JobId) -> StoreResult<Option<TranscodingJob>>;

    /// The in-flight job for a media item, if any. At most one exists.
    async fn in_flight_job_for(&self, media_id: &MediaId) -> StoreResult<Option<TranscodingJob>>;

    /// Mark every in-flight job for `media_id` superseded. Returns the count.
    async fn supersede_in_flight(&self, media_id: &MediaId) -> StoreResult<u32>;

    /// Conditionally mark one job superseded if it is still in flight.
    ///
    /// Used by the timeout sweep to claim a job before acting on it, so
    /// concurrent sweeper instances and late callbacks race safely.
    async fn supersede_job_if_in_flight(&self, job_id: &JobId) -> StoreResult<bool>;

    /// Conditionally terminalize a job if it is still in flight.
    ///
    /// Returns the updated record when this writer won the race, `None`
    /// when the job had already left `in_flight`.
    async fn finish_job_if_in_flight(
        &self,
        job_id: &JobId,
        status: JobStatus,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<Option<TranscodingJob>>;

    /// In-flight jobs dispatched before `cutoff` (timeout sweep input).
    async fn in_flight_dispatched_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> StoreResult<Vec<TranscodingJob>>;
}
