//! In-memory store implementation.
//!
//! Backs tests and local development. All conditional updates run under a
//! single mutex, which makes each compare-and-set atomic; a remote backend
//! implements the same traits with its own conditional-write mechanism.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::debug;

use mezzo_models::{
    truncate_error, JobId, JobStatus, MediaId, MediaItem, MediaStatus, TranscodingJob,
};

use crate::error::{StoreError, StoreResult};
use crate::store::{JobStore, MediaStore, MediaUpdate};

#[derive(Default)]
struct Inner {
    media: HashMap<MediaId, MediaItem>,
    jobs: HashMap<JobId, TranscodingJob>,
}

/// In-memory `MediaStore` + `JobStore`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Lock poisoning only happens if a writer panicked; the data is
        // still consistent for read-modify-write under the guard.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn insert_media(&self, item: MediaItem) -> StoreResult<()> {
        let mut inner = self.lock();
        if inner.media.contains_key(&item.id) {
            return Err(StoreError::already_exists(item.id.as_str()));
        }
        debug!(media_id = %item.id, "Inserting media item");
        inner.media.insert(item.id.clone(), item);
        Ok(())
    }

    async fn get_media(&self, id: &MediaId) -> StoreResult<Option<MediaItem>> {
        Ok(self.lock().media.get(id).cloned())
    }

    async fn apply_media_update(
        &self,
        id: &MediaId,
        expected: MediaStatus,
        update: MediaUpdate,
    ) -> StoreResult<bool> {
        let target = update.target_status();
        let mut inner = self.lock();
        let item = inner
            .media
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(id.as_str()))?;

        if item.status != expected {
            counter!("mezzo_store_cas_conflicts_total", "table" => "media").increment(1);
            return Ok(false);
        }
        if !expected.can_transition_to(target) {
            return Err(StoreError::InvalidTransition(format!(
                "{} -> {}",
                expected, target
            )));
        }

        match update {
            MediaUpdate::BeginTranscoding => item.begin_transcoding(),
            MediaUpdate::Complete(output) => {
                item.status = MediaStatus::Ready;
                item.stream_manifest_key = Some(output.stream_manifest_key);
                item.preview_manifest_key = output.preview_manifest_key;
                item.thumbnail_key = output.thumbnail_key;
                item.waveform_key = output.waveform_key;
                item.waveform_image_key = output.waveform_image_key;
                item.mezzanine_key = output.mezzanine_key;
                item.duration_seconds = Some(output.duration_seconds);
                item.width = output.width;
                item.height = output.height;
                item.ready_variants = output.ready_variants;
                item.loudness = output.loudness;
                item.last_error = None;
                item.updated_at = Utc::now();
            }
            MediaUpdate::Fail { error } => {
                item.status = MediaStatus::Failed;
                item.last_error = Some(truncate_error(&error));
                item.updated_at = Utc::now();
            }
        }

        Ok(true)
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_job(&self, job: TranscodingJob) -> StoreResult<()> {
        let mut inner = self.lock();
        if inner.jobs.contains_key(&job.job_id) {
            return Err(StoreError::already_exists(job.job_id.as_str()));
        }
        debug!(job_id = %job.job_id, media_id = %job.media_id, attempt = job.attempt, "Inserting job");
        inner.jobs.insert(job.job_id.clone(), job);
        Ok(())
    }

    async fn get_job(&self, job_id: &JobId) -> StoreResult<Option<TranscodingJob>> {
        Ok(self.lock().jobs.get(job_id).cloned())
    }

    async fn in_flight_job_for(&self, media_id: &MediaId) -> StoreResult<Option<TranscodingJob>> {
        Ok(self
            .lock()
            .jobs
            .values()
            .find(|j| j.media_id == *media_id && j.status == JobStatus::InFlight)
            .cloned())
    }

    async fn supersede_in_flight(&self, media_id: &MediaId) -> StoreResult<u32> {
        let mut inner = self.lock();
        let mut count = 0u32;
        for job in inner.jobs.values_mut() {
            if job.media_id == *media_id && job.status == JobStatus::InFlight {
                job.status = JobStatus::Superseded;
                job.completed_at = Some(Utc::now());
                count += 1;
            }
        }
        Ok(count)
    }

    async fn supersede_job_if_in_flight(&self, job_id: &JobId) -> StoreResult<bool> {
        let mut inner = self.lock();
        let job = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::not_found(job_id.as_str()))?;

        if job.status != JobStatus::InFlight {
            counter!("mezzo_store_cas_conflicts_total", "table" => "jobs").increment(1);
            return Ok(false);
        }
        job.status = JobStatus::Superseded;
        job.completed_at = Some(Utc::now());
        Ok(true)
    }

    async fn finish_job_if_in_flight(
        &self,
        job_id: &JobId,
        status: JobStatus,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<Option<TranscodingJob>> {
        let mut inner = self.lock();
        let job = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::not_found(job_id.as_str()))?;

        if job.status != JobStatus::InFlight {
            counter!("mezzo_store_cas_conflicts_total", "table" => "jobs").increment(1);
            return Ok(None);
        }
        job.status = status;
        job.completed_at = Some(completed_at);
        Ok(Some(job.clone()))
    }

    async fn in_flight_dispatched_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> StoreResult<Vec<TranscodingJob>> {
        let mut jobs: Vec<TranscodingJob> = self
            .lock()
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::InFlight && j.dispatched_at < cutoff)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| a.dispatched_at.cmp(&b.dispatched_at));
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mezzo_models::{CallbackSecret, CreatorId, MediaType, TranscodeOutput};

    fn video_item(id: &str) -> MediaItem {
        MediaItem::new(
            MediaId::from(id),
            CreatorId::from_string("creator-1"),
            MediaType::Video,
            format!("creator-1/originals/{id}.mp4"),
        )
    }

    fn in_flight_job(job_id: &str, media_id: &str, attempt: u32) -> TranscodingJob {
        TranscodingJob::new(
            JobId::from(job_id),
            MediaId::from(media_id),
            attempt,
            CallbackSecret::generate(),
            "creator-1/",
        )
    }

    fn sample_output() -> TranscodeOutput {
        TranscodeOutput {
            stream_manifest_key: "creator-1/hls/m1/master.m3u8".to_string(),
            preview_manifest_key: Some("creator-1/hls/m1/preview/preview.m3u8".to_string()),
            thumbnail_key: Some("creator-1/thumbnails/m1/640.webp".to_string()),
            waveform_key: None,
            waveform_image_key: None,
            mezzanine_key: Some("creator-1/mezzanine/m1/mezzanine.mp4".to_string()),
            duration_seconds: 120,
            width: Some(1920),
            height: Some(1080),
            ready_variants: vec!["1080p".into(), "720p".into()],
            loudness: None,
        }
    }

    #[tokio::test]
    async fn test_insert_media_rejects_duplicates() {
        let store = MemoryStore::new();
        store.insert_media(video_item("m1")).await.unwrap();
        let err = store.insert_media(video_item("m1")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_media_cas_applies_once() {
        let store = MemoryStore::new();
        store.insert_media(video_item("m1")).await.unwrap();
        let id = MediaId::from("m1");

        let applied = store
            .apply_media_update(&id, MediaStatus::Uploaded, MediaUpdate::BeginTranscoding)
            .await
            .unwrap();
        assert!(applied);

        // Second writer expecting the old status loses
        let applied = store
            .apply_media_update(&id, MediaStatus::Uploaded, MediaUpdate::BeginTranscoding)
            .await
            .unwrap();
        assert!(!applied);

        let item = store.get_media(&id).await.unwrap().unwrap();
        assert_eq!(item.status, MediaStatus::Transcoding);
    }

    #[tokio::test]
    async fn test_media_complete_copies_output() {
        let store = MemoryStore::new();
        store.insert_media(video_item("m1")).await.unwrap();
        let id = MediaId::from("m1");

        store
            .apply_media_update(&id, MediaStatus::Uploaded, MediaUpdate::BeginTranscoding)
            .await
            .unwrap();
        let applied = store
            .apply_media_update(
                &id,
                MediaStatus::Transcoding,
                MediaUpdate::Complete(sample_output()),
            )
            .await
            .unwrap();
        assert!(applied);

        let item = store.get_media(&id).await.unwrap().unwrap();
        assert_eq!(item.status, MediaStatus::Ready);
        assert_eq!(item.duration_seconds, Some(120));
        assert_eq!(item.ready_variants.len(), 2);
        assert!(item.stream_manifest_key.is_some());
        assert!(item.last_error.is_none());
    }

    #[tokio::test]
    async fn test_media_update_rejects_illegal_transition() {
        let store = MemoryStore::new();
        store.insert_media(video_item("m1")).await.unwrap();

        // Uploaded -> Ready skips transcoding
        let err = store
            .apply_media_update(
                &MediaId::from("m1"),
                MediaStatus::Uploaded,
                MediaUpdate::Complete(sample_output()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_finish_job_cas() {
        let store = MemoryStore::new();
        store.insert_job(in_flight_job("j1", "m1", 1)).await.unwrap();

        let won = store
            .finish_job_if_in_flight(&JobId::from("j1"), JobStatus::Completed, Utc::now())
            .await
            .unwrap();
        assert!(won.is_some());
        assert_eq!(won.unwrap().status, JobStatus::Completed);

        // Duplicate terminalization is a no-op
        let lost = store
            .finish_job_if_in_flight(&JobId::from("j1"), JobStatus::Failed, Utc::now())
            .await
            .unwrap();
        assert!(lost.is_none());

        let job = store.get_job(&JobId::from("j1")).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_supersede_clears_in_flight() {
        let store = MemoryStore::new();
        store.insert_job(in_flight_job("j1", "m1", 1)).await.unwrap();

        let media_id = MediaId::from("m1");
        assert!(store.in_flight_job_for(&media_id).await.unwrap().is_some());

        let count = store.supersede_in_flight(&media_id).await.unwrap();
        assert_eq!(count, 1);
        assert!(store.in_flight_job_for(&media_id).await.unwrap().is_none());

        let job = store.get_job(&JobId::from("j1")).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Superseded);
    }

    #[tokio::test]
    async fn test_in_flight_dispatched_before() {
        let store = MemoryStore::new();
        let mut old_job = in_flight_job("j-old", "m1", 1);
        old_job.dispatched_at = Utc::now() - chrono::Duration::minutes(45);
        store.insert_job(old_job).await.unwrap();
        store.insert_job(in_flight_job("j-new", "m2", 1)).await.unwrap();

        let cutoff = Utc::now() - chrono::Duration::minutes(30);
        let stuck = store.in_flight_dispatched_before(cutoff).await.unwrap();
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].job_id.as_str(), "j-old");
    }

    #[tokio::test]
    async fn test_finish_job_under_concurrent_writers() {
        // Many writers race the same conditional update; exactly one wins.
        let store = Arc::new(MemoryStore::new());
        store.insert_job(in_flight_job("j1", "m1", 1)).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            let status = if i % 2 == 0 {
                JobStatus::Completed
            } else {
                JobStatus::Failed
            };
            handles.push(tokio::spawn(async move {
                store
                    .finish_job_if_in_flight(&JobId::from("j1"), status, Utc::now())
                    .await
                    .unwrap()
                    .is_some()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_media_cas_under_concurrent_writers() {
        let store = Arc::new(MemoryStore::new());
        store.insert_media(video_item("m1")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .apply_media_update(
                        &MediaId::from("m1"),
                        MediaStatus::Uploaded,
                        MediaUpdate::BeginTranscoding,
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
