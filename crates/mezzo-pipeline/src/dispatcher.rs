//! Job dispatch.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use mezzo_models::{
    CallbackSecret, LifecycleEvent, MediaId, MediaItem, MediaStatus, TranscodingJob,
};
use mezzo_store::{JobStore, MediaStore, MediaUpdate};
use mezzo_worker::{SubmitRequest, TranscodeWorker};

use crate::config::PipelineConfig;
use crate::error::DispatchError;
use crate::notifier::StateNotifier;

/// Submits transcoding jobs to the external worker.
///
/// A per-media guard collapses concurrent dispatch calls in this process;
/// across processes the media CAS in step 4 is what decides the winner.
pub struct Dispatcher<S, W> {
    store: Arc<S>,
    worker: Arc<W>,
    notifier: StateNotifier,
    config: PipelineConfig,
    in_progress: Arc<Mutex<HashSet<MediaId>>>,
}

/// Removes the media ID from the in-progress set when the dispatch call
/// returns, on every path.
struct DispatchGuard {
    set: Arc<Mutex<HashSet<MediaId>>>,
    media_id: MediaId,
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.media_id);
        }
    }
}

impl<S, W> Dispatcher<S, W>
where
    S: MediaStore + JobStore,
    W: TranscodeWorker,
{
    pub fn new(
        store: Arc<S>,
        worker: Arc<W>,
        notifier: StateNotifier,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            worker,
            notifier,
            config,
            in_progress: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Dispatch a transcoding job for a media item.
    ///
    /// Allowed from `Uploaded` (first dispatch) and `Failed` (retry after
    /// a failure). Any previously in-flight job is superseded first; the
    /// media item transitions to `Transcoding` only after the worker has
    /// accepted the job, so a failed submission leaves it untouched.
    pub async fn dispatch(&self, media_id: &MediaId) -> Result<TranscodingJob, DispatchError> {
        let _guard = self.claim(media_id)?;

        let item = self
            .store
            .get_media(media_id)
            .await?
            .ok_or_else(|| DispatchError::NotFound(media_id.clone()))?;

        if !item.status.can_dispatch() {
            return Err(DispatchError::Precondition(item.status));
        }
        let previous_status = item.status;

        let superseded = self.store.supersede_in_flight(media_id).await?;
        if superseded > 0 {
            warn!(
                media_id = %media_id,
                superseded,
                "Superseded stale in-flight jobs before dispatch"
            );
        }

        let job = self.submit(&item, 1).await?;

        let applied = self
            .store
            .apply_media_update(media_id, previous_status, MediaUpdate::BeginTranscoding)
            .await?;
        if !applied {
            // Another writer moved the item while we were submitting; the
            // job we just created is orphaned, retire it.
            self.store.supersede_job_if_in_flight(&job.job_id).await?;
            let current = self
                .store
                .get_media(media_id)
                .await?
                .map(|m| m.status)
                .unwrap_or(previous_status);
            return Err(DispatchError::Precondition(current));
        }

        self.notifier.publish(LifecycleEvent::now(
            media_id.clone(),
            previous_status,
            MediaStatus::Transcoding,
        ));
        metrics::counter!("mezzo_dispatch_total").increment(1);

        info!(
            media_id = %media_id,
            job_id = %job.job_id,
            attempt = job.attempt,
            "Dispatched transcoding job"
        );
        Ok(job)
    }

    /// Re-dispatch after a sweep timeout.
    ///
    /// The media item is already `Transcoding` and stays there, so no
    /// lifecycle event fires. The caller has already superseded the timed
    /// out job and checked the attempt bound.
    pub async fn redispatch(&self, timed_out: &TranscodingJob) -> Result<TranscodingJob, DispatchError> {
        let media_id = &timed_out.media_id;
        let _guard = self.claim(media_id)?;

        let item = self
            .store
            .get_media(media_id)
            .await?
            .ok_or_else(|| DispatchError::NotFound(media_id.clone()))?;

        if item.status != MediaStatus::Transcoding {
            return Err(DispatchError::Precondition(item.status));
        }

        let job = self.submit(&item, timed_out.attempt + 1).await?;
        metrics::counter!("mezzo_redispatch_total").increment(1);

        info!(
            media_id = %media_id,
            job_id = %job.job_id,
            attempt = job.attempt,
            "Re-dispatched after timeout"
        );
        Ok(job)
    }

    /// Submit to the worker and record the resulting job.
    async fn submit(&self, item: &MediaItem, attempt: u32) -> Result<TranscodingJob, DispatchError> {
        let callback_secret = CallbackSecret::generate();
        let output_prefix = item.output_prefix();

        let request = SubmitRequest {
            media_id: item.id.clone(),
            media_type: item.media_type,
            input_key: item.original_key.clone(),
            output_prefix: output_prefix.clone(),
            webhook_url: self.config.webhook_url.clone(),
            callback_secret: callback_secret.clone(),
        };
        let job_id = self.worker.submit(&request).await?;

        let job = TranscodingJob::new(
            job_id,
            item.id.clone(),
            attempt,
            callback_secret,
            output_prefix,
        );
        self.store.insert_job(job.clone()).await?;
        Ok(job)
    }

    /// Take the per-media in-process dispatch slot.
    fn claim(&self, media_id: &MediaId) -> Result<DispatchGuard, DispatchError> {
        let mut set = self
            .in_progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !set.insert(media_id.clone()) {
            return Err(DispatchError::AlreadyDispatching(media_id.clone()));
        }
        Ok(DispatchGuard {
            set: Arc::clone(&self.in_progress),
            media_id: media_id.clone(),
        })
    }
}
