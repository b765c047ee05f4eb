//! Completion-callback processing.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use mezzo_models::{
    CallbackStatus, CompletionPayload, JobStatus, LifecycleEvent, MediaStatus, truncate_error,
};
use mezzo_store::{JobStore, MediaStore, MediaUpdate};
use mezzo_worker::verify_signature;

use crate::config::PipelineConfig;
use crate::error::CallbackError;
use crate::notifier::StateNotifier;

/// Result of applying a completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// This delivery won the race and the media item transitioned
    Applied(MediaStatus),
    /// Redelivery or late callback; acknowledged, nothing changed
    Duplicate,
}

/// Applies worker completion callbacks exactly once.
pub struct WebhookReceiver<S> {
    store: Arc<S>,
    notifier: StateNotifier,
    config: PipelineConfig,
}

impl<S> WebhookReceiver<S>
where
    S: MediaStore + JobStore,
{
    pub fn new(store: Arc<S>, notifier: StateNotifier, config: PipelineConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Process one callback delivery.
    ///
    /// Ordering matters: the payload is parsed first because the job
    /// lookup needs the job ID and the job record holds the verification
    /// secret. Nothing parsed is trusted until the signature over the raw
    /// body and the timestamp both check out; only then is a terminal job
    /// acknowledged as a duplicate, so an unauthenticated sender cannot
    /// learn which jobs have finished. From there the job finish and the
    /// media update are conditional writes, so a redelivery racing this
    /// one resolves to a single `Applied`.
    pub async fn receive_completion(
        &self,
        raw_body: &[u8],
        signature: &str,
        timestamp: i64,
    ) -> Result<CallbackOutcome, CallbackError> {
        let payload: CompletionPayload = serde_json::from_slice(raw_body)
            .map_err(|e| CallbackError::Malformed(format!("Invalid JSON body: {}", e)))?;

        let job = self
            .store
            .get_job(&payload.job_id)
            .await?
            .ok_or_else(|| CallbackError::Malformed(format!("Unknown job: {}", payload.job_id)))?;

        if !verify_signature(&job.callback_secret, raw_body, signature) {
            warn!(job_id = %job.job_id, "Callback signature verification failed");
            metrics::counter!("mezzo_callback_rejected_total", "reason" => "auth").increment(1);
            return Err(CallbackError::Auth);
        }

        let now = Utc::now();
        let skew_secs = (now.timestamp() - timestamp).abs();
        if skew_secs > self.config.callback_max_skew.as_secs() as i64 {
            warn!(job_id = %job.job_id, skew_secs, "Callback timestamp outside replay window");
            metrics::counter!("mezzo_callback_rejected_total", "reason" => "stale").increment(1);
            return Err(CallbackError::Stale { skew_secs });
        }

        if job.status.is_terminal() {
            info!(job_id = %job.job_id, status = %job.status, "Duplicate callback for terminal job");
            metrics::counter!("mezzo_callback_duplicates_total").increment(1);
            return Ok(CallbackOutcome::Duplicate);
        }

        // Validate shape before any write so a half-formed payload cannot
        // terminalize the job without updating the media item.
        let (job_status, update) = match payload.status {
            CallbackStatus::Completed => {
                let output = payload.output.ok_or_else(|| {
                    CallbackError::Malformed("Completed callback without output".to_string())
                })?;
                (JobStatus::Completed, MediaUpdate::Complete(output))
            }
            CallbackStatus::Failed => {
                let error = payload
                    .error
                    .as_deref()
                    .unwrap_or("Worker reported failure without detail");
                (
                    JobStatus::Failed,
                    MediaUpdate::Fail {
                        error: truncate_error(error),
                    },
                )
            }
        };

        let won = self
            .store
            .finish_job_if_in_flight(&job.job_id, job_status, now)
            .await?;
        let Some(finished) = won else {
            info!(job_id = %job.job_id, "Lost callback race, treating as duplicate");
            metrics::counter!("mezzo_callback_duplicates_total").increment(1);
            return Ok(CallbackOutcome::Duplicate);
        };

        let target = update.target_status();
        let applied = self
            .store
            .apply_media_update(&finished.media_id, MediaStatus::Transcoding, update)
            .await?;
        if !applied {
            // A newer dispatch owns the media item now; this job's result
            // is stale even though it terminalized first.
            warn!(
                job_id = %finished.job_id,
                media_id = %finished.media_id,
                "Job finished but media item moved on, dropping result"
            );
            metrics::counter!("mezzo_callback_duplicates_total").increment(1);
            return Ok(CallbackOutcome::Duplicate);
        }

        self.notifier.publish(LifecycleEvent::now(
            finished.media_id.clone(),
            MediaStatus::Transcoding,
            target,
        ));
        metrics::counter!("mezzo_callback_applied_total", "status" => target.as_str()).increment(1);

        info!(
            job_id = %finished.job_id,
            media_id = %finished.media_id,
            status = %target,
            "Applied completion callback"
        );
        Ok(CallbackOutcome::Applied(target))
    }
}
