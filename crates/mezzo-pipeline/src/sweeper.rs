//! Timeout sweep for jobs whose callbacks never arrived.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::time::interval;
use tracing::{error, info, warn};

use mezzo_models::{JobStatus, LifecycleEvent, MediaStatus, TranscodingJob};
use mezzo_store::{JobStore, MediaStore, MediaUpdate, StoreError};
use mezzo_worker::TranscodeWorker;

use crate::config::PipelineConfig;
use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::notifier::StateNotifier;

/// Diagnostic stored on the media item when attempts are exhausted.
const TIMEOUT_ERROR: &str = "Transcoding timed out; the worker did not report back";

/// Counters from one sweep cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Jobs past the deadline this cycle
    pub timed_out: u32,
    /// Timed-out jobs re-dispatched as a fresh attempt
    pub retried: u32,
    /// Timed-out jobs (and their media items) marked failed
    pub failed: u32,
}

/// Background sweep that times out unresponsive jobs.
///
/// Each stale job is first claimed with a conditional supersede, so a
/// callback landing mid-sweep wins cleanly: the claim fails and the job
/// is left alone.
pub struct TimeoutSweeper<S, W> {
    store: Arc<S>,
    dispatcher: Arc<Dispatcher<S, W>>,
    notifier: StateNotifier,
    config: PipelineConfig,
    enabled: bool,
}

impl<S, W> TimeoutSweeper<S, W>
where
    S: MediaStore + JobStore,
    W: TranscodeWorker,
{
    pub fn new(
        store: Arc<S>,
        dispatcher: Arc<Dispatcher<S, W>>,
        notifier: StateNotifier,
        config: PipelineConfig,
    ) -> Self {
        let enabled = std::env::var("ENABLE_TIMEOUT_SWEEP")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Self {
            store,
            dispatcher,
            notifier,
            config,
            enabled,
        }
    }

    /// Start the background sweep loop.
    ///
    /// Runs indefinitely and should be spawned as a background task.
    pub async fn run(&self) {
        if !self.enabled {
            info!("Timeout sweep is disabled");
            return;
        }

        info!(
            interval = ?self.config.sweep_interval,
            job_timeout = ?self.config.job_timeout,
            "Starting timeout sweeper"
        );

        let mut ticker = interval(self.config.sweep_interval);

        loop {
            ticker.tick().await;

            match self.check_once().await {
                Ok(stats) if stats.timed_out > 0 => {
                    info!(
                        timed_out = stats.timed_out,
                        retried = stats.retried,
                        failed = stats.failed,
                        "Timeout sweep complete"
                    );
                }
                Ok(_) => {}
                Err(e) => error!("Timeout sweep error: {}", e),
            }
        }
    }

    /// Run a single sweep cycle.
    pub async fn check_once(&self) -> Result<SweepStats, StoreError> {
        let timeout = ChronoDuration::from_std(self.config.job_timeout)
            .unwrap_or_else(|_| ChronoDuration::days(3650));
        let cutoff = Utc::now() - timeout;

        let stale = self.store.in_flight_dispatched_before(cutoff).await?;
        let mut stats = SweepStats::default();

        for job in stale {
            // Claim before acting; a late callback that just terminalized
            // this job makes the claim fail and we skip it. A retryable
            // job is superseded by its replacement, an exhausted one ends
            // as Failed.
            let claimed = if job.can_retry() {
                self.store.supersede_job_if_in_flight(&job.job_id).await?
            } else {
                self.store
                    .finish_job_if_in_flight(&job.job_id, JobStatus::Failed, Utc::now())
                    .await?
                    .is_some()
            };
            if !claimed {
                continue;
            }
            stats.timed_out += 1;
            metrics::counter!("mezzo_sweep_timeouts_total").increment(1);

            warn!(
                job_id = %job.job_id,
                media_id = %job.media_id,
                attempt = job.attempt,
                dispatched_at = %job.dispatched_at,
                "Job timed out"
            );

            if self.recover(&job).await {
                stats.retried += 1;
            } else {
                stats.failed += 1;
            }
        }

        Ok(stats)
    }

    /// Retry the job if the attempt bound allows, otherwise fail the media
    /// item. Returns true when a retry was dispatched.
    async fn recover(&self, job: &TranscodingJob) -> bool {
        if job.can_retry() {
            match self.dispatcher.redispatch(job).await {
                Ok(retry) => {
                    info!(
                        media_id = %job.media_id,
                        job_id = %retry.job_id,
                        attempt = retry.attempt,
                        "Dispatched timeout retry"
                    );
                    return true;
                }
                Err(DispatchError::AlreadyDispatching(_)) => {
                    // Someone else is already dispatching this item
                    return false;
                }
                Err(e) => {
                    error!(media_id = %job.media_id, "Timeout retry failed: {}", e);
                    // Fall through and fail the item
                }
            }
        }

        self.fail_media(job).await;
        false
    }

    /// Conditionally fail the media item for an exhausted job.
    async fn fail_media(&self, job: &TranscodingJob) {
        let update = MediaUpdate::Fail {
            error: TIMEOUT_ERROR.to_string(),
        };
        match self
            .store
            .apply_media_update(&job.media_id, MediaStatus::Transcoding, update)
            .await
        {
            Ok(true) => {
                self.notifier.publish(LifecycleEvent::now(
                    job.media_id.clone(),
                    MediaStatus::Transcoding,
                    MediaStatus::Failed,
                ));
                info!(media_id = %job.media_id, "Media item failed after timeout");
            }
            Ok(false) => {
                // A newer dispatch already owns the item
                info!(media_id = %job.media_id, "Media item moved on, skipping timeout failure");
            }
            Err(e) => {
                error!(media_id = %job.media_id, "Failed to record timeout failure: {}", e);
            }
        }
    }
}
