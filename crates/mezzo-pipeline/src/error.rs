//! Pipeline error types.

use thiserror::Error;

use mezzo_models::{MediaId, MediaStatus};
use mezzo_store::StoreError;
use mezzo_worker::WorkerError;

/// Errors from job dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Media item not found: {0}")]
    NotFound(MediaId),

    #[error("A dispatch for {0} is already in progress")]
    AlreadyDispatching(MediaId),

    #[error("Cannot dispatch from status '{0}'")]
    Precondition(MediaStatus),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from completion-callback processing.
///
/// `Auth` and `Stale` are returned before any state is touched, so a
/// rejected callback leaves both the job and the media item unchanged.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("Malformed callback: {0}")]
    Malformed(String),

    #[error("Callback signature verification failed")]
    Auth,

    #[error("Callback timestamp outside the replay window ({skew_secs}s skew)")]
    Stale { skew_secs: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}
