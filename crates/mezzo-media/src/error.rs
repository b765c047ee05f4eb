//! Selection error types.

use thiserror::Error;

/// Result type for selection operations.
pub type SelectionResult<T> = Result<T, SelectionError>;

/// Errors that can occur during frame selection.
///
/// A frame that fails quality scoring is not an error — the algorithm
/// falls back and ultimately accepts the best candidate seen. Only inputs
/// the algorithm cannot select from at all error out.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Empty frame timeline")]
    EmptyTimeline,

    #[error("Invalid duration: {0}")]
    InvalidDuration(f64),
}
