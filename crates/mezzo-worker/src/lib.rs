//! External transcoding worker integration.
//!
//! The heavy lifting (decode, HLS ladder, thumbnail extraction, waveform
//! rendering) runs on a separate worker service. This crate owns the
//! submit-side HTTP client and the HMAC scheme that authenticates the
//! worker's completion callback.

pub mod client;
pub mod error;
pub mod signature;

pub use client::{HttpWorkerClient, SubmitRequest, TranscodeWorker, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use signature::{sign_body, verify_signature};
