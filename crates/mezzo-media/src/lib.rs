//! Deterministic thumbnail selection and derivative planning.
//!
//! This crate specifies the frame-selection algorithm the transcoding
//! worker executes: candidate choice at the 10% mark, quality scoring,
//! scene-change fallback, and the size/encoding variant plan. Everything
//! here is a pure function of the decoded input, so identical input bytes
//! always produce the same selection and the same storage keys.

pub mod error;
pub mod frame;
pub mod score;
pub mod selection;
pub mod variants;
pub mod waveform;

pub use error::{SelectionError, SelectionResult};
pub use frame::Frame;
pub use score::{FrameScore, ScoreWeights, SelectionConfig};
pub use selection::{select_thumbnail, Selection, SelectionPath};
pub use variants::{plan_thumbnail_variants, ImageEncoding, ThumbnailVariant, THUMBNAIL_WIDTHS};
pub use waveform::{compute_peaks, plan_waveform, WaveformPlan};
