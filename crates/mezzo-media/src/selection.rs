//! Representative-frame selection.
//!
//! Deterministic given identical input: the candidate timestamp is a fixed
//! fraction of the duration, ties break toward the earlier frame, and the
//! scoring formula has no randomness. The worker that executes this
//! algorithm therefore always derives the same thumbnail for the same
//! input bytes.

use tracing::debug;

use crate::error::{SelectionError, SelectionResult};
use crate::frame::Frame;
use crate::score::{FrameScore, SelectionConfig};

/// How the selected frame was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPath {
    /// The 10%-mark candidate passed scoring
    Primary,
    /// The candidate was rejected; a scene-change frame passed
    SceneFallback,
    /// Nothing passed; best-scoring candidate seen was accepted
    BestEffort,
}

/// Outcome of a selection run.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Index of the chosen frame in the input timeline
    pub frame_index: usize,
    /// Timestamp of the chosen frame
    pub timestamp: f64,
    /// Scores of the chosen frame
    pub score: FrameScore,
    /// Which path produced it
    pub path: SelectionPath,
}

/// A scored frame under consideration. Never persisted.
struct ThumbnailCandidate {
    index: usize,
    score: FrameScore,
}

/// Select one representative frame from a decoded timeline.
///
/// 1. Candidate at `candidate_fraction * duration` (clamped to at least
///    one second into the content, like the worker's extractor), preferring
///    a keyframe within `keyframe_window` of the mark.
/// 2. Accept if contrast and brightness clear their thresholds.
/// 3. Otherwise scan forward for the first frame whose scene-change score
///    exceeds `scene_sensitivity` and re-score it.
/// 4. Still rejected: accept the best-scoring candidate seen. A non-empty
///    timeline always yields a selection.
pub fn select_thumbnail(
    frames: &[Frame],
    duration_seconds: f64,
    config: &SelectionConfig,
) -> SelectionResult<Selection> {
    if frames.is_empty() {
        return Err(SelectionError::EmptyTimeline);
    }
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Err(SelectionError::InvalidDuration(duration_seconds));
    }

    let target = (duration_seconds * config.candidate_fraction).max(1.0_f64.min(duration_seconds));
    let primary_index = candidate_index(frames, target, config.keyframe_window);

    let primary_score = FrameScore::measure(&frames[primary_index]);
    let mut best = ThumbnailCandidate {
        index: primary_index,
        score: primary_score,
    };

    if primary_score.acceptable(config) {
        return Ok(Selection {
            frame_index: primary_index,
            timestamp: frames[primary_index].timestamp,
            score: primary_score,
            path: SelectionPath::Primary,
        });
    }

    debug!(
        timestamp = frames[primary_index].timestamp,
        contrast = primary_score.contrast,
        brightness = primary_score.brightness,
        "Primary candidate rejected, scanning for scene change"
    );

    // First frame past the mark whose scene-change score exceeds the
    // sensitivity threshold wins the fallback slot.
    for i in primary_index + 1..frames.len() {
        let scene_score = frames[i].scene_change_score(&frames[i - 1]);
        if scene_score <= config.scene_sensitivity {
            continue;
        }

        let score = FrameScore::measure(&frames[i]);
        if score.acceptable(config) {
            return Ok(Selection {
                frame_index: i,
                timestamp: frames[i].timestamp,
                score,
                path: SelectionPath::SceneFallback,
            });
        }
        // Strictly-greater comparison keeps the earlier candidate on ties
        if score.composite(&config.weights) > best.score.composite(&config.weights) {
            best = ThumbnailCandidate { index: i, score };
        }
        break;
    }

    Ok(Selection {
        frame_index: best.index,
        timestamp: frames[best.index].timestamp,
        score: best.score,
        path: SelectionPath::BestEffort,
    })
}

/// Index of the frame nearest `target`, preferring a keyframe within
/// `window` seconds of it. Earlier frame wins ties.
fn candidate_index(frames: &[Frame], target: f64, window: f64) -> usize {
    let mut nearest_keyframe: Option<(usize, f64)> = None;
    let mut nearest: (usize, f64) = (0, f64::INFINITY);

    for (i, frame) in frames.iter().enumerate() {
        let distance = (frame.timestamp - target).abs();
        if distance < nearest.1 {
            nearest = (i, distance);
        }
        if frame.keyframe && distance <= window {
            match nearest_keyframe {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => nearest_keyframe = Some((i, distance)),
            }
        }
    }

    nearest_keyframe.map(|(i, _)| i).unwrap_or(nearest.0)
}
