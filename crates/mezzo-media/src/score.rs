//! Frame quality scoring.

use crate::frame::Frame;

/// Relative weights for the composite quality score.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub contrast: f64,
    pub brightness: f64,
    pub sharpness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            contrast: 0.4,
            brightness: 0.2,
            sharpness: 0.4,
        }
    }
}

/// Configuration for candidate selection.
///
/// Thresholds and weights are tuning defaults, not invariants; deployments
/// may override them, and the algorithm stays deterministic for any fixed
/// configuration.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Fraction of the duration at which the primary candidate sits
    pub candidate_fraction: f64,

    /// Window (seconds) around the candidate mark to look for a keyframe
    pub keyframe_window: f64,

    /// Minimum acceptable contrast
    pub min_contrast: f64,

    /// Minimum acceptable brightness-centeredness (rejects near-black and
    /// near-white frames)
    pub min_brightness: f64,

    /// Scene-change score a fallback frame must exceed
    pub scene_sensitivity: f64,

    /// Composite score weights
    pub weights: ScoreWeights,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            candidate_fraction: 0.10,
            keyframe_window: 2.0,
            min_contrast: 0.4,
            min_brightness: 0.2,
            scene_sensitivity: 0.30,
            weights: ScoreWeights::default(),
        }
    }
}

/// Per-axis quality scores for one frame, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameScore {
    pub contrast: f64,
    pub brightness: f64,
    pub sharpness: f64,
}

impl FrameScore {
    /// Measure a frame on all three axes.
    pub fn measure(frame: &Frame) -> Self {
        Self {
            contrast: frame.contrast(),
            brightness: frame.brightness_centeredness(),
            sharpness: frame.sharpness(),
        }
    }

    /// Whether the frame clears the acceptance thresholds.
    pub fn acceptable(&self, config: &SelectionConfig) -> bool {
        self.contrast >= config.min_contrast && self.brightness >= config.min_brightness
    }

    /// Weighted composite used to rank best-effort candidates.
    pub fn composite(&self, weights: &ScoreWeights) -> f64 {
        let total = weights.contrast + weights.brightness + weights.sharpness;
        (self.contrast * weights.contrast
            + self.brightness * weights.brightness
            + self.sharpness * weights.sharpness)
            / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptance_thresholds() {
        let config = SelectionConfig::default();

        let good = FrameScore {
            contrast: 0.6,
            brightness: 0.9,
            sharpness: 0.5,
        };
        assert!(good.acceptable(&config));

        let low_contrast = FrameScore {
            contrast: 0.2,
            brightness: 0.9,
            sharpness: 0.5,
        };
        assert!(!low_contrast.acceptable(&config));

        let near_black = FrameScore {
            contrast: 0.5,
            brightness: 0.05,
            sharpness: 0.5,
        };
        assert!(!near_black.acceptable(&config));
    }

    #[test]
    fn test_composite_is_weighted_mean() {
        let score = FrameScore {
            contrast: 1.0,
            brightness: 1.0,
            sharpness: 1.0,
        };
        let composite = score.composite(&ScoreWeights::default());
        assert!((composite - 1.0).abs() < 1e-9);

        let half = FrameScore {
            contrast: 1.0,
            brightness: 0.0,
            sharpness: 0.0,
        };
        // contrast weight 0.4 of total 1.0
        assert!((half.composite(&ScoreWeights::default()) - 0.4).abs() < 1e-9);
    }
}
