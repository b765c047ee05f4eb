//! Decoded frame view and per-frame measurements.
//!
//! Frames are represented by their luma plane only; chroma carries no
//! signal for any of the quality measures below, and a single plane keeps
//! the measurements identical regardless of the decoder's pixel format.

/// Number of luma histogram bins used for scene comparison.
const HISTOGRAM_BINS: usize = 64;

/// Scale constant mapping Laplacian variance into [0,1).
const SHARPNESS_SCALE: f64 = 2000.0;

/// A decoded frame's luma plane plus timeline position.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Presentation timestamp in seconds
    pub timestamp: f64,
    /// Fully-independent (non-predicted) frame
    pub keyframe: bool,
    /// Plane width in pixels
    pub width: u32,
    /// Plane height in pixels
    pub height: u32,
    /// Row-major 8-bit luma samples, `width * height` long
    pub luma: Vec<u8>,
}

impl Frame {
    /// Construct a frame, truncating or zero-padding the plane to size.
    pub fn new(timestamp: f64, keyframe: bool, width: u32, height: u32, mut luma: Vec<u8>) -> Self {
        luma.resize((width * height) as usize, 0);
        Self {
            timestamp,
            keyframe,
            width,
            height,
            luma,
        }
    }

    /// Mean luma in [0, 255].
    pub fn mean_luma(&self) -> f64 {
        if self.luma.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.luma.iter().map(|&v| v as u64).sum();
        sum as f64 / self.luma.len() as f64
    }

    /// RMS contrast normalized to [0, 1].
    pub fn contrast(&self) -> f64 {
        if self.luma.is_empty() {
            return 0.0;
        }
        let mean = self.mean_luma();
        let variance: f64 = self
            .luma
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.luma.len() as f64;
        // 127.5 is the maximum possible std-dev of an 8-bit plane
        (variance.sqrt() / 127.5).min(1.0)
    }

    /// Distance from mid-gray, inverted: 1.0 at mean 127.5, 0.0 at pure
    /// black or white.
    pub fn brightness_centeredness(&self) -> f64 {
        1.0 - (self.mean_luma() - 127.5).abs() / 127.5
    }

    /// Laplacian-variance sharpness normalized to [0, 1).
    pub fn sharpness(&self) -> f64 {
        let w = self.width as usize;
        let h = self.height as usize;
        if w < 3 || h < 3 {
            return 0.0;
        }

        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut count = 0usize;
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let center = self.luma[y * w + x] as f64;
                let response = 4.0 * center
                    - self.luma[y * w + x - 1] as f64
                    - self.luma[y * w + x + 1] as f64
                    - self.luma[(y - 1) * w + x] as f64
                    - self.luma[(y + 1) * w + x] as f64;
                sum += response;
                sum_sq += response * response;
                count += 1;
            }
        }
        let mean = sum / count as f64;
        let variance = sum_sq / count as f64 - mean * mean;
        variance / (variance + SHARPNESS_SCALE)
    }

    /// Normalized luma histogram (sums to 1 for a non-empty plane).
    pub fn histogram(&self) -> [f64; HISTOGRAM_BINS] {
        let mut hist = [0.0f64; HISTOGRAM_BINS];
        if self.luma.is_empty() {
            return hist;
        }
        let bin_width = 256 / HISTOGRAM_BINS;
        for &v in &self.luma {
            hist[v as usize / bin_width] += 1.0;
        }
        for bin in hist.iter_mut() {
            *bin /= self.luma.len() as f64;
        }
        hist
    }

    /// Scene-change score versus a previous frame, in [0, 1].
    ///
    /// One minus the histogram intersection: 0 for identical content,
    /// approaching 1 across a hard cut.
    pub fn scene_change_score(&self, prev: &Frame) -> f64 {
        1.0 - histogram_intersection(&self.histogram(), &prev.histogram())
    }
}

/// Histogram intersection similarity in [0, 1] for normalized histograms.
fn histogram_intersection(h1: &[f64], h2: &[f64]) -> f64 {
    h1.iter().zip(h2.iter()).map(|(a, b)| a.min(*b)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_frame(ts: f64, value: u8) -> Frame {
        Frame::new(ts, true, 32, 32, vec![value; 32 * 32])
    }

    fn split_frame(ts: f64) -> Frame {
        // Left half black, right half white: max contrast, centered mean
        let mut luma = Vec::with_capacity(32 * 32);
        for _ in 0..32 {
            luma.extend(std::iter::repeat(0u8).take(16));
            luma.extend(std::iter::repeat(255u8).take(16));
        }
        Frame::new(ts, true, 32, 32, luma)
    }

    #[test]
    fn test_flat_frame_measures() {
        let frame = flat_frame(1.0, 128);
        assert!(frame.contrast() < 0.01);
        assert!(frame.brightness_centeredness() > 0.99);
        assert!(frame.sharpness() < 0.01);
    }

    #[test]
    fn test_split_frame_measures() {
        let frame = split_frame(1.0);
        assert!((frame.contrast() - 1.0).abs() < 0.01);
        assert!(frame.brightness_centeredness() > 0.99);
    }

    #[test]
    fn test_near_black_is_off_center() {
        let frame = flat_frame(1.0, 5);
        assert!(frame.brightness_centeredness() < 0.1);
    }

    #[test]
    fn test_scene_change_score() {
        let a = flat_frame(1.0, 128);
        let b = flat_frame(1.1, 128);
        assert!(b.scene_change_score(&a) < 0.01);

        let cut = split_frame(1.2);
        assert!(cut.scene_change_score(&a) > 0.9);
    }

    #[test]
    fn test_histogram_normalized() {
        let frame = split_frame(0.0);
        let total: f64 = frame.histogram().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_plane_padding() {
        // Short plane is zero-padded rather than panicking
        let frame = Frame::new(0.0, false, 8, 8, vec![255; 10]);
        assert_eq!(frame.luma.len(), 64);
    }
}
