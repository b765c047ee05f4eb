//! Audio waveform planning and peak extraction.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Peak resolution of the waveform data file.
pub const WAVEFORM_PIXELS_PER_SECOND: u32 = 10;

/// Bit depth of the stored peak values.
pub const WAVEFORM_BITS: u32 = 8;

/// Rendered overview image dimensions.
pub const WAVEFORM_IMAGE_WIDTH: u32 = 1800;
pub const WAVEFORM_IMAGE_HEIGHT: u32 = 140;

/// Storage keys and parameters for a media item's waveform outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WaveformPlan {
    /// Peak data file, `{prefix}waveforms/{media_id}/waveform.json`
    pub json_key: String,
    /// Rendered overview, `{prefix}waveforms/{media_id}/waveform.png`
    pub image_key: String,
    pub pixels_per_second: u32,
    pub bits: u32,
    pub image_width: u32,
    pub image_height: u32,
}

/// Plan waveform output locations under the job's output prefix.
pub fn plan_waveform(output_prefix: &str, media_id: &str) -> WaveformPlan {
    WaveformPlan {
        json_key: format!("{}waveforms/{}/waveform.json", output_prefix, media_id),
        image_key: format!("{}waveforms/{}/waveform.png", output_prefix, media_id),
        pixels_per_second: WAVEFORM_PIXELS_PER_SECOND,
        bits: WAVEFORM_BITS,
        image_width: WAVEFORM_IMAGE_WIDTH,
        image_height: WAVEFORM_IMAGE_HEIGHT,
    }
}

/// Reduce mono samples to (min, max) peak pairs, one pair per output pixel.
///
/// Samples outside [-1, 1] are clamped before quantizing to signed 8-bit.
/// A trailing partial bucket still produces a pair, so short inputs are
/// never silently dropped.
pub fn compute_peaks(samples: &[f32], sample_rate: u32, pixels_per_second: u32) -> Vec<(i8, i8)> {
    if samples.is_empty() || sample_rate == 0 || pixels_per_second == 0 {
        return Vec::new();
    }

    let bucket = (sample_rate / pixels_per_second).max(1) as usize;
    samples
        .chunks(bucket)
        .map(|chunk| {
            let mut min = f32::MAX;
            let mut max = f32::MIN;
            for &s in chunk {
                let s = s.clamp(-1.0, 1.0);
                min = min.min(s);
                max = max.max(s);
            }
            (quantize(min), quantize(max))
        })
        .collect()
}

fn quantize(sample: f32) -> i8 {
    (sample * 127.0).round() as i8
}
