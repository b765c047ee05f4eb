//! Thumbnail variant planning.
//!
//! The worker encodes the selected frame at several widths in two
//! encodings; this module fixes the ladder, the per-tier encoding
//! parameters, and the storage key for each output so every component
//! agrees on where derivatives land.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output widths for the thumbnail ladder, smallest first.
pub const THUMBNAIL_WIDTHS: [u32; 3] = [320, 640, 1280];

/// Image encoding for a thumbnail output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    /// Primary encoding, served to modern clients
    Webp,
    /// Fallback for clients without WebP support
    Jpeg,
}

impl ImageEncoding {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Jpeg => "jpg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Webp => "image/webp",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// One planned thumbnail output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ThumbnailVariant {
    pub width: u32,
    pub height: u32,
    pub encoding: ImageEncoding,
    /// Encoder quality, 1-100
    pub quality: u8,
    /// Upper bound the encoder should stay under
    pub max_bytes: u64,
    /// Storage key, scoped under the job's output prefix
    pub key: String,
}

/// Plan the thumbnail outputs for a selected frame: every ladder width up
/// to the source width, in both encodings.
///
/// Source dimensions drive the heights: each width keeps the source aspect
/// ratio, rounded to the nearest even pixel. Widths above the source are
/// skipped rather than upscaled. Keys follow the creator-scoped layout
/// `{prefix}thumbnails/{media_id}/{width}.{ext}`.
pub fn plan_thumbnail_variants(
    output_prefix: &str,
    media_id: &str,
    source_width: u32,
    source_height: u32,
) -> Vec<ThumbnailVariant> {
    if source_width == 0 || source_height == 0 {
        return Vec::new();
    }

    let mut variants = Vec::new();
    for &width in THUMBNAIL_WIDTHS.iter().filter(|&&w| w <= source_width) {
        let height = scaled_even_height(source_width, source_height, width);
        for encoding in [ImageEncoding::Webp, ImageEncoding::Jpeg] {
            let (quality, max_bytes) = tier_parameters(width, encoding);
            variants.push(ThumbnailVariant {
                width,
                height,
                encoding,
                quality,
                max_bytes,
                key: format!(
                    "{}thumbnails/{}/{}.{}",
                    output_prefix,
                    media_id,
                    width,
                    encoding.extension()
                ),
            });
        }
    }
    variants
}

/// Per-tier encoding parameters. Small widths get a tight byte ceiling so
/// list views stay cheap; the large tier trades size for quality. JPEG
/// compresses worse than WebP at similar quality, hence the looser bounds.
fn tier_parameters(width: u32, encoding: ImageEncoding) -> (u8, u64) {
    match (width, encoding) {
        (320, ImageEncoding::Webp) => (70, 30 * 1024),
        (320, ImageEncoding::Jpeg) => (72, 45 * 1024),
        (640, ImageEncoding::Webp) => (78, 90 * 1024),
        (640, ImageEncoding::Jpeg) => (80, 130 * 1024),
        (_, ImageEncoding::Webp) => (82, 250 * 1024),
        (_, ImageEncoding::Jpeg) => (85, 350 * 1024),
    }
}

/// Height preserving the source aspect ratio, rounded to an even number.
fn scaled_even_height(source_width: u32, source_height: u32, target_width: u32) -> u32 {
    let scaled = target_width as u64 * source_height as u64 / source_width as u64;
    let even = (scaled / 2) * 2;
    (even as u32).max(2)
}
