//! Contrast scaling around zero.
//!
//! Every sample is multiplied by `1 + delta / 50` with no offset. Deltas
//! below -50 produce a negative factor, which the clamp folds to zero.

use tracing::trace;

use crate::color::saturate_u8;
use crate::types::PixelBuffer;

/// Scale factor applied for a contrast delta.
#[must_use]
pub fn contrast_factor(delta: i32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let delta = delta as f32;
    1.0 + delta / 50.0
}

/// Scale every sample by [`contrast_factor`], rounding and clamping to
/// `0..=255`. A delta of zero returns the buffer unchanged.
#[must_use = "returns the adjusted buffer"]
pub fn scale_contrast(buffer: &PixelBuffer, delta: i32) -> PixelBuffer {
    if delta == 0 {
        return buffer.clone();
    }

    let factor = contrast_factor(delta);
    trace!(delta, factor, "contrast scale");
    let samples = buffer
        .samples()
        .iter()
        .map(|&s| saturate_u8(f32::from(s) * factor))
        .collect();
    buffer.with_samples(samples)
}
