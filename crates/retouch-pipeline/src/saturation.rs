//! Saturation shift in HSV space.

use tracing::trace;

use crate::color;
use crate::types::{PixelBuffer, PixelLayout};

/// Add `delta` to every pixel's saturation, leaving hue and value alone.
///
/// Saturation is clamped to `0..=255` after the shift. A delta of zero
/// returns the buffer unchanged, as does a [`PixelLayout::Gray`] buffer,
/// which has no chroma to shift.
#[must_use = "returns the adjusted buffer"]
pub fn shift_saturation(buffer: &PixelBuffer, delta: i32) -> PixelBuffer {
    if delta == 0 || buffer.layout() == PixelLayout::Gray {
        return buffer.clone();
    }

    trace!(delta, "saturation shift");
    #[allow(clippy::cast_precision_loss)]
    let delta = delta as f32;
    let mut hsv = color::to_hsv(buffer);
    for pixel in hsv.pixels_mut() {
        pixel.s = (pixel.s + delta).clamp(0.0, 255.0);
    }
    color::from_hsv(&hsv)
}
