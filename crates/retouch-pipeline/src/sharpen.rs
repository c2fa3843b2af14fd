//! 3×3 unsharp sharpening.

use tracing::trace;

use crate::convolve::{self, Kernel};
use crate::types::PixelBuffer;

/// Kernel neighbour weight for a sharpen strength (`strength / 10`).
#[must_use]
pub fn sharpen_amount(strength: u32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let strength = strength as f32;
    strength / 10.0
}

/// Sharpen with a 3×3 kernel whose center weight is `1 + 4 * amount` and
/// whose four edge neighbours weigh `-amount`.
///
/// A strength of zero returns the buffer unchanged. Output samples are
/// rounded and clamped to `0..=255`.
#[must_use = "returns the sharpened buffer"]
pub fn sharpen(buffer: &PixelBuffer, strength: u32) -> PixelBuffer {
    if strength == 0 {
        return buffer.clone();
    }

    let amount = sharpen_amount(strength);
    trace!(strength, amount, "sharpen");
    convolve::filter2d(buffer, &Kernel::sharpen(amount))
}
