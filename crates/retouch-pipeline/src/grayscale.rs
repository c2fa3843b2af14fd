//! Grayscale conversion stage.
//!
//! Reduces the image to luminance and immediately replicates it back to
//! three channels, so every later stage (and every consumer) keeps
//! seeing a color buffer. The step is lossy: chroma is gone
//! for good. Applying it to a buffer that is already gray-replicated
//! changes nothing.

use tracing::trace;

use crate::color;
use crate::types::{PixelBuffer, PixelLayout};

/// Convert to grayscale and back to three channels.
///
/// Color inputs keep their sample order; a [`PixelLayout::Gray`] input
/// becomes [`PixelLayout::Rgb`]. When `enabled` is `false` the buffer is
/// returned unchanged.
#[must_use = "returns the grayscale buffer"]
pub fn grayscale(buffer: &PixelBuffer, enabled: bool) -> PixelBuffer {
    if !enabled {
        return buffer.clone();
    }

    let layout = if buffer.layout().is_color() {
        buffer.layout()
    } else {
        PixelLayout::Rgb
    };
    trace!(%layout, "grayscale");
    color::replicate_gray(buffer, layout)
}
