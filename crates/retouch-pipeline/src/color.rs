//! Color-space conversions between RGB, BGR, grayscale and HSV.
//!
//! Every conversion is total over a well-formed [`PixelBuffer`]. The
//! grayscale path is lossy: once a buffer has been reduced to a single
//! luminance channel, replicating it back to three channels cannot
//! recover the original chroma.
//!
//! HSV is kept in floating point ([`HsvImage`]) rather than packed into
//! 8-bit samples, so an RGB → HSV → RGB round trip is accurate to within
//! one unit per channel.

use crate::types::{Dimensions, PixelBuffer, PixelLayout};

/// Luminance weights (ITU-R BT.601) for red, green and blue.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Round and saturate a filtered value to the 8-bit sample range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn saturate_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Luminance of a single RGB triple.
#[must_use]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let [wr, wg, wb] = LUMA_WEIGHTS;
    saturate_u8(wr.mul_add(f32::from(r), wg.mul_add(f32::from(g), wb * f32::from(b))))
}

/// Read pixel `i` of a color buffer as `[r, g, b]` regardless of layout.
fn rgb_at(samples: &[u8], layout: PixelLayout, i: usize) -> [u8; 3] {
    match layout {
        PixelLayout::Gray => [samples[i]; 3],
        PixelLayout::Rgb => [samples[i * 3], samples[i * 3 + 1], samples[i * 3 + 2]],
        PixelLayout::Bgr => [samples[i * 3 + 2], samples[i * 3 + 1], samples[i * 3]],
    }
}

/// Iterate the pixels of any buffer as `[r, g, b]` triples.
fn rgb_pixels(buffer: &PixelBuffer) -> impl Iterator<Item = [u8; 3]> + '_ {
    let count = buffer.byte_len() / buffer.channels();
    (0..count).map(|i| rgb_at(buffer.samples(), buffer.layout(), i))
}

/// Pack `[r, g, b]` triples into a buffer of the requested layout.
fn pack(
    dimensions: Dimensions,
    layout: PixelLayout,
    pixels: impl Iterator<Item = [u8; 3]>,
) -> PixelBuffer {
    let count = dimensions.width as usize * dimensions.height as usize;
    let mut samples = Vec::with_capacity(count * layout.channels());
    for [r, g, b] in pixels {
        match layout {
            PixelLayout::Gray => samples.push(luma(r, g, b)),
            PixelLayout::Rgb => samples.extend_from_slice(&[r, g, b]),
            PixelLayout::Bgr => samples.extend_from_slice(&[b, g, r]),
        }
    }
    PixelBuffer::from_parts(dimensions, layout, samples)
}

/// Convert any buffer to [`PixelLayout::Rgb`].
///
/// A grayscale input is replicated into all three channels.
#[must_use = "returns the converted buffer"]
pub fn to_rgb(buffer: &PixelBuffer) -> PixelBuffer {
    if buffer.layout() == PixelLayout::Rgb {
        return buffer.clone();
    }
    pack(buffer.dimensions(), PixelLayout::Rgb, rgb_pixels(buffer))
}

/// Convert any buffer to [`PixelLayout::Bgr`].
///
/// A grayscale input is replicated into all three channels.
#[must_use = "returns the converted buffer"]
pub fn to_bgr(buffer: &PixelBuffer) -> PixelBuffer {
    if buffer.layout() == PixelLayout::Bgr {
        return buffer.clone();
    }
    pack(buffer.dimensions(), PixelLayout::Bgr, rgb_pixels(buffer))
}

/// Reduce a buffer to a single luminance channel.
///
/// Uses the fixed [`LUMA_WEIGHTS`]; the output is always
/// [`PixelLayout::Gray`].
#[must_use = "returns the grayscale buffer"]
pub fn to_gray(buffer: &PixelBuffer) -> PixelBuffer {
    if buffer.layout() == PixelLayout::Gray {
        return buffer.clone();
    }
    pack(buffer.dimensions(), PixelLayout::Gray, rgb_pixels(buffer))
}

/// Replicate a buffer's luminance into the requested layout.
///
/// Color inputs are reduced to luminance first, so the result never
/// carries chroma.
#[must_use = "returns the replicated buffer"]
pub fn replicate_gray(buffer: &PixelBuffer, layout: PixelLayout) -> PixelBuffer {
    let gray = to_gray(buffer);
    if layout == PixelLayout::Gray {
        return gray;
    }
    let pixels = gray.samples().iter().map(|&v| [v; 3]);
    pack(gray.dimensions(), layout, pixels)
}

/// A single pixel in HSV space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    /// Hue in degrees, `[0, 360)`.
    pub h: f32,
    /// Saturation on a `0..=255` scale.
    pub s: f32,
    /// Value on a `0..=255` scale.
    pub v: f32,
}

/// Convert an RGB triple to HSV.
#[must_use]
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> Hsv {
    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };
    let h = if delta <= 0.0 {
        0.0
    } else if (max - r).abs() < f32::EPSILON {
        60.0 * (g - b) / delta
    } else if (max - g).abs() < f32::EPSILON {
        60.0f32.mul_add((b - r) / delta, 120.0)
    } else {
        60.0f32.mul_add((r - g) / delta, 240.0)
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    Hsv { h, s, v: max }
}

/// Convert an HSV pixel back to an RGB triple.
///
/// Saturation and value are clamped to `0..=255` before conversion, so
/// callers may pass shifted values directly.
#[must_use]
pub fn hsv_to_rgb(hsv: Hsv) -> [u8; 3] {
    let v = hsv.v.clamp(0.0, 255.0);
    let s = hsv.s.clamp(0.0, 255.0);
    if s <= 0.0 {
        let g = saturate_u8(v);
        return [g, g, g];
    }

    let chroma = v * s / 255.0;
    let hp = hsv.h.rem_euclid(360.0) / 60.0;
    let x = chroma * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let m = v - chroma;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (r, g, b) = match hp as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    [saturate_u8(r + m), saturate_u8(g + m), saturate_u8(b + m)]
}

/// A floating-point HSV plane derived from a [`PixelBuffer`].
///
/// Remembers the layout of the buffer it came from so
/// [`from_hsv`] can restore the same sample order.
#[derive(Debug, Clone, PartialEq)]
pub struct HsvImage {
    dimensions: Dimensions,
    layout: PixelLayout,
    pixels: Vec<Hsv>,
}

impl HsvImage {
    /// HSV pixels in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[Hsv] {
        &self.pixels
    }

    /// Mutable access for in-place channel edits.
    pub fn pixels_mut(&mut self) -> &mut [Hsv] {
        &mut self.pixels
    }

    /// Layout that [`from_hsv`] will produce.
    #[must_use]
    pub const fn layout(&self) -> PixelLayout {
        self.layout
    }
}

/// Convert a buffer to a floating-point HSV plane.
#[must_use = "returns the HSV plane"]
pub fn to_hsv(buffer: &PixelBuffer) -> HsvImage {
    HsvImage {
        dimensions: buffer.dimensions(),
        layout: buffer.layout(),
        pixels: rgb_pixels(buffer).map(rgb_to_hsv).collect(),
    }
}

/// Convert an HSV plane back to a buffer in its original layout.
#[must_use = "returns the converted buffer"]
pub fn from_hsv(image: &HsvImage) -> PixelBuffer {
    let pixels = image.pixels.iter().map(|&p| hsv_to_rgb(p));
    pack(image.dimensions, image.layout, pixels)
}
