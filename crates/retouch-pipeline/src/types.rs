//! Shared types for the retouch image pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Arrangement of the interleaved samples of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelLayout {
    /// One luminance sample per pixel.
    Gray,
    /// Red, green, blue.
    Rgb,
    /// Blue, green, red.
    Bgr,
}

impl PixelLayout {
    /// Number of samples per pixel.
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb | Self::Bgr => 3,
        }
    }

    /// Whether the layout carries color (three channels).
    #[must_use]
    pub const fn is_color(self) -> bool {
        !matches!(self, Self::Gray)
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gray => f.write_str("Gray"),
            Self::Rgb => f.write_str("RGB"),
            Self::Bgr => f.write_str("BGR"),
        }
    }
}

/// An owned, row-major raster of 8-bit samples.
///
/// The sample vector always holds exactly `width * height * channels`
/// bytes; every constructor enforces this, so code that receives a
/// `PixelBuffer` never re-validates it. Transforms never mutate their
/// input: each one returns a fresh buffer owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    dimensions: Dimensions,
    layout: PixelLayout,
    samples: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap an existing sample vector.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidDimensions`] if either dimension is
    /// zero (or the sample count overflows `usize`).
    /// Returns [`PipelineError::SampleCountMismatch`] if `samples` does not
    /// hold exactly `width * height * channels` bytes.
    pub fn new(
        width: u32,
        height: u32,
        layout: PixelLayout,
        samples: Vec<u8>,
    ) -> Result<Self, PipelineError> {
        let expected = sample_len(width, height, layout)?;
        if samples.len() != expected {
            return Err(PipelineError::SampleCountMismatch {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            dimensions: Dimensions { width, height },
            layout,
            samples,
        })
    }

    /// Wrap a sample vector described only by its channel count.
    ///
    /// One channel maps to [`PixelLayout::Gray`], three to
    /// [`PixelLayout::Rgb`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnsupportedChannelCount`] for any other
    /// channel count, plus everything [`PixelBuffer::new`] can return.
    pub fn from_interleaved(
        width: u32,
        height: u32,
        channels: u8,
        samples: Vec<u8>,
    ) -> Result<Self, PipelineError> {
        let layout = match channels {
            1 => PixelLayout::Gray,
            3 => PixelLayout::Rgb,
            other => return Err(PipelineError::UnsupportedChannelCount(other)),
        };
        Self::new(width, height, layout, samples)
    }

    /// A buffer where every sample equals `value`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidDimensions`] if either dimension is
    /// zero.
    pub fn filled(
        width: u32,
        height: u32,
        layout: PixelLayout,
        value: u8,
    ) -> Result<Self, PipelineError> {
        let len = sample_len(width, height, layout)?;
        Self::new(width, height, layout, vec![value; len])
    }

    /// Build a new buffer with the same geometry and layout as `self`.
    ///
    /// Only used by transforms that preserve the sample count.
    pub(crate) fn with_samples(&self, samples: Vec<u8>) -> Self {
        debug_assert_eq!(samples.len(), self.samples.len());
        Self {
            dimensions: self.dimensions,
            layout: self.layout,
            samples,
        }
    }

    /// Build a buffer whose invariants the caller has already established.
    pub(crate) fn from_parts(dimensions: Dimensions, layout: PixelLayout, samples: Vec<u8>) -> Self {
        debug_assert_eq!(
            samples.len() as u64,
            dimensions.pixel_count() * layout.channels() as u64
        );
        Self {
            dimensions,
            layout,
            samples,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.dimensions.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.dimensions.height
    }

    /// Width and height together.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Channel arrangement.
    #[must_use]
    pub const fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Samples per pixel.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// The raw row-major sample stream.
    #[must_use]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Size of the raw sample stream in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.samples.len()
    }

    /// Consume the buffer and return its sample vector.
    #[must_use]
    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// Samples of the pixel at `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let c = self.channels();
        let start = (y as usize * self.width() as usize + x as usize) * c;
        self.samples.get(start..start + c)
    }
}

/// Number of samples a buffer of the given geometry must hold.
fn sample_len(width: u32, height: u32, layout: PixelLayout) -> Result<usize, PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidDimensions { width, height });
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(layout.channels()))
        .ok_or(PipelineError::InvalidDimensions { width, height })
}

/// Errors produced by the pipeline core and the run-length codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// A width or height was zero (or too large to address).
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A raw sample stream claimed a channel count other than 1 or 3.
    #[error("unsupported channel count {0} (expected 1 or 3)")]
    UnsupportedChannelCount(u8),

    /// A sample vector did not match its declared geometry.
    #[error("expected {expected} samples, got {actual}")]
    SampleCountMismatch {
        /// `width * height * channels`.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// A pipeline parameter was set outside its permitted range.
    #[error("{name} = {value} is outside the permitted range [{min}, {max}]")]
    ParameterOutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },

    /// A run-length stream could not be expanded into the expected buffer.
    #[error("corrupt run-length stream: {0}")]
    CorruptStream(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_exact_sample_count() {
        let buf = PixelBuffer::new(2, 3, PixelLayout::Rgb, vec![0; 18]).unwrap();
        assert_eq!(buf.width(), 2);
        assert_eq!(buf.height(), 3);
        assert_eq!(buf.channels(), 3);
        assert_eq!(buf.byte_len(), 18);
    }

    #[test]
    fn new_rejects_zero_width() {
        let result = PixelBuffer::new(0, 3, PixelLayout::Gray, vec![]);
        assert_eq!(
            result,
            Err(PipelineError::InvalidDimensions {
                width: 0,
                height: 3
            })
        );
    }

    #[test]
    fn new_rejects_zero_height() {
        let result = PixelBuffer::filled(4, 0, PixelLayout::Rgb, 7);
        assert!(matches!(
            result,
            Err(PipelineError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn new_rejects_short_sample_vector() {
        let result = PixelBuffer::new(2, 2, PixelLayout::Rgb, vec![0; 11]);
        assert_eq!(
            result,
            Err(PipelineError::SampleCountMismatch {
                expected: 12,
                actual: 11
            })
        );
    }

    #[test]
    fn from_interleaved_maps_channel_counts() {
        let gray = PixelBuffer::from_interleaved(2, 1, 1, vec![1, 2]).unwrap();
        assert_eq!(gray.layout(), PixelLayout::Gray);
        let rgb = PixelBuffer::from_interleaved(1, 1, 3, vec![1, 2, 3]).unwrap();
        assert_eq!(rgb.layout(), PixelLayout::Rgb);
    }

    #[test]
    fn from_interleaved_rejects_four_channels() {
        let result = PixelBuffer::from_interleaved(1, 1, 4, vec![0; 4]);
        assert_eq!(result, Err(PipelineError::UnsupportedChannelCount(4)));
    }

    #[test]
    fn pixel_indexes_row_major() {
        let samples: Vec<u8> = (0..12).collect();
        let buf = PixelBuffer::new(2, 2, PixelLayout::Rgb, samples).unwrap();
        assert_eq!(buf.pixel(0, 0), Some(&[0, 1, 2][..]));
        assert_eq!(buf.pixel(1, 0), Some(&[3, 4, 5][..]));
        assert_eq!(buf.pixel(0, 1), Some(&[6, 7, 8][..]));
        assert_eq!(buf.pixel(2, 0), None);
    }

    #[test]
    fn dimensions_display() {
        let d = Dimensions {
            width: 640,
            height: 480,
        };
        assert_eq!(d.to_string(), "640x480");
        assert_eq!(d.pixel_count(), 307_200);
    }
}
