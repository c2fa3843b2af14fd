//! Resampling to an exact target size.
//!
//! Unlike an aspect-preserving fit, the output always has exactly the
//! requested width and height; a source with a different aspect ratio is
//! stretched. Resampling is delegated to [`image::imageops::resize`].

use std::fmt;

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::types::{Dimensions, PipelineError, PixelBuffer, PixelLayout};

/// Resampling filter used when resizing.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeFilter {
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation: fast, decent quality.
    Triangle,
    /// Bicubic (Catmull-Rom): moderate speed, good quality.
    CatmullRom,
    /// Gaussian: moderate speed, smooth output.
    Gaussian,
    /// Lanczos with 3 lobes: slowest, sharpest/best for photos.
    Lanczos3,
}

impl ResizeFilter {
    /// Filter used when none is configured.
    pub const DEFAULT: Self = Self::Triangle;

    /// Convert to the `image` crate's `FilterType`.
    const fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Triangle => image::imageops::FilterType::Triangle,
            Self::CatmullRom => image::imageops::FilterType::CatmullRom,
            Self::Gaussian => image::imageops::FilterType::Gaussian,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl Default for ResizeFilter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("Nearest"),
            Self::Triangle => f.write_str("Triangle"),
            Self::CatmullRom => f.write_str("CatmullRom"),
            Self::Gaussian => f.write_str("Gaussian"),
            Self::Lanczos3 => f.write_str("Lanczos3"),
        }
    }
}

/// Resample `buffer` to exactly `width` × `height`.
///
/// The layout is preserved. Resizing to the current size returns an
/// unchanged copy.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidDimensions`] if either target
/// dimension is zero.
pub fn resize(
    buffer: &PixelBuffer,
    width: u32,
    height: u32,
    filter: ResizeFilter,
) -> Result<PixelBuffer, PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidDimensions { width, height });
    }
    let target = Dimensions { width, height };
    if target == buffer.dimensions() {
        return Ok(buffer.clone());
    }

    trace!(from = %buffer.dimensions(), to = %target, %filter, "resize");
    let mismatch = || PipelineError::SampleCountMismatch {
        expected: buffer.width() as usize * buffer.height() as usize * buffer.channels(),
        actual: buffer.byte_len(),
    };
    let (w, h) = (buffer.width(), buffer.height());
    let filter = filter.to_image_filter();

    let samples = match buffer.layout() {
        PixelLayout::Gray => {
            let img = GrayImage::from_raw(w, h, buffer.samples().to_vec()).ok_or_else(mismatch)?;
            image::imageops::resize(&img, width, height, filter).into_raw()
        }
        // Resampling is per-channel, so BGR can ride through as RGB.
        PixelLayout::Rgb | PixelLayout::Bgr => {
            let img = RgbImage::from_raw(w, h, buffer.samples().to_vec()).ok_or_else(mismatch)?;
            image::imageops::resize(&img, width, height, filter).into_raw()
        }
    };

    Ok(PixelBuffer::from_parts(target, buffer.layout(), samples))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_image(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::filled(w, h, PixelLayout::Rgb, 128).unwrap()
    }

    #[test]
    fn default_filter_is_triangle() {
        assert_eq!(ResizeFilter::default(), ResizeFilter::Triangle);
    }

    #[test]
    fn shrink_landscape_to_exact_size() {
        let out = resize(&test_image(1024, 768), 100, 100, ResizeFilter::Triangle).unwrap();
        assert_eq!(out.width(), 100);
        assert_eq!(out.height(), 100);
        assert_eq!(out.byte_len(), 100 * 100 * 3);
    }

    #[test]
    fn enlarge_ignores_aspect_ratio() {
        let out = resize(&test_image(3, 7), 40, 9, ResizeFilter::Lanczos3).unwrap();
        assert_eq!(
            out.dimensions(),
            Dimensions {
                width: 40,
                height: 9
            }
        );
    }

    #[test]
    fn same_size_is_identity() {
        let samples: Vec<u8> = (0..48).collect();
        let img = PixelBuffer::new(4, 4, PixelLayout::Rgb, samples).unwrap();
        assert_eq!(resize(&img, 4, 4, ResizeFilter::Nearest).unwrap(), img);
    }

    #[test]
    fn zero_target_rejected() {
        let result = resize(&test_image(4, 4), 0, 4, ResizeFilter::Triangle);
        assert_eq!(
            result,
            Err(PipelineError::InvalidDimensions {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn gray_and_bgr_layouts_preserved() {
        let gray = PixelBuffer::filled(8, 8, PixelLayout::Gray, 9).unwrap();
        let out = resize(&gray, 3, 2, ResizeFilter::Triangle).unwrap();
        assert_eq!(out.layout(), PixelLayout::Gray);
        assert_eq!(out.byte_len(), 6);
        assert!(out.samples().iter().all(|&s| s == 9));

        let bgr = PixelBuffer::filled(8, 8, PixelLayout::Bgr, 9).unwrap();
        let out = resize(&bgr, 2, 5, ResizeFilter::CatmullRom).unwrap();
        assert_eq!(out.layout(), PixelLayout::Bgr);
    }

    #[test]
    fn filter_display() {
        assert_eq!(ResizeFilter::CatmullRom.to_string(), "CatmullRom");
    }
}
