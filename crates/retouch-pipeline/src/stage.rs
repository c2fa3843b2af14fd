//! Pipeline stage identifiers.
//!
//! Each [`Stage`] names one independently toggled transform. The
//! pipeline runs them in [`Stage::ORDER`]; the order matters because the
//! transforms do not commute (sharpening a gray-replicated image is not
//! the same as gray-replicating a sharpened one).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::PipelineParameters;
use crate::types::{PipelineError, PixelBuffer};

/// Identifier for one transform in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Gaussian blur.
    Blur,
    /// HSV saturation shift.
    Saturation,
    /// Contrast scaling.
    Contrast,
    /// 3×3 sharpening.
    Sharpen,
    /// Grayscale replicate.
    Grayscale,
    /// Exact-size resample.
    Resize,
}

impl Stage {
    /// All stages in the order the pipeline applies them.
    ///
    /// Grayscale and resize come last so they run on already-adjusted
    /// data, and sharpening happens while chroma is still present.
    pub const ORDER: [Self; 6] = [
        Self::Blur,
        Self::Saturation,
        Self::Contrast,
        Self::Sharpen,
        Self::Grayscale,
        Self::Resize,
    ];

    /// Display label for the stage.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Blur => "Blur",
            Self::Saturation => "Saturation",
            Self::Contrast => "Contrast",
            Self::Sharpen => "Sharpen",
            Self::Grayscale => "Grayscale",
            Self::Resize => "Resize",
        }
    }

    /// Whether `params` moves this stage away from its identity value.
    #[must_use]
    pub const fn is_enabled(self, params: &PipelineParameters) -> bool {
        match self {
            Self::Blur => params.blur_radius() > 0,
            Self::Saturation => params.saturation_delta() != 0,
            Self::Contrast => params.contrast_delta() != 0,
            Self::Sharpen => params.sharpen_strength() > 0,
            Self::Grayscale => params.grayscale(),
            Self::Resize => params.resize_enabled(),
        }
    }

    /// Run this stage on `buffer` with the knob taken from `params`.
    ///
    /// # Errors
    ///
    /// Only [`Stage::Resize`] can fail, with
    /// [`PipelineError::InvalidDimensions`] for a zero target.
    pub fn apply(
        self,
        buffer: &PixelBuffer,
        params: &PipelineParameters,
    ) -> Result<PixelBuffer, PipelineError> {
        Ok(match self {
            Self::Blur => crate::blur::gaussian_blur(buffer, params.blur_radius()),
            Self::Saturation => {
                crate::saturation::shift_saturation(buffer, params.saturation_delta())
            }
            Self::Contrast => crate::contrast::scale_contrast(buffer, params.contrast_delta()),
            Self::Sharpen => crate::sharpen::sharpen(buffer, params.sharpen_strength()),
            Self::Grayscale => crate::grayscale::grayscale(buffer, params.grayscale()),
            Self::Resize => {
                if !params.resize_enabled() {
                    return Ok(buffer.clone());
                }
                let (width, height) = params.resize_target();
                crate::resize::resize(buffer, width, height, params.resize_filter())?
            }
        })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn order_is_fixed() {
        let labels: Vec<&str> = Stage::ORDER.iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            ["Blur", "Saturation", "Contrast", "Sharpen", "Grayscale", "Resize"]
        );
    }

    #[test]
    fn order_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for stage in Stage::ORDER {
            assert!(seen.insert(stage), "Duplicate stage in ORDER: {stage}");
        }
    }

    #[test]
    fn nothing_enabled_by_default() {
        let params = PipelineParameters::default();
        assert!(Stage::ORDER.iter().all(|s| !s.is_enabled(&params)));
    }

    #[test]
    fn enabled_tracks_each_knob() {
        let mut params = PipelineParameters::default();
        params.set_sharpen_strength(3).unwrap();
        params.set_resize(5, 5).unwrap();
        let enabled: Vec<Stage> = Stage::ORDER
            .into_iter()
            .filter(|s| s.is_enabled(&params))
            .collect();
        assert_eq!(enabled, [Stage::Sharpen, Stage::Resize]);
    }

    #[test]
    fn disabled_resize_is_identity() {
        let img = PixelBuffer::filled(3, 3, crate::PixelLayout::Rgb, 1).unwrap();
        let out = Stage::Resize
            .apply(&img, &PipelineParameters::default())
            .unwrap();
        assert_eq!(out, img);
    }
}
