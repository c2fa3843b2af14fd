//! The pipeline parameter record.
//!
//! Every knob starts at its identity value, so a fresh
//! [`PipelineParameters`] leaves an image untouched. Fields are private
//! and each setter validates only its own field; a rejected value leaves
//! the record exactly as it was. Deserialization goes through the same
//! checks, so a record can never be observed in a partially invalid
//! state.

use serde::{Deserialize, Serialize};

use crate::resize::ResizeFilter;
use crate::types::PipelineError;

/// Largest accepted blur radius.
pub const MAX_BLUR_RADIUS: u32 = 20;
/// Saturation and contrast deltas are limited to `±DELTA_LIMIT`.
pub const DELTA_LIMIT: i32 = 100;
/// Largest accepted sharpen strength.
pub const MAX_SHARPEN_STRENGTH: u32 = 20;
/// Target size used until a resize is requested.
pub const DEFAULT_RESIZE_EXTENT: u32 = 100;

/// Validated pipeline knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawParameters", into = "RawParameters")]
pub struct PipelineParameters {
    blur_radius: u32,
    saturation_delta: i32,
    contrast_delta: i32,
    sharpen_strength: u32,
    grayscale: bool,
    resize: bool,
    resize_width: u32,
    resize_height: u32,
    resize_filter: ResizeFilter,
}

impl Default for PipelineParameters {
    fn default() -> Self {
        Self {
            blur_radius: 0,
            saturation_delta: 0,
            contrast_delta: 0,
            sharpen_strength: 0,
            grayscale: false,
            resize: false,
            resize_width: DEFAULT_RESIZE_EXTENT,
            resize_height: DEFAULT_RESIZE_EXTENT,
            resize_filter: ResizeFilter::default(),
        }
    }
}

fn check_range(name: &'static str, value: i64, min: i64, max: i64) -> Result<(), PipelineError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(PipelineError::ParameterOutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

impl PipelineParameters {
    /// Blur radius; zero disables the blur stage.
    #[must_use]
    pub const fn blur_radius(&self) -> u32 {
        self.blur_radius
    }

    /// Saturation delta; zero disables the saturation stage.
    #[must_use]
    pub const fn saturation_delta(&self) -> i32 {
        self.saturation_delta
    }

    /// Contrast delta; zero disables the contrast stage.
    #[must_use]
    pub const fn contrast_delta(&self) -> i32 {
        self.contrast_delta
    }

    /// Sharpen strength; zero disables the sharpen stage.
    #[must_use]
    pub const fn sharpen_strength(&self) -> u32 {
        self.sharpen_strength
    }

    /// Whether the grayscale stage runs.
    #[must_use]
    pub const fn grayscale(&self) -> bool {
        self.grayscale
    }

    /// Whether the resize stage runs.
    #[must_use]
    pub const fn resize_enabled(&self) -> bool {
        self.resize
    }

    /// Resize target `(width, height)`.
    #[must_use]
    pub const fn resize_target(&self) -> (u32, u32) {
        (self.resize_width, self.resize_height)
    }

    /// Resampling filter for the resize stage.
    #[must_use]
    pub const fn resize_filter(&self) -> ResizeFilter {
        self.resize_filter
    }

    /// `true` when every stage would be skipped.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        self.blur_radius == 0
            && self.saturation_delta == 0
            && self.contrast_delta == 0
            && self.sharpen_strength == 0
            && !self.grayscale
            && !self.resize
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::ParameterOutOfRange`] above
    /// [`MAX_BLUR_RADIUS`].
    pub fn set_blur_radius(&mut self, radius: u32) -> Result<(), PipelineError> {
        check_range(
            "blur_radius",
            i64::from(radius),
            0,
            i64::from(MAX_BLUR_RADIUS),
        )?;
        self.blur_radius = radius;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::ParameterOutOfRange`] outside
    /// `±DELTA_LIMIT`.
    pub fn set_saturation_delta(&mut self, delta: i32) -> Result<(), PipelineError> {
        check_range(
            "saturation_delta",
            i64::from(delta),
            i64::from(-DELTA_LIMIT),
            i64::from(DELTA_LIMIT),
        )?;
        self.saturation_delta = delta;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::ParameterOutOfRange`] outside
    /// `±DELTA_LIMIT`.
    pub fn set_contrast_delta(&mut self, delta: i32) -> Result<(), PipelineError> {
        check_range(
            "contrast_delta",
            i64::from(delta),
            i64::from(-DELTA_LIMIT),
            i64::from(DELTA_LIMIT),
        )?;
        self.contrast_delta = delta;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::ParameterOutOfRange`] above
    /// [`MAX_SHARPEN_STRENGTH`].
    pub fn set_sharpen_strength(&mut self, strength: u32) -> Result<(), PipelineError> {
        check_range(
            "sharpen_strength",
            i64::from(strength),
            0,
            i64::from(MAX_SHARPEN_STRENGTH),
        )?;
        self.sharpen_strength = strength;
        Ok(())
    }

    /// Enable or disable the grayscale stage.
    pub const fn set_grayscale(&mut self, enabled: bool) {
        self.grayscale = enabled;
    }

    /// Flip the grayscale stage and return the new state.
    pub const fn toggle_grayscale(&mut self) -> bool {
        self.grayscale = !self.grayscale;
        self.grayscale
    }

    /// Enable the resize stage with the given target size.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidDimensions`] if either dimension is
    /// zero.
    pub const fn set_resize(&mut self, width: u32, height: u32) -> Result<(), PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidDimensions { width, height });
        }
        self.resize = true;
        self.resize_width = width;
        self.resize_height = height;
        Ok(())
    }

    /// Disable the resize stage, keeping the last target size.
    pub const fn disable_resize(&mut self) {
        self.resize = false;
    }

    /// Choose the resampling filter for the resize stage.
    pub const fn set_resize_filter(&mut self, filter: ResizeFilter) {
        self.resize_filter = filter;
    }

    /// Return every knob to its identity value.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Unvalidated serde shape of [`PipelineParameters`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
struct RawParameters {
    blur_radius: u32,
    saturation_delta: i32,
    contrast_delta: i32,
    sharpen_strength: u32,
    grayscale: bool,
    resize: bool,
    resize_width: u32,
    resize_height: u32,
    resize_filter: ResizeFilter,
}

impl Default for RawParameters {
    fn default() -> Self {
        PipelineParameters::default().into()
    }
}

impl From<PipelineParameters> for RawParameters {
    fn from(p: PipelineParameters) -> Self {
        Self {
            blur_radius: p.blur_radius,
            saturation_delta: p.saturation_delta,
            contrast_delta: p.contrast_delta,
            sharpen_strength: p.sharpen_strength,
            grayscale: p.grayscale,
            resize: p.resize,
            resize_width: p.resize_width,
            resize_height: p.resize_height,
            resize_filter: p.resize_filter,
        }
    }
}

impl TryFrom<RawParameters> for PipelineParameters {
    type Error = PipelineError;

    fn try_from(raw: RawParameters) -> Result<Self, Self::Error> {
        let mut p = Self::default();
        p.set_blur_radius(raw.blur_radius)?;
        p.set_saturation_delta(raw.saturation_delta)?;
        p.set_contrast_delta(raw.contrast_delta)?;
        p.set_sharpen_strength(raw.sharpen_strength)?;
        p.set_grayscale(raw.grayscale);
        p.set_resize(raw.resize_width, raw.resize_height)?;
        p.resize = raw.resize;
        p.set_resize_filter(raw.resize_filter);
        Ok(p)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        let p = PipelineParameters::default();
        assert!(p.is_identity());
        assert_eq!(p.resize_target(), (100, 100));
        assert_eq!(p.resize_filter(), ResizeFilter::Triangle);
    }

    #[test]
    fn setters_accept_bounds() {
        let mut p = PipelineParameters::default();
        p.set_blur_radius(MAX_BLUR_RADIUS).unwrap();
        p.set_saturation_delta(-100).unwrap();
        p.set_contrast_delta(100).unwrap();
        p.set_sharpen_strength(MAX_SHARPEN_STRENGTH).unwrap();
        assert_eq!(p.blur_radius(), 20);
        assert_eq!(p.saturation_delta(), -100);
        assert_eq!(p.contrast_delta(), 100);
        assert_eq!(p.sharpen_strength(), 20);
        assert!(!p.is_identity());
    }

    #[test]
    fn rejected_value_leaves_record_unchanged() {
        let mut p = PipelineParameters::default();
        p.set_contrast_delta(-40).unwrap();
        let before = p;

        let err = p.set_contrast_delta(101).unwrap_err();
        assert_eq!(
            err,
            PipelineError::ParameterOutOfRange {
                name: "contrast_delta",
                value: 101,
                min: -100,
                max: 100,
            }
        );
        assert!(p.set_saturation_delta(-101).is_err());
        assert!(p.set_sharpen_strength(21).is_err());
        assert!(p.set_blur_radius(21).is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn resize_rejects_zero_dimension() {
        let mut p = PipelineParameters::default();
        assert_eq!(
            p.set_resize(0, 50),
            Err(PipelineError::InvalidDimensions {
                width: 0,
                height: 50
            })
        );
        assert!(!p.resize_enabled());
        p.set_resize(640, 480).unwrap();
        assert!(p.resize_enabled());
        assert_eq!(p.resize_target(), (640, 480));
        p.disable_resize();
        assert!(!p.resize_enabled());
        assert_eq!(p.resize_target(), (640, 480));
    }

    #[test]
    fn toggle_grayscale_flips() {
        let mut p = PipelineParameters::default();
        assert!(p.toggle_grayscale());
        assert!(p.grayscale());
        assert!(!p.toggle_grayscale());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut p = PipelineParameters::default();
        p.set_blur_radius(3).unwrap();
        p.set_grayscale(true);
        p.set_resize(10, 10).unwrap();
        p.reset();
        assert_eq!(p, PipelineParameters::default());
    }

    #[test]
    fn json_round_trip() {
        let mut p = PipelineParameters::default();
        p.set_sharpen_strength(4).unwrap();
        p.set_resize(32, 16).unwrap();
        p.set_resize_filter(ResizeFilter::Lanczos3);
        let json = serde_json::to_string(&p).unwrap();
        let back: PipelineParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn json_missing_fields_take_defaults() {
        let p: PipelineParameters = serde_json::from_str(r#"{"contrast_delta": 25}"#).unwrap();
        assert_eq!(p.contrast_delta(), 25);
        assert_eq!(p.blur_radius(), 0);
        assert_eq!(p.resize_target(), (100, 100));
    }

    #[test]
    fn json_out_of_range_rejected() {
        let result: Result<PipelineParameters, _> =
            serde_json::from_str(r#"{"saturation_delta": 250}"#);
        assert!(result.is_err());

        let result: Result<PipelineParameters, _> =
            serde_json::from_str(r#"{"resize": true, "resize_width": 0}"#);
        assert!(result.is_err());
    }
}
