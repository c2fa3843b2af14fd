//! Pipeline orchestration.
//!
//! [`apply`] is a pure function of `(original, params)`: it always
//! starts from a fresh copy of the original and runs the enabled stages
//! in [`Stage::ORDER`]. Nothing carries over between calls, so repeating
//! a call with the same parameters yields byte-identical output.
//!
//! [`Pipeline`] wraps that function in an owned value holding the
//! pristine original, the current parameters and the derived processed
//! buffer:
//!
//! ```rust
//! # use retouch_pipeline::{Pipeline, PipelineError, PixelBuffer, PixelLayout};
//! # fn run() -> Result<(), PipelineError> {
//! let original = PixelBuffer::filled(64, 48, PixelLayout::Rgb, 120)?;
//! let mut pipeline = Pipeline::new(original);
//!
//! pipeline.update(|p| p.set_contrast_delta(25))?;
//! pipeline.update(|p| p.set_resize(32, 32))?;
//! assert_eq!(pipeline.processed().width(), 32);
//!
//! pipeline.restore();
//! assert_eq!(pipeline.processed(), pipeline.original());
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```

use tracing::{debug, trace};

use crate::params::PipelineParameters;
use crate::stage::Stage;
use crate::types::{PipelineError, PixelBuffer};

/// Run every enabled stage, in the fixed order, on a copy of `original`.
///
/// Disabled stages are skipped entirely rather than run as identity
/// transforms.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidDimensions`] if the resize stage is
/// handed a zero target (not reachable through validated parameters).
pub fn apply(
    original: &PixelBuffer,
    params: &PipelineParameters,
) -> Result<PixelBuffer, PipelineError> {
    apply_in_order(original, params, &Stage::ORDER)
}

/// Run the enabled stages from `order`, in that order.
///
/// [`apply`] is this with [`Stage::ORDER`]; other orders exist for
/// experimentation and for comparing orderings.
///
/// # Errors
///
/// Same as [`apply`].
pub fn apply_in_order(
    original: &PixelBuffer,
    params: &PipelineParameters,
    order: &[Stage],
) -> Result<PixelBuffer, PipelineError> {
    let mut current = original.clone();
    for &stage in order {
        if !stage.is_enabled(params) {
            continue;
        }
        trace!(%stage, "applying stage");
        current = stage.apply(&current, params)?;
    }
    Ok(current)
}

/// An editing session over one source image.
///
/// Owns the untouched original, the parameter record and the processed
/// result. The processed buffer is recomputed from the original every
/// time the parameters or the original change, and is only ever replaced
/// wholesale.
#[derive(Debug, Clone)]
pub struct Pipeline {
    original: PixelBuffer,
    params: PipelineParameters,
    processed: PixelBuffer,
}

impl Pipeline {
    /// Start a session with identity parameters.
    #[must_use]
    pub fn new(original: PixelBuffer) -> Self {
        let processed = original.clone();
        Self {
            original,
            params: PipelineParameters::default(),
            processed,
        }
    }

    /// Start a session with the given parameters already applied.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`apply`].
    pub fn with_params(
        original: PixelBuffer,
        params: PipelineParameters,
    ) -> Result<Self, PipelineError> {
        let processed = apply(&original, &params)?;
        Ok(Self {
            original,
            params,
            processed,
        })
    }

    /// The source image as loaded.
    #[must_use]
    pub const fn original(&self) -> &PixelBuffer {
        &self.original
    }

    /// The current parameter record.
    #[must_use]
    pub const fn params(&self) -> &PipelineParameters {
        &self.params
    }

    /// The result of applying the current parameters to the original.
    #[must_use]
    pub const fn processed(&self) -> &PixelBuffer {
        &self.processed
    }

    /// Consume the session and keep only the processed buffer.
    #[must_use]
    pub fn into_processed(self) -> PixelBuffer {
        self.processed
    }

    /// Change one or more parameters and recompute.
    ///
    /// `edit` runs against a copy of the parameters. If it fails, or the
    /// recompute fails, the session is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns whatever `edit` returns, or any error from [`apply`].
    pub fn update<F>(&mut self, edit: F) -> Result<&PixelBuffer, PipelineError>
    where
        F: FnOnce(&mut PipelineParameters) -> Result<(), PipelineError>,
    {
        let mut next = self.params;
        edit(&mut next)?;
        self.set_params(next)
    }

    /// Replace the whole parameter record and recompute.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`apply`]; the session is unchanged on
    /// error.
    pub fn set_params(
        &mut self,
        params: PipelineParameters,
    ) -> Result<&PixelBuffer, PipelineError> {
        let processed = apply(&self.original, &params)?;
        debug!(?params, output = %processed.dimensions(), "parameters updated");
        self.params = params;
        self.processed = processed;
        Ok(&self.processed)
    }

    /// Swap in a new source image and recompute with the current
    /// parameters.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`apply`]; the session is unchanged on
    /// error.
    pub fn set_original(&mut self, original: PixelBuffer) -> Result<&PixelBuffer, PipelineError> {
        let processed = apply(&original, &self.params)?;
        debug!(input = %original.dimensions(), "original replaced");
        self.original = original;
        self.processed = processed;
        Ok(&self.processed)
    }

    /// Reset every parameter to its identity value.
    ///
    /// The processed buffer becomes a copy of the original.
    pub fn restore(&mut self) -> &PixelBuffer {
        self.params.reset();
        self.processed = self.original.clone();
        debug!("parameters restored");
        &self.processed
    }
}
