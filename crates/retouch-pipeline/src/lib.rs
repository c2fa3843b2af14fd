//! retouch-pipeline: Pure image adjustment pipeline (sans-IO).
//!
//! Applies an ordered set of independently toggled pixel transforms to
//! an in-memory raster:
//! blur -> saturation -> contrast -> sharpen -> grayscale -> resize.
//!
//! Every run starts again from the untouched original, so the result is
//! a pure function of `(original, parameters)`. The crate also carries a
//! lossless run-length codec over a buffer's raw sample stream.
//!
//! This crate has **no I/O dependencies** -- it operates on owned
//! buffers and returns structured data. File formats, threads and the
//! command line live in `retouch-io` and `retouch`.

pub mod blur;
pub mod color;
pub mod contrast;
pub mod convolve;
pub mod diagnostics;
pub mod grayscale;
pub mod params;
pub mod pipeline;
pub mod resize;
pub mod rle;
pub mod saturation;
pub mod sharpen;
pub mod stage;
pub mod types;

pub use diagnostics::{Clock, PipelineDiagnostics, StageDiagnostics, apply_with_diagnostics};
pub use params::PipelineParameters;
pub use pipeline::{Pipeline, apply, apply_in_order};
pub use resize::ResizeFilter;
pub use rle::{CompressedStream, CompressionReport, Run};
pub use stage::Stage;
pub use types::{Dimensions, PipelineError, PixelBuffer, PixelLayout};
