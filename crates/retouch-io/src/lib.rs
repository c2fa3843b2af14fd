//! retouch-io: Filesystem, codec and threading edges for retouch.
//!
//! Reads and writes PPM files with a built-in codec, delegates other
//! raster formats to the `image` crate, stores run-length encoded
//! images in a small container format and runs the pipeline on a
//! background thread.

pub mod container;
pub mod error;
pub mod ppm;
pub mod raster;
pub mod worker;

pub use container::RleContainer;
pub use error::IoError;
pub use raster::{jpeg_report, load, save};
pub use worker::{PipelineWorker, WorkerResult};
