//! Error type shared by every file and worker operation.

use retouch_pipeline::PipelineError;

/// Errors from reading, writing or processing images outside the core.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The filesystem or a stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The `image` crate could not decode or encode a file.
    #[error("image codec error: {0}")]
    ImageCodec(#[from] image::ImageError),

    /// A PPM header or payload did not parse.
    #[error("malformed PPM: {0}")]
    MalformedPpm(String),

    /// A run-length container did not parse.
    #[error("malformed RLE container: {0}")]
    MalformedContainer(String),

    /// The pipeline core rejected the data.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The background worker thread is gone.
    #[error("pipeline worker disconnected")]
    WorkerDisconnected,
}
