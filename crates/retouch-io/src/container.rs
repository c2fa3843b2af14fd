//! On-disk container for run-length encoded images.
//!
//! The run-length stream itself carries no geometry, so the container
//! prefixes it with a fixed 14-byte header:
//!
//! | offset | size | field                                 |
//! |--------|------|---------------------------------------|
//! | 0      | 4    | magic `RTRL`                          |
//! | 4      | 1    | format version (`1`)                  |
//! | 5      | 4    | width, `u32` little-endian            |
//! | 9      | 4    | height, `u32` little-endian           |
//! | 13     | 1    | layout: `0` gray, `1` RGB, `2` BGR    |
//!
//! followed by the `(value, run)` byte pairs.

use std::fs;
use std::path::Path;

use retouch_pipeline::rle::{self, CompressedStream};
use retouch_pipeline::{CompressionReport, Dimensions, PixelBuffer, PixelLayout};
use tracing::info;

use crate::error::IoError;

/// Leading bytes of every container.
pub const MAGIC: [u8; 4] = *b"RTRL";
/// Current format version.
pub const VERSION: u8 = 1;
/// Size of the fixed header.
pub const HEADER_LEN: usize = 14;

const fn layout_tag(layout: PixelLayout) -> u8 {
    match layout {
        PixelLayout::Gray => 0,
        PixelLayout::Rgb => 1,
        PixelLayout::Bgr => 2,
    }
}

fn layout_from_tag(tag: u8) -> Result<PixelLayout, IoError> {
    match tag {
        0 => Ok(PixelLayout::Gray),
        1 => Ok(PixelLayout::Rgb),
        2 => Ok(PixelLayout::Bgr),
        other => Err(IoError::MalformedContainer(format!(
            "unknown layout tag {other}"
        ))),
    }
}

/// A run-length stream together with the geometry needed to expand it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RleContainer {
    /// Image size.
    pub dimensions: Dimensions,
    /// Channel arrangement.
    pub layout: PixelLayout,
    /// Encoded samples.
    pub stream: CompressedStream,
}

impl RleContainer {
    /// Encode `buffer`.
    #[must_use]
    pub fn encode(buffer: &PixelBuffer) -> Self {
        Self {
            dimensions: buffer.dimensions(),
            layout: buffer.layout(),
            stream: rle::encode(buffer),
        }
    }

    /// Expand back to a pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Pipeline`] wrapping
    /// [`retouch_pipeline::PipelineError::CorruptStream`] when the
    /// stream does not fill the declared geometry exactly.
    pub fn decode(&self) -> Result<PixelBuffer, IoError> {
        Ok(rle::decode(
            &self.stream,
            self.dimensions.width,
            self.dimensions.height,
            self.layout,
        )?)
    }

    /// Serialize header and pairs.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let pairs = self.stream.to_bytes();
        let mut out = Vec::with_capacity(HEADER_LEN + pairs.len());
        out.extend_from_slice(&MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&self.dimensions.width.to_le_bytes());
        out.extend_from_slice(&self.dimensions.height.to_le_bytes());
        out.push(layout_tag(self.layout));
        out.extend_from_slice(&pairs);
        out
    }

    /// Parse a serialized container.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MalformedContainer`] for a short header, bad
    /// magic, unknown version or layout tag, and [`IoError::Pipeline`]
    /// for a malformed pair stream.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IoError> {
        let Some((header, pairs)) = bytes.split_first_chunk::<HEADER_LEN>() else {
            return Err(IoError::MalformedContainer(format!(
                "{} bytes is shorter than the {HEADER_LEN}-byte header",
                bytes.len()
            )));
        };
        let [m0, m1, m2, m3, version, w0, w1, w2, w3, h0, h1, h2, h3, tag] = *header;
        if [m0, m1, m2, m3] != MAGIC {
            return Err(IoError::MalformedContainer("bad magic".to_owned()));
        }
        if version != VERSION {
            return Err(IoError::MalformedContainer(format!(
                "unsupported version {version}"
            )));
        }
        Ok(Self {
            dimensions: Dimensions {
                width: u32::from_le_bytes([w0, w1, w2, w3]),
                height: u32::from_le_bytes([h0, h1, h2, h3]),
            },
            layout: layout_from_tag(tag)?,
            stream: CompressedStream::from_bytes(pairs)?,
        })
    }

    /// Compression achieved against the raw sample stream, counting the
    /// header.
    #[must_use]
    pub fn report(&self) -> CompressionReport {
        let raw = self.dimensions.width as usize
            * self.dimensions.height as usize
            * self.layout.channels();
        CompressionReport::new(raw, HEADER_LEN + self.stream.encoded_len())
    }
}

/// Encode `buffer` and write the container to `path`.
///
/// Returns the size report for the raw pair stream, without the header.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be written.
pub fn write_file(path: &Path, buffer: &PixelBuffer) -> Result<CompressionReport, IoError> {
    let container = RleContainer::encode(buffer);
    fs::write(path, container.to_bytes())?;
    let report = CompressionReport::for_stream(buffer, &container.stream);
    info!(path = %path.display(), %report, "wrote RLE container");
    Ok(report)
}

/// Read and expand a container file.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be read, plus everything
/// [`RleContainer::from_bytes`] and [`RleContainer::decode`] return.
pub fn read_file(path: &Path) -> Result<PixelBuffer, IoError> {
    let bytes = fs::read(path)?;
    let buffer = RleContainer::from_bytes(&bytes)?.decode()?;
    info!(path = %path.display(), size = %buffer.dimensions(), "read RLE container");
    Ok(buffer)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use retouch_pipeline::PipelineError;

    use super::*;

    fn sample() -> PixelBuffer {
        PixelBuffer::new(2, 1, PixelLayout::Bgr, vec![10, 10, 10, 10, 10, 99]).unwrap()
    }

    #[test]
    fn header_layout() {
        let bytes = RleContainer::encode(&sample()).to_bytes();
        assert_eq!(&bytes[..4], b"RTRL");
        assert_eq!(bytes[4], 1);
        assert_eq!(&bytes[5..9], &[2, 0, 0, 0]);
        assert_eq!(&bytes[9..13], &[1, 0, 0, 0]);
        assert_eq!(bytes[13], 2);
        assert_eq!(&bytes[HEADER_LEN..], &[10, 5, 99, 1]);
    }

    #[test]
    fn bytes_round_trip() {
        let container = RleContainer::encode(&sample());
        let back = RleContainer::from_bytes(&container.to_bytes()).unwrap();
        assert_eq!(back, container);
        assert_eq!(back.decode().unwrap(), sample());
    }

    #[test]
    fn short_input_rejected() {
        assert!(matches!(
            RleContainer::from_bytes(b"RTRL\x01"),
            Err(IoError::MalformedContainer(_))
        ));
    }

    #[test]
    fn bad_magic_and_version_rejected() {
        let mut bytes = RleContainer::encode(&sample()).to_bytes();
        bytes[4] = 9;
        assert!(RleContainer::from_bytes(&bytes)
            .unwrap_err()
            .to_string()
            .contains("version"));
        bytes[0] = b'X';
        assert!(matches!(
            RleContainer::from_bytes(&bytes),
            Err(IoError::MalformedContainer(_))
        ));
    }

    #[test]
    fn unknown_layout_rejected() {
        let mut bytes = RleContainer::encode(&sample()).to_bytes();
        bytes[13] = 7;
        assert!(matches!(
            RleContainer::from_bytes(&bytes),
            Err(IoError::MalformedContainer(_))
        ));
    }

    #[test]
    fn truncated_stream_fails_to_decode() {
        let mut bytes = RleContainer::encode(&sample()).to_bytes();
        bytes.truncate(bytes.len() - 2);
        let container = RleContainer::from_bytes(&bytes).unwrap();
        assert!(matches!(
            container.decode(),
            Err(IoError::Pipeline(PipelineError::CorruptStream(_)))
        ));
    }

    #[test]
    fn report_includes_header() {
        let report = RleContainer::encode(&sample()).report();
        assert_eq!(report.original_bytes, 6);
        assert_eq!(report.encoded_bytes, HEADER_LEN + 4);
    }
}
