//! Lossless run-length coding of a buffer's raw sample stream.
//!
//! The stream is treated as a flat byte sequence with no knowledge of
//! pixel boundaries: a run may span channels, pixels and rows. Each run
//! is a `(value, len)` pair with `len` in `1..=255`; longer runs are
//! split across consecutive pairs with the same value.
//!
//! Geometry is not part of the stream. [`decode`] needs the width,
//! height and layout supplied separately (the container format in
//! `retouch-io` stores them in its header).

use std::fmt;

use tracing::debug;

use crate::types::{Dimensions, PipelineError, PixelBuffer, PixelLayout};

/// Longest run a single pair can describe.
pub const MAX_RUN: u8 = u8::MAX;

/// One `(value, length)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// Repeated sample value.
    pub value: u8,
    /// Repetition count, never zero.
    pub len: u8,
}

/// An ordered sequence of runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressedStream {
    runs: Vec<Run>,
}

impl CompressedStream {
    /// The runs in stream order.
    #[must_use]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// `true` when the stream holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Size of the serialized stream (two bytes per pair).
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.runs.len() * 2
    }

    /// Total number of samples the stream expands to.
    #[must_use]
    pub fn expanded_len(&self) -> usize {
        self.runs.iter().map(|r| usize::from(r.len)).sum()
    }

    /// Serialize as `value, len, value, len, ...`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.runs.iter().flat_map(|r| [r.value, r.len]).collect()
    }

    /// Parse the pair layout written by [`CompressedStream::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::CorruptStream`] for an odd byte count or
    /// a zero-length run.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        if bytes.len() % 2 != 0 {
            return Err(PipelineError::CorruptStream(format!(
                "odd byte count {}",
                bytes.len()
            )));
        }
        let runs = bytes
            .iter()
            .step_by(2)
            .zip(bytes.iter().skip(1).step_by(2))
            .enumerate()
            .map(|(i, (&value, &len))| {
                if len == 0 {
                    Err(PipelineError::CorruptStream(format!(
                        "zero-length run at pair {i}"
                    )))
                } else {
                    Ok(Run { value, len })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { runs })
    }
}

/// Encode a raw sample stream.
#[must_use]
pub fn encode_samples(samples: &[u8]) -> CompressedStream {
    let mut runs: Vec<Run> = Vec::new();
    for &value in samples {
        match runs.last_mut() {
            Some(run) if run.value == value && run.len < MAX_RUN => run.len += 1,
            _ => runs.push(Run { value, len: 1 }),
        }
    }
    CompressedStream { runs }
}

/// Encode the sample stream of `buffer`.
#[must_use]
pub fn encode(buffer: &PixelBuffer) -> CompressedStream {
    let stream = encode_samples(buffer.samples());
    debug!(
        input = buffer.byte_len(),
        pairs = stream.len(),
        "run-length encoded"
    );
    stream
}

/// Expand `stream` into a buffer of the given geometry.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidDimensions`] for a zero dimension and
/// [`PipelineError::CorruptStream`] when the expanded length is not
/// exactly `width * height * channels`.
pub fn decode(
    stream: &CompressedStream,
    width: u32,
    height: u32,
    layout: PixelLayout,
) -> Result<PixelBuffer, PipelineError> {
    let dimensions = Dimensions { width, height };
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidDimensions { width, height });
    }
    let expected = usize::try_from(dimensions.pixel_count())
        .ok()
        .and_then(|n| n.checked_mul(layout.channels()))
        .ok_or(PipelineError::InvalidDimensions { width, height })?;

    let actual = stream.expanded_len();
    if actual != expected {
        return Err(PipelineError::CorruptStream(format!(
            "stream expands to {actual} samples, {dimensions} {layout} needs {expected}"
        )));
    }

    let mut samples = Vec::with_capacity(expected);
    for run in &stream.runs {
        samples.extend(std::iter::repeat_n(run.value, usize::from(run.len)));
    }
    Ok(PixelBuffer::from_parts(dimensions, layout, samples))
}

/// Size comparison between a raw sample stream and its encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionReport {
    /// Raw sample bytes.
    pub original_bytes: usize,
    /// Encoded bytes.
    pub encoded_bytes: usize,
    /// `encoded / original * 100`.
    pub ratio_percent: f64,
}

impl CompressionReport {
    /// Compare two byte counts.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(original_bytes: usize, encoded_bytes: usize) -> Self {
        let ratio_percent = if original_bytes == 0 {
            0.0
        } else {
            encoded_bytes as f64 / original_bytes as f64 * 100.0
        };
        Self {
            original_bytes,
            encoded_bytes,
            ratio_percent,
        }
    }

    /// Report for `stream` as the encoding of `buffer`.
    #[must_use]
    pub fn for_stream(buffer: &PixelBuffer, stream: &CompressedStream) -> Self {
        Self::new(buffer.byte_len(), stream.encoded_len())
    }

    /// `true` when the encoding is larger than the input.
    #[must_use]
    pub fn expands(&self) -> bool {
        self.encoded_bytes > self.original_bytes
    }
}

impl fmt::Display for CompressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} bytes ({:.2}%)",
            self.original_bytes, self.encoded_bytes, self.ratio_percent
        )?;
        if self.expands() {
            f.write_str(" [expanded]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn long_run_splits_at_255() {
        let stream = encode_samples(&[7; 300]);
        assert_eq!(
            stream.runs(),
            [Run { value: 7, len: 255 }, Run { value: 7, len: 45 }]
        );
        assert_eq!(stream.expanded_len(), 300);
    }

    #[test]
    fn run_spans_pixel_boundaries() {
        let buf = PixelBuffer::filled(2, 1, PixelLayout::Rgb, 10).unwrap();
        let stream = encode(&buf);
        assert_eq!(stream.runs(), [Run { value: 10, len: 6 }]);
        assert_eq!(stream.to_bytes(), [10, 6]);

        let back = decode(&stream, 2, 1, PixelLayout::Rgb).unwrap();
        assert_eq!(back.samples(), [10; 6]);
        assert_eq!(back, buf);
    }

    #[test]
    fn empty_input_encodes_to_empty_stream() {
        assert!(encode_samples(&[]).is_empty());
    }

    #[test]
    fn uniform_buffer_round_trip() {
        let buf = PixelBuffer::filled(64, 64, PixelLayout::Rgb, 200).unwrap();
        let stream = encode(&buf);
        // 12288 samples / 255 per pair, rounded up.
        assert_eq!(stream.len(), 49);
        let back = decode(&stream, 64, 64, PixelLayout::Rgb).unwrap();
        assert_eq!(back, buf);
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn alternating_buffer_round_trip_and_expands() {
        let samples: Vec<u8> = (0..48u32).map(|i| (i % 2) as u8 * 255).collect();
        let buf = PixelBuffer::new(4, 4, PixelLayout::Rgb, samples).unwrap();
        let stream = encode(&buf);
        assert_eq!(stream.len(), 48);

        let report = CompressionReport::for_stream(&buf, &stream);
        assert_eq!(report.original_bytes, 48);
        assert_eq!(report.encoded_bytes, 96);
        assert!(report.expands());
        assert_eq!(report.to_string(), "48 -> 96 bytes (200.00%) [expanded]");

        assert_eq!(decode(&stream, 4, 4, PixelLayout::Rgb).unwrap(), buf);
    }

    #[test]
    fn decode_rejects_length_mismatch() {
        let stream = encode_samples(&[1; 11]);
        let result = decode(&stream, 2, 2, PixelLayout::Rgb);
        assert!(matches!(result, Err(PipelineError::CorruptStream(_))));
    }

    #[test]
    fn decode_rejects_zero_dimension() {
        let stream = encode_samples(&[1; 3]);
        assert_eq!(
            decode(&stream, 0, 1, PixelLayout::Rgb),
            Err(PipelineError::InvalidDimensions {
                width: 0,
                height: 1
            })
        );
    }

    #[test]
    fn bytes_round_trip() {
        let stream = encode_samples(&[1, 1, 2, 3, 3, 3]);
        let bytes = stream.to_bytes();
        assert_eq!(bytes, [1, 2, 2, 1, 3, 3]);
        assert_eq!(CompressedStream::from_bytes(&bytes).unwrap(), stream);
    }

    #[test]
    fn from_bytes_rejects_malformed_input() {
        assert!(matches!(
            CompressedStream::from_bytes(&[1, 2, 3]),
            Err(PipelineError::CorruptStream(_))
        ));
        assert!(matches!(
            CompressedStream::from_bytes(&[1, 2, 3, 0]),
            Err(PipelineError::CorruptStream(_))
        ));
    }

    #[test]
    fn report_formats_two_decimals() {
        let report = CompressionReport::new(300, 4);
        assert_eq!(report.to_string(), "300 -> 4 bytes (1.33%)");
        assert!(!report.expands());
    }
}
