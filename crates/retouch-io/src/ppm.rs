//! Binary PPM (`P6`) reader and writer.
//!
//! Written files always start with exactly `P6\n<width> <height>\n255\n`
//! followed by `width * height * 3` RGB bytes. The reader is more
//! lenient: header tokens may be separated by any ASCII whitespace and
//! `#` comments run to the end of the line. Only a maxval of 255 is
//! accepted.

use std::io::{Read, Write};

use retouch_pipeline::color::to_rgb;
use retouch_pipeline::{PixelBuffer, PixelLayout};
use tracing::{debug, warn};

use crate::error::IoError;

const MAGIC: &[u8; 2] = b"P6";
const MAXVAL: u32 = 255;

/// The exact header written ahead of the pixel payload.
#[must_use]
pub fn header(width: u32, height: u32) -> String {
    format!("P6\n{width} {height}\n{MAXVAL}\n")
}

/// Serialize `buffer` as a binary PPM.
///
/// Gray and BGR buffers are converted to RGB first.
#[must_use = "returns the encoded bytes"]
pub fn encode(buffer: &PixelBuffer) -> Vec<u8> {
    let rgb = to_rgb(buffer);
    let head = header(rgb.width(), rgb.height());
    let mut out = Vec::with_capacity(head.len() + rgb.byte_len());
    out.extend_from_slice(head.as_bytes());
    out.extend_from_slice(rgb.samples());
    out
}

/// Write `buffer` as a binary PPM to `writer`.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the writer fails.
pub fn write<W: Write>(mut writer: W, buffer: &PixelBuffer) -> Result<(), IoError> {
    writer.write_all(&encode(buffer))?;
    writer.flush()?;
    Ok(())
}

/// Read a binary PPM from `reader` into an RGB buffer.
///
/// # Errors
///
/// Returns [`IoError::Io`] if reading fails, otherwise the same errors
/// as [`decode`].
pub fn read<R: Read>(mut reader: R) -> Result<PixelBuffer, IoError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode(&bytes)
}

/// Parse a binary PPM held in memory.
///
/// # Errors
///
/// Returns [`IoError::MalformedPpm`] for a bad magic number, a
/// non-numeric or zero dimension, a maxval other than 255 or a short
/// payload.
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer, IoError> {
    let mut header = HeaderCursor { bytes, pos: 0 };

    let magic = header.token()?;
    if magic != MAGIC {
        return Err(IoError::MalformedPpm(format!(
            "expected magic P6, found {:?}",
            String::from_utf8_lossy(magic)
        )));
    }
    let width = header.number("width")?;
    let height = header.number("height")?;
    let maxval = header.number("maxval")?;
    if width == 0 || height == 0 {
        return Err(IoError::MalformedPpm(format!(
            "zero dimension {width}x{height}"
        )));
    }
    if maxval != MAXVAL {
        return Err(IoError::MalformedPpm(format!(
            "unsupported maxval {maxval} (only {MAXVAL})"
        )));
    }

    // Exactly one whitespace byte separates the header from the raster.
    match bytes.get(header.pos) {
        Some(b) if b.is_ascii_whitespace() => header.pos += 1,
        _ => {
            return Err(IoError::MalformedPpm(
                "missing whitespace after maxval".to_owned(),
            ));
        }
    }

    let payload = &bytes[header.pos..];
    let needed = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| IoError::MalformedPpm(format!("{width}x{height} is too large")))?;
    if payload.len() < needed {
        return Err(IoError::MalformedPpm(format!(
            "payload has {} bytes, {width}x{height} needs {needed}",
            payload.len()
        )));
    }
    if payload.len() > needed {
        warn!(extra = payload.len() - needed, "ignoring trailing PPM data");
    }

    debug!(width, height, "decoded PPM");
    Ok(PixelBuffer::new(
        width,
        height,
        PixelLayout::Rgb,
        payload[..needed].to_vec(),
    )?)
}

/// Tokenizer over the whitespace- and comment-separated PPM header.
struct HeaderCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> HeaderCursor<'a> {
    fn skip_separators(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'#' {
                while let Some(&c) = self.bytes.get(self.pos) {
                    self.pos += 1;
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Result<&'a [u8], IoError> {
        self.skip_separators();
        let start = self.pos;
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_whitespace() || b == b'#' {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(IoError::MalformedPpm("truncated header".to_owned()));
        }
        Ok(&self.bytes[start..self.pos])
    }

    fn number(&mut self, what: &str) -> Result<u32, IoError> {
        let token = self.token()?;
        std::str::from_utf8(token)
            .ok()
            .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                IoError::MalformedPpm(format!(
                    "{what} is not a number: {:?}",
                    String::from_utf8_lossy(token)
                ))
            })
    }
}
