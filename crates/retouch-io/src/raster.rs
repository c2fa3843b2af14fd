//! Loading and saving raster files.
//!
//! `.ppm` paths go through the crate's own [`crate::ppm`] codec; every
//! other extension is handed to the [`image`] crate. Loaded images are
//! always returned as [`PixelLayout::Rgb`] with any alpha dropped.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, ImageEncoder, RgbImage};
use retouch_pipeline::color::to_rgb;
use retouch_pipeline::{CompressionReport, PixelBuffer, PixelLayout};
use tracing::{debug, info};

use crate::error::IoError;
use crate::ppm;

/// Quality used for the JPEG size comparison when none is given.
pub const DEFAULT_JPEG_QUALITY: u8 = 100;

fn is_ppm(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ppm"))
}

/// Decode an encoded image held in memory into an RGB buffer.
///
/// The format is sniffed from the content, so a file whose extension
/// lies still decodes.
///
/// # Errors
///
/// Returns [`IoError::ImageCodec`] if the bytes are not a supported
/// image, or [`IoError::Pipeline`] if the decoded image is empty.
pub fn decode_image(bytes: &[u8]) -> Result<PixelBuffer, IoError> {
    let img = image::load_from_memory(bytes)?;
    rgb_image_to_buffer(img.to_rgb8())
}

fn rgb_image_to_buffer(img: RgbImage) -> Result<PixelBuffer, IoError> {
    let (width, height) = img.dimensions();
    Ok(PixelBuffer::new(
        width,
        height,
        PixelLayout::Rgb,
        img.into_raw(),
    )?)
}

/// Load an image file into an RGB buffer.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be opened,
/// [`IoError::MalformedPpm`] for a bad `.ppm` file and
/// [`IoError::ImageCodec`] for anything the `image` crate rejects.
pub fn load(path: &Path) -> Result<PixelBuffer, IoError> {
    let buffer = if is_ppm(path) {
        ppm::read(BufReader::new(File::open(path)?))?
    } else {
        decode_image(&fs::read(path)?)?
    };
    info!(
        path = %path.display(),
        size = %buffer.dimensions(),
        "loaded image"
    );
    Ok(buffer)
}

/// Save `buffer` to `path`, choosing the format from the extension.
///
/// Gray buffers are saved as single-channel images where the format
/// allows; PPM is always RGB.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be created and
/// [`IoError::ImageCodec`] for an unknown extension or an encoder
/// failure.
pub fn save(path: &Path, buffer: &PixelBuffer) -> Result<(), IoError> {
    if is_ppm(path) {
        ppm::write(BufWriter::new(File::create(path)?), buffer)?;
    } else {
        match buffer.layout() {
            PixelLayout::Gray => {
                let img = GrayImage::from_raw(
                    buffer.width(),
                    buffer.height(),
                    buffer.samples().to_vec(),
                )
                .ok_or_else(|| size_mismatch(buffer))?;
                img.save(path)?;
            }
            PixelLayout::Rgb | PixelLayout::Bgr => {
                let rgb = to_rgb(buffer);
                let img = RgbImage::from_raw(rgb.width(), rgb.height(), rgb.into_samples())
                    .ok_or_else(|| size_mismatch(buffer))?;
                img.save(path)?;
            }
        }
    }
    info!(path = %path.display(), size = %buffer.dimensions(), "saved image");
    Ok(())
}

fn size_mismatch(buffer: &PixelBuffer) -> IoError {
    IoError::Pipeline(retouch_pipeline::PipelineError::SampleCountMismatch {
        expected: buffer.width() as usize * buffer.height() as usize * buffer.channels(),
        actual: buffer.byte_len(),
    })
}

/// Encode `buffer` as a JPEG at `quality` (1-100).
///
/// # Errors
///
/// Returns [`IoError::ImageCodec`] if encoding fails.
pub fn encode_jpeg(buffer: &PixelBuffer, quality: u8) -> Result<Vec<u8>, IoError> {
    let quality = quality.clamp(1, 100);
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    match buffer.layout() {
        PixelLayout::Gray => encoder.write_image(
            buffer.samples(),
            buffer.width(),
            buffer.height(),
            image::ExtendedColorType::L8,
        )?,
        PixelLayout::Rgb | PixelLayout::Bgr => {
            let rgb = to_rgb(buffer);
            encoder.write_image(
                rgb.samples(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )?;
        }
    }
    debug!(quality, bytes = out.len(), "encoded JPEG");
    Ok(out)
}

/// Size comparison between the raw samples of `buffer` and a JPEG
/// encoding at `quality`.
///
/// # Errors
///
/// Same as [`encode_jpeg`].
pub fn jpeg_report(buffer: &PixelBuffer, quality: u8) -> Result<CompressionReport, IoError> {
    let encoded = encode_jpeg(buffer, quality)?;
    Ok(CompressionReport::new(buffer.byte_len(), encoded.len()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ppm_extension_detected_case_insensitively() {
        assert!(is_ppm(Path::new("a/b/photo.PPM")));
        assert!(is_ppm(Path::new("photo.ppm")));
        assert!(!is_ppm(Path::new("photo.png")));
        assert!(!is_ppm(Path::new("ppm")));
    }

    #[test]
    fn empty_bytes_rejected() {
        assert!(matches!(decode_image(&[]), Err(IoError::ImageCodec(_))));
    }

    #[test]
    fn corrupt_bytes_rejected() {
        let result = decode_image(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(IoError::ImageCodec(_))));
    }

    #[test]
    fn png_with_alpha_decodes_to_rgb() {
        let rgba = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 0]));
        let mut png = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png)
            .write_image(rgba.as_raw(), 3, 2, image::ExtendedColorType::Rgba8)
            .unwrap();

        let buf = decode_image(&png).unwrap();
        assert_eq!(buf.layout(), PixelLayout::Rgb);
        assert_eq!((buf.width(), buf.height()), (3, 2));
        assert_eq!(buf.pixel(2, 1), Some(&[10, 20, 30][..]));
    }

    #[test]
    fn load_sniffs_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mislabelled.jpg");
        let rgb = RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]));
        let mut png = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png)
            .write_image(rgb.as_raw(), 2, 2, image::ExtendedColorType::Rgb8)
            .unwrap();
        fs::write(&path, &png).unwrap();

        let buf = load(&path).unwrap();
        assert_eq!(buf.pixel(1, 1), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn jpeg_report_counts_raw_bytes() {
        let buf = PixelBuffer::filled(16, 16, PixelLayout::Rgb, 90).unwrap();
        let report = jpeg_report(&buf, DEFAULT_JPEG_QUALITY).unwrap();
        assert_eq!(report.original_bytes, 768);
        assert!(report.encoded_bytes > 0);

        let jpeg = encode_jpeg(&buf, 50).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
