//! Integration test: push images through the filesystem in every format
//! the crate writes, with and without the pipeline in between.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use retouch_io::{IoError, container, load, ppm, save};
use retouch_pipeline::{PipelineParameters, PixelBuffer, PixelLayout, apply};
use tempfile::tempdir;

#[allow(clippy::cast_possible_truncation)]
fn gradient(width: u32, height: u32) -> PixelBuffer {
    let mut samples = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            samples.extend_from_slice(&[(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8]);
        }
    }
    PixelBuffer::new(width, height, PixelLayout::Rgb, samples).unwrap()
}

#[test]
fn ppm_file_is_byte_exact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.ppm");
    let img = gradient(5, 3);

    save(&path, &img).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"P6\n5 3\n255\n"));
    assert_eq!(bytes.len(), ppm::header(5, 3).len() + 45);

    assert_eq!(load(&path).unwrap(), img);
}

#[test]
fn png_file_round_trip_is_lossless() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.png");
    let img = gradient(7, 4);

    save(&path, &img).unwrap();
    assert_eq!(load(&path).unwrap(), img);
}

#[test]
fn gray_buffer_loads_back_as_rgb() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gray.png");
    let gray = PixelBuffer::new(2, 1, PixelLayout::Gray, vec![12, 200]).unwrap();

    save(&path, &gray).unwrap();
    let back = load(&path).unwrap();
    assert_eq!(back.layout(), PixelLayout::Rgb);
    assert_eq!(back.samples(), [12, 12, 12, 200, 200, 200]);
}

#[test]
fn rle_container_round_trip_after_processing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.rle");

    let mut params = PipelineParameters::default();
    params.set_grayscale(true);
    params.set_resize(10, 10).unwrap();
    let processed = apply(&gradient(20, 20), &params).unwrap();

    let report = container::write_file(&path, &processed).unwrap();
    assert_eq!(report.original_bytes, 300);
    // Gray-replicated pixels repeat each luminance value three times.
    assert!(report.encoded_bytes <= 200);

    assert_eq!(container::read_file(&path).unwrap(), processed);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let result = load(&dir.path().join("absent.ppm"));
    assert!(matches!(result, Err(IoError::Io(_))));
}

#[test]
fn corrupt_ppm_file_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.ppm");
    std::fs::write(&path, b"P6\n4 4\n255\n\x01\x02").unwrap();
    assert!(matches!(load(&path), Err(IoError::MalformedPpm(_))));
}

#[test]
fn unknown_extension_rejected_on_save() {
    let dir = tempdir().unwrap();
    let result = save(&dir.path().join("out.xyz"), &gradient(2, 2));
    assert!(matches!(result, Err(IoError::ImageCodec(_))));
}
