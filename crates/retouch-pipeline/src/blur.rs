//! Gaussian blur.
//!
//! The kernel size is derived from the radius as `2 * radius + 1`, which
//! is always odd and therefore centered on the output sample. The sigma
//! follows from the size (see [`Kernel::default_sigma`]). Each channel is
//! smoothed independently with a separable pass.

use tracing::trace;

use crate::convolve::{self, Kernel};
use crate::types::PixelBuffer;

/// Kernel side length for a blur radius.
#[must_use]
pub const fn kernel_size(radius: u32) -> usize {
    radius as usize * 2 + 1
}

/// Apply Gaussian blur with the given radius.
///
/// A radius of zero returns the buffer unchanged.
#[must_use = "returns the blurred buffer"]
pub fn gaussian_blur(buffer: &PixelBuffer, radius: u32) -> PixelBuffer {
    if radius == 0 {
        return buffer.clone();
    }

    let size = kernel_size(radius);
    trace!(radius, size, "gaussian blur");
    let weights = Kernel::gaussian_1d(size);
    convolve::separable(buffer, &weights)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::PixelLayout;

    /// A 10x10 grayscale image with a sharp black-to-white boundary at x=5.
    fn sharp_edge_image() -> PixelBuffer {
        let samples = (0..100)
            .map(|i| if i % 10 < 5 { 0 } else { 255 })
            .collect();
        PixelBuffer::new(10, 10, PixelLayout::Gray, samples).unwrap()
    }

    #[test]
    fn kernel_size_is_always_odd() {
        for radius in 0..10 {
            assert_eq!(kernel_size(radius) % 2, 1);
        }
        assert_eq!(kernel_size(3), 7);
    }

    #[test]
    fn zero_radius_returns_identical_image() {
        let img = sharp_edge_image();
        assert_eq!(gaussian_blur(&img, 0), img);
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = PixelBuffer::filled(17, 31, PixelLayout::Rgb, 40).unwrap();
        let blurred = gaussian_blur(&img, 2);
        assert_eq!(blurred.dimensions(), img.dimensions());
        assert_eq!(blurred.layout(), PixelLayout::Rgb);
    }

    #[test]
    fn blur_smooths_sharp_edge() {
        let blurred = gaussian_blur(&sharp_edge_image(), 2);

        let left_of_edge = blurred.pixel(4, 5).unwrap()[0];
        let right_of_edge = blurred.pixel(5, 5).unwrap()[0];
        assert!(
            left_of_edge > 0,
            "expected blur to raise left-of-edge above 0, got {left_of_edge}",
        );
        assert!(
            right_of_edge < 255,
            "expected blur to lower right-of-edge below 255, got {right_of_edge}",
        );
    }

    #[test]
    fn uniform_image_unchanged_by_blur() {
        let img = PixelBuffer::filled(10, 10, PixelLayout::Rgb, 128).unwrap();
        let blurred = gaussian_blur(&img, 3);
        assert_eq!(blurred, img);
    }

    #[test]
    fn radius_larger_than_image_is_safe() {
        let img = PixelBuffer::new(2, 1, PixelLayout::Gray, vec![0, 255]).unwrap();
        let blurred = gaussian_blur(&img, 20);
        assert_eq!(blurred.byte_len(), 2);
        let [a, b] = [blurred.samples()[0], blurred.samples()[1]];
        assert!(a > 0 && b < 255);
    }

    #[test]
    fn channels_blur_independently() {
        // Red edge on the left, constant green, zero blue.
        let mut samples = Vec::new();
        for x in 0..8 {
            samples.extend_from_slice(&[if x < 4 { 255 } else { 0 }, 90, 0]);
        }
        let img = PixelBuffer::new(8, 1, PixelLayout::Rgb, samples).unwrap();
        let blurred = gaussian_blur(&img, 1);
        for x in 0..8 {
            let p = blurred.pixel(x, 0).unwrap();
            assert_eq!(p[1], 90);
            assert_eq!(p[2], 0);
        }
    }
}
