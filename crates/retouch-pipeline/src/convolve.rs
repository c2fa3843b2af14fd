//! Convolution kernels shared by the blur and sharpen stages.
//!
//! The filtering itself is done by [`imageproc::filter::filter`], which
//! pads by repeating the edge sample (`aaa|abcd|ddd`), so a uniform image
//! stays uniform whatever the kernel size. Accumulation is `f32` and only
//! the final output is rounded and clamped to `u8`.

use image::{GrayImage, Luma, Pixel, Rgb, RgbImage};
use imageproc::definitions::Image;
use imageproc::kernel::Kernel as ImageKernel;

use crate::color::saturate_u8;
use crate::types::{PixelBuffer, PixelLayout};

/// A square convolution kernel stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    data: Vec<f32>,
    size: usize,
}

impl Kernel {
    /// Sigma used for a Gaussian of the given odd `size` when none is
    /// specified explicitly.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn default_sigma(size: usize) -> f32 {
        0.3f32.mul_add((size as f32 - 1.0).mul_add(0.5, -1.0), 0.8)
    }

    /// Normalized 1D Gaussian weights of length `size`.
    ///
    /// Even sizes are bumped to the next odd size so the kernel stays
    /// centered on the output sample.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    pub fn gaussian_1d(size: usize) -> Vec<f32> {
        let size = if size % 2 == 0 { size + 1 } else { size };
        let sigma = Self::default_sigma(size);
        let half = (size / 2) as i64;
        let two_sigma2 = 2.0 * sigma * sigma;

        let weights: Vec<f32> = (-half..=half)
            .map(|i| {
                let d = (i * i) as f32;
                (-d / two_sigma2).exp()
            })
            .collect();
        let sum: f32 = weights.iter().sum();
        weights.into_iter().map(|w| w / sum).collect()
    }

    /// 3×3 unsharp kernel: center `1 + 4a`, edge neighbours `-a`,
    /// corners zero. Weights sum to one.
    #[must_use]
    pub fn sharpen(amount: f32) -> Self {
        let center = 4.0f32.mul_add(amount, 1.0);
        #[rustfmt::skip]
        let data = vec![
            0.0, -amount, 0.0,
            -amount, center, -amount,
            0.0, -amount, 0.0,
        ];
        Self { data, size: 3 }
    }

    /// Side length.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Row-major weights.
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.data
    }
}

/// Kernel side length as the `u32` that `imageproc` kernels take.
#[allow(clippy::cast_possible_truncation)]
const fn side(len: usize) -> u32 {
    len as u32
}

/// Correlate `image` with `kernel`, keeping the accumulator as `f32`.
fn correlate_f32<P, F>(image: &Image<P>, kernel: ImageKernel<'_, f32>) -> Image<F>
where
    P: Pixel,
    f32: From<P::Subpixel>,
    F: Pixel<Subpixel = f32>,
{
    imageproc::filter::filter(image, kernel, |acc: f32| acc)
}

/// Correlate `image` with `kernel`, rounding and clamping back to `u8`.
fn correlate_u8<P, Q>(image: &Image<P>, kernel: ImageKernel<'_, f32>) -> Image<Q>
where
    P: Pixel,
    f32: From<P::Subpixel>,
    Q: Pixel<Subpixel = u8>,
{
    imageproc::filter::filter(image, kernel, saturate_u8)
}

/// Horizontal then vertical pass of the same 1D weights. The
/// intermediate image stays in `f32` so only the final result is
/// quantized.
fn separable_image<P, F>(image: &Image<P>, weights: &[f32]) -> Vec<u8>
where
    P: Pixel<Subpixel = u8>,
    F: Pixel<Subpixel = f32>,
{
    let len = side(weights.len());
    let horizontal: Image<F> = correlate_f32(image, ImageKernel::new(weights, len, 1));
    let vertical: Image<P> = correlate_u8(&horizontal, ImageKernel::new(weights, 1, len));
    vertical.into_raw()
}

/// Convolve every channel with `weights` horizontally, then vertically.
///
/// Samples outside the image repeat the nearest edge sample.
pub(crate) fn separable(buffer: &PixelBuffer, weights: &[f32]) -> PixelBuffer {
    let samples = match buffer.layout() {
        PixelLayout::Gray => {
            separable_image::<Luma<u8>, Luma<f32>>(&gray_image(buffer), weights)
        }
        // Filtering is per-channel, so BGR can ride through as RGB.
        PixelLayout::Rgb | PixelLayout::Bgr => {
            separable_image::<Rgb<u8>, Rgb<f32>>(&rgb_image(buffer), weights)
        }
    };
    buffer.with_samples(samples)
}

/// Convolve every channel with a full 2D kernel.
///
/// Samples outside the image repeat the nearest edge sample.
pub(crate) fn filter2d(buffer: &PixelBuffer, kernel: &Kernel) -> PixelBuffer {
    let size = side(kernel.size());
    let kernel = ImageKernel::new(kernel.weights(), size, size);
    let samples = match buffer.layout() {
        PixelLayout::Gray => {
            let out: GrayImage = correlate_u8(&gray_image(buffer), kernel);
            out.into_raw()
        }
        PixelLayout::Rgb | PixelLayout::Bgr => {
            let out: RgbImage = correlate_u8(&rgb_image(buffer), kernel);
            out.into_raw()
        }
    };
    buffer.with_samples(samples)
}

/// View a one-channel buffer as a [`GrayImage`].
fn gray_image(buffer: &PixelBuffer) -> GrayImage {
    let (w, samples) = (buffer.width() as usize, buffer.samples());
    GrayImage::from_fn(buffer.width(), buffer.height(), |x, y| {
        Luma([samples[y as usize * w + x as usize]])
    })
}

/// View a three-channel buffer as an [`RgbImage`], channel order as stored.
fn rgb_image(buffer: &PixelBuffer) -> RgbImage {
    let (w, samples) = (buffer.width() as usize, buffer.samples());
    RgbImage::from_fn(buffer.width(), buffer.height(), |x, y| {
        let i = (y as usize * w + x as usize) * 3;
        Rgb([samples[i], samples[i + 1], samples[i + 2]])
    })
}
