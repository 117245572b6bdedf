//! Photometric perturbations on 8-bit-range float RGB images.
//!
//! All operations work in place on `Image<f32, 3>` holding values in `[0, 255]` and clamp
//! their output back into that range, so chained operations behave like successive
//! 8-bit enhancement passes.

use mono3d_image::Image;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::parallel;

const MAX_VALUE: f32 = 255.0;

/// Errors raised by the photometric operations.
#[derive(thiserror::Error, Debug)]
pub enum EnhanceError {
    /// The noise parameters do not describe a valid normal distribution.
    #[error("invalid noise distribution: {0}")]
    InvalidNoise(#[from] rand_distr::NormalError),
}

/// Multiplicative factors applied by [`color_jitter`], in application order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorJitterFactors {
    /// 0 gives a gray image, 1 keeps the input.
    pub saturation: f32,
    /// 0 gives a black image, 1 keeps the input.
    pub brightness: f32,
    /// 0 gives a uniform image at the mean luma, 1 keeps the input.
    pub contrast: f32,
    /// 0 gives a smoothed image, 1 keeps the input.
    pub sharpness: f32,
}

impl Default for ColorJitterFactors {
    fn default() -> Self {
        Self {
            saturation: 1.0,
            brightness: 1.0,
            contrast: 1.0,
            sharpness: 1.0,
        }
    }
}

#[inline]
fn luma(pixel: &[f32]) -> f32 {
    0.299 * pixel[0] + 0.587 * pixel[1] + 0.114 * pixel[2]
}

#[inline]
fn blend(degenerate: f32, value: f32, factor: f32) -> f32 {
    (degenerate + factor * (value - degenerate)).clamp(0.0, MAX_VALUE)
}

/// Add independent Gaussian noise to every sample of the image.
///
/// # Arguments
///
/// * `image` - The image to perturb in place.
/// * `mean` - Mean of the additive noise.
/// * `std` - Standard deviation of the additive noise.
/// * `rng` - The random source.
pub fn add_gaussian_noise<const C: usize>(
    image: &mut Image<f32, C>,
    mean: f32,
    std: f32,
    rng: &mut impl Rng,
) -> Result<(), EnhanceError> {
    let normal = Normal::new(mean, std)?;

    for v in image.as_slice_mut() {
        *v = (*v + normal.sample(&mut *rng)).clamp(0.0, MAX_VALUE);
    }

    Ok(())
}

/// Blend every pixel with its luma.
pub fn adjust_saturation(image: &mut Image<f32, 3>, factor: f32) {
    parallel::par_iter_pixels_mut(image, |pixel| {
        let gray = luma(pixel);
        pixel.iter_mut().for_each(|v| *v = blend(gray, *v, factor));
    });
}

/// Scale every sample by `factor`.
pub fn adjust_brightness(image: &mut Image<f32, 3>, factor: f32) {
    parallel::par_iter_rows_val_mut(image, |v| *v = blend(0.0, *v, factor));
}

/// Blend every sample with the rounded mean luma of the image.
pub fn adjust_contrast(image: &mut Image<f32, 3>, factor: f32) {
    let num_pixels = image.width() * image.height();
    if num_pixels == 0 {
        return;
    }

    let mean = (image.as_slice().chunks_exact(3).map(luma).sum::<f32>() / num_pixels as f32).round();

    parallel::par_iter_rows_val_mut(image, |v| *v = blend(mean, *v, factor));
}

/// Blend the image with a 3x3 smoothed copy of itself; border pixels are kept as-is.
pub fn adjust_sharpness(image: &mut Image<f32, 3>, factor: f32) {
    let (cols, rows) = (image.cols(), image.rows());
    if cols < 3 || rows < 3 {
        return;
    }

    let src = image.as_slice().to_vec();
    let dst = image.as_slice_mut();

    for y in 1..rows - 1 {
        for x in 1..cols - 1 {
            for c in 0..3 {
                let mut acc = 0.0;
                for dy in 0..3 {
                    for dx in 0..3 {
                        let weight = if dx == 1 && dy == 1 { 5.0 } else { 1.0 };
                        acc += weight * src[((y + dy - 1) * cols + (x + dx - 1)) * 3 + c];
                    }
                }
                let idx = (y * cols + x) * 3 + c;
                dst[idx] = blend(acc / 13.0, src[idx], factor);
            }
        }
    }
}

/// Apply saturation, brightness, contrast and sharpness changes in sequence.
///
/// # Example
///
/// ```
/// use mono3d_image::{Image, ImageSize};
/// use mono3d_imgproc::enhance::{color_jitter, ColorJitterFactors};
///
/// let mut image = Image::<f32, 3>::from_size_val(ImageSize { width: 4, height: 4 }, 100.0).unwrap();
/// let factors = ColorJitterFactors { brightness: 2.0, ..Default::default() };
///
/// color_jitter(&mut image, &factors);
/// assert!(image.as_slice().iter().all(|&v| v == 200.0));
/// ```
pub fn color_jitter(image: &mut Image<f32, 3>, factors: &ColorJitterFactors) {
    adjust_saturation(image, factors.saturation);
    adjust_brightness(image, factors.brightness);
    adjust_contrast(image, factors.contrast);
    adjust_sharpness(image, factors.sharpness);
}
