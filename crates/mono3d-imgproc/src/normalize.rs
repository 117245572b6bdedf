//! Image normalization operations applied before feeding images to a network.

use mono3d_image::{Image, ImageError};

use crate::parallel;

/// Normalize an image using per-channel mean and standard deviation.
///
/// Applies the transformation `(pixel - mean) / std` independently to each channel.
///
/// # Arguments
///
/// * `src` - The input image with shape (H, W, C).
/// * `dst` - The output normalized image with shape (H, W, C).
/// * `mean` - Array of mean values, one per channel.
/// * `std` - Array of standard deviation values, one per channel.
///
/// # Example
///
/// ```
/// use mono3d_image::{Image, ImageSize};
/// use mono3d_imgproc::normalize::normalize_mean_std;
///
/// let image = Image::<f32, 1>::from_size_val(
///     ImageSize { width: 100, height: 100 },
///     128.0,
/// ).unwrap();
///
/// let mut normalized = Image::<f32, 1>::from_size_val(image.size(), 0.0).unwrap();
///
/// normalize_mean_std(&image, &mut normalized, &[127.5], &[50.0]).unwrap();
/// ```
///
/// # Errors
///
/// Returns [`ImageError::InvalidImageSize`] if `src` and `dst` have different dimensions.
pub fn normalize_mean_std<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    mean: &[f32; C],
    std: &[f32; C],
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        src_pixel
            .iter()
            .zip(dst_pixel.iter_mut())
            .zip(mean.iter())
            .zip(std.iter())
            .for_each(|(((&src_val, dst_val), &mean_val), &std_val)| {
                *dst_val = (src_val - mean_val) / std_val;
            });
    });

    Ok(())
}
