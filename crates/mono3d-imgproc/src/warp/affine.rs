use mono3d_image::{Image, ImageError};

use crate::interpolation::{grid::meshgrid_from_fn, interpolate_pixel, InterpolationMode};
use crate::parallel;

/// Errors raised while estimating or applying affine transforms.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum WarpError {
    /// The source correspondences are collinear and admit no unique affine fit.
    #[error("degenerate point correspondences (determinant {0})")]
    DegenerateCorrespondences(f32),

    /// Error from the underlying image container.
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Inverts a 2x3 affine transformation matrix.
///
/// Arguments:
///
/// * `m` - The 2x3 affine transformation matrix.
///
/// Returns:
///
/// The inverted 2x3 affine transformation matrix.
pub fn invert_affine_transform(m: &[f32; 6]) -> [f32; 6] {
    let (a, b, c, d, e, f) = (m[0], m[1], m[2], m[3], m[4], m[5]);

    // follow OpenCV: a singular matrix inverts to zeros
    let determinant = a * e - b * d;
    let inv_determinant = if determinant != 0.0 {
        1.0 / determinant
    } else {
        0.0
    };

    let new_a = e * inv_determinant;
    let new_b = -b * inv_determinant;
    let new_d = -d * inv_determinant;
    let new_e = a * inv_determinant;
    let new_c = -(new_a * c + new_b * f);
    let new_f = -(new_d * c + new_e * f);

    [new_a, new_b, new_c, new_d, new_e, new_f]
}

/// Computes the unique 2x3 affine transform mapping three source points onto three
/// destination points.
///
/// # Arguments
///
/// * `src` - The three source points as (x, y).
/// * `dst` - The three destination points as (x, y).
///
/// # Errors
///
/// Returns [`WarpError::DegenerateCorrespondences`] when the source points are collinear.
pub fn get_affine_transform(src: &[[f32; 2]; 3], dst: &[[f32; 2]; 3]) -> Result<[f32; 6], WarpError> {
    // edge vectors relative to the first correspondence
    let (p00, p01) = (src[1][0] - src[0][0], src[2][0] - src[0][0]);
    let (p10, p11) = (src[1][1] - src[0][1], src[2][1] - src[0][1]);
    let (q00, q01) = (dst[1][0] - dst[0][0], dst[2][0] - dst[0][0]);
    let (q10, q11) = (dst[1][1] - dst[0][1], dst[2][1] - dst[0][1]);

    let det = p00 * p11 - p01 * p10;
    if det.abs() < f32::EPSILON {
        return Err(WarpError::DegenerateCorrespondences(det));
    }
    let inv_det = 1.0 / det;

    // A = Q * P^-1
    let a = (q00 * p11 - q01 * p10) * inv_det;
    let b = (q01 * p00 - q00 * p01) * inv_det;
    let d = (q10 * p11 - q11 * p10) * inv_det;
    let e = (q11 * p00 - q10 * p01) * inv_det;

    let c = dst[0][0] - (a * src[0][0] + b * src[0][1]);
    let f = dst[0][1] - (d * src[0][0] + e * src[0][1]);

    Ok([a, b, c, d, e, f])
}

/// Applies an affine transformation to a point.
pub fn transform_point(x: f32, y: f32, m: &[f32; 6]) -> (f32, f32) {
    let u = m[0] * x + m[1] * y + m[2];
    let v = m[3] * x + m[4] * y + m[5];
    (u, v)
}

/// Applies an affine transformation to an image.
///
/// # Arguments
///
/// * `src` - The input image with shape (height, width, channels).
/// * `dst` - The output image with shape (height, width, channels).
/// * `m` - The 2x3 affine transformation matrix mapping `src` onto `dst`.
/// * `interpolation` - The interpolation mode to use.
///
/// # Example
///
/// ```
/// use mono3d_image::{Image, ImageSize};
/// use mono3d_imgproc::interpolation::InterpolationMode;
/// use mono3d_imgproc::warp::warp_affine;
///
/// let src = Image::<_, 3>::from_size_val(
///     ImageSize {
///         width: 4,
///         height: 5,
///     },
///     1f32,
/// ).unwrap();
///
/// let m = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
/// let mut dst = Image::<_, 3>::from_size_val(src.size(), 0.0).unwrap();
///
/// warp_affine(&src, &mut dst, &m, InterpolationMode::Nearest).unwrap();
///
/// assert_eq!(dst.as_slice(), src.as_slice());
/// ```
pub fn warp_affine<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    m: &[f32; 6],
    interpolation: InterpolationMode,
) -> Result<(), WarpError> {
    // invert affine transform matrix to find corresponding positions in src from dst
    let m_inv = invert_affine_transform(m);
    warp_affine_inverse(src, dst, &m_inv, interpolation)
}

/// Resamples `src` into `dst` given the inverse affine transform (destination to source).
///
/// Destination pixels whose source position falls outside `src` keep their current value.
pub fn warp_affine_inverse<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    m_inv: &[f32; 6],
    interpolation: InterpolationMode,
) -> Result<(), WarpError> {
    if src.width() == 0 || src.height() == 0 {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        )
        .into());
    }

    // create meshgrid to find corresponding positions in src from dst
    let (dst_rows, dst_cols) = (dst.rows(), dst.cols());
    let (map_x, map_y) = meshgrid_from_fn(dst_cols, dst_rows, |x, y| {
        transform_point(x as f32, y as f32, m_inv)
    });

    parallel::par_iter_rows_resample(dst, &map_x, &map_y, |&x, &y, dst_pixel| {
        // check if the position is within the bounds of the src image
        if x >= 0.0f32 && x < src.cols() as f32 && y >= 0.0f32 && y < src.rows() as f32 {
            let pixel = interpolate_pixel(src, x, y, interpolation);
            dst_pixel.copy_from_slice(&pixel);
        }
    });

    Ok(())
}
