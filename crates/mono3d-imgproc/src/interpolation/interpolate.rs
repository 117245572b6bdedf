use mono3d_image::Image;

/// Interpolation mode for the resampling operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterpolationMode {
    /// Weighted average of the four surrounding pixels.
    Bilinear,
    /// The closest pixel.
    Nearest,
}

/// The pixel at integer position `(x, y)`, clamped to the image.
#[inline]
fn pixel_at<const C: usize>(image: &Image<f32, C>, x: usize, y: usize) -> &[f32] {
    let x = x.min(image.cols() - 1);
    let y = y.min(image.rows() - 1);
    let start = (y * image.cols() + x) * C;
    &image.as_slice()[start..start + C]
}

/// Samples `image` at `(u, v)`.
///
/// Coordinates are expected inside `[0, cols) x [0, rows)`; neighbours past the last row or
/// column repeat the border.
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C).
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `interpolation` - The interpolation mode to use.
///
/// # Returns
///
/// The interpolated pixel, one value per channel.
pub fn interpolate_pixel<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
    interpolation: InterpolationMode,
) -> [f32; C] {
    let mut out = [0.0; C];

    match interpolation {
        InterpolationMode::Nearest => {
            out.copy_from_slice(pixel_at(image, u.round() as usize, v.round() as usize));
        }
        InterpolationMode::Bilinear => {
            let (x0, y0) = (u.trunc() as usize, v.trunc() as usize);
            let (fx, fy) = (u.fract(), v.fract());

            let taps = [
                (x0, y0, (1.0 - fx) * (1.0 - fy)),
                (x0 + 1, y0, fx * (1.0 - fy)),
                (x0, y0 + 1, (1.0 - fx) * fy),
                (x0 + 1, y0 + 1, fx * fy),
            ];
            for (x, y, w) in taps {
                if w == 0.0 {
                    continue;
                }
                for (o, &p) in out.iter_mut().zip(pixel_at(image, x, y)) {
                    *o += w * p;
                }
            }
        }
    }

    out
}
