//! Gaussian keypoint heatmaps.
//!
//! Peaks are rasterized CenterNet style: the radius comes from the box size through a
//! disk-overlap heuristic and overlapping peaks of the same class combine with the
//! per-pixel maximum.

use mono3d_image::Image;

/// Largest radius such that a disk of that radius around a box corner still overlaps the
/// box with at least `min_overlap` IoU.
///
/// Degenerate boxes yield 0.
///
/// # Arguments
///
/// * `height` - Box height in output-grid pixels.
/// * `width` - Box width in output-grid pixels.
/// * `min_overlap` - The IoU target, in (0, 1).
pub fn gaussian_radius(height: f32, width: f32, min_overlap: f32) -> u32 {
    let (h, w) = (height, width);

    let b1 = h + w;
    let c1 = w * h * (1.0 - min_overlap) / (1.0 + min_overlap);
    let r1 = (b1 + (b1 * b1 - 4.0 * c1).sqrt()) / 2.0;

    let b2 = 2.0 * (h + w);
    let c2 = (1.0 - min_overlap) * w * h;
    let r2 = (b2 + (b2 * b2 - 16.0 * c2).sqrt()) / 2.0;

    let a3 = 4.0 * min_overlap;
    let b3 = -2.0 * min_overlap * (h + w);
    let c3 = (min_overlap - 1.0) * w * h;
    let r3 = (b3 + (b3 * b3 - 4.0 * a3 * c3).sqrt()) / 2.0;

    if r1.is_nan() || r2.is_nan() || r3.is_nan() {
        return 0;
    }

    let radius = r1.min(r2).min(r3);
    if radius.is_finite() && radius > 0.0 {
        radius as u32
    } else {
        0
    }
}

/// A square Gaussian kernel of side `2 * radius + 1` with `sigma = side / 6`.
///
/// The center value is 1 and values below `f32::EPSILON` times the maximum are zeroed.
pub fn gaussian_2d(radius: u32) -> Vec<f32> {
    let r = radius as i64;
    let side = 2 * r + 1;
    let sigma = side as f32 / 6.0;
    let denom = 2.0 * sigma * sigma;

    let mut kernel = Vec::with_capacity((side * side) as usize);
    for y in -r..=r {
        for x in -r..=r {
            let v = (-((x * x + y * y) as f32) / denom).exp();
            kernel.push(if v < f32::EPSILON { 0.0 } else { v });
        }
    }
    kernel
}

/// Stamps a Gaussian peak at `center`, keeping the maximum with existing values.
///
/// The kernel is clipped at the heatmap borders; centers outside the heatmap are ignored.
///
/// # Example
///
/// ```
/// use mono3d_data::heatmap::draw_gaussian;
/// use mono3d_image::{Image, ImageSize};
///
/// let mut hm = Image::<f32, 1>::from_size_val(ImageSize { width: 8, height: 8 }, 0.0).unwrap();
/// draw_gaussian(&mut hm, [3, 4], 2);
///
/// assert_eq!(*hm.get_pixel(3, 4, 0).unwrap(), 1.0);
/// ```
pub fn draw_gaussian(heatmap: &mut Image<f32, 1>, center: [i32; 2], radius: u32) {
    let (cols, rows) = (heatmap.cols() as i64, heatmap.rows() as i64);
    let (cx, cy) = (center[0] as i64, center[1] as i64);
    if cx < 0 || cy < 0 || cx >= cols || cy >= rows {
        return;
    }

    let r = radius as i64;
    let side = 2 * r + 1;
    let kernel = gaussian_2d(radius);

    let left = cx.min(r);
    let right = (cols - cx).min(r + 1);
    let top = cy.min(r);
    let bottom = (rows - cy).min(r + 1);

    let data = heatmap.as_slice_mut();
    for dy in -top..bottom {
        let row = ((cy + dy) * cols) as usize;
        let krow = ((r + dy) * side) as usize;
        for dx in -left..right {
            let dst = &mut data[row + (cx + dx) as usize];
            *dst = dst.max(kernel[krow + (r + dx) as usize]);
        }
    }
}
