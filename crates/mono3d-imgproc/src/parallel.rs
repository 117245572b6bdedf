use rayon::prelude::*;

use mono3d_image::Image;

/// Apply a function to each pixel in the image in parallel.
pub fn par_iter_rows<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&[T1], &mut [T2]) + Send + Sync,
) where
    T1: Clone + Send + Sync,
    T2: Clone + Send + Sync,
{
    let cols = src.cols();
    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .chunks_exact(C1)
                .zip(dst_chunk.chunks_exact_mut(C2))
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each pixel value in the image in parallel, in place.
pub fn par_iter_rows_val_mut<T, const C: usize>(
    image: &mut Image<T, C>,
    f: impl Fn(&mut T) + Send + Sync,
) where
    T: Send + Sync,
{
    let cols = image.cols();
    image
        .as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .for_each(|row| row.iter_mut().for_each(&f));
}

/// Apply a function to each pixel (all channels at once) in parallel, in place.
pub fn par_iter_pixels_mut<T, const C: usize>(
    image: &mut Image<T, C>,
    f: impl Fn(&mut [T]) + Send + Sync,
) where
    T: Send + Sync,
{
    let cols = image.cols();
    image
        .as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .for_each(|row| row.chunks_exact_mut(C).for_each(&f));
}

/// Apply a function to each pixel for grid sampling in parallel.
///
/// `map_x` and `map_y` hold one source coordinate per destination pixel, row-major.
pub fn par_iter_rows_resample<const C: usize>(
    dst: &mut Image<f32, C>,
    map_x: &[f32],
    map_y: &[f32],
    f: impl Fn(&f32, &f32, &mut [f32]) + Send + Sync,
) {
    let cols = dst.cols();

    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .zip(map_x.par_chunks_exact(cols))
        .zip(map_y.par_chunks_exact(cols))
        .for_each(|((dst_chunk, map_x_chunk), map_y_chunk)| {
            dst_chunk
                .chunks_exact_mut(C)
                .zip(map_x_chunk.iter().zip(map_y_chunk.iter()))
                .for_each(|(dst_pixel, (x, y))| {
                    f(x, y, dst_pixel);
                });
        });
}
