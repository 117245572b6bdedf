use mono3d_image::{Image, ImageError};
use rayon::{iter::ParallelIterator, slice::ParallelSliceMut};

/// Mirror an image about its vertical center line.
///
/// Column `x` of the output is column `width - 1 - x` of the input; applying the flip
/// twice gives back the input.
///
/// # Example
///
/// ```
/// use mono3d_image::{Image, ImageSize};
/// use mono3d_imgproc::flip::horizontal_flip;
///
/// let image = Image::<u8, 2>::new(ImageSize { width: 3, height: 1 }, vec![1, 2, 3, 4, 5, 6]).unwrap();
/// let flipped = horizontal_flip(&image).unwrap();
///
/// assert_eq!(flipped.as_slice(), &[5, 6, 3, 4, 1, 2]);
/// ```
pub fn horizontal_flip<T, const C: usize>(src: &Image<T, C>) -> Result<Image<T, C>, ImageError>
where
    T: Clone + Send + Sync,
{
    let mut dst = src.clone();
    let row_len = src.cols() * C;
    if row_len == 0 {
        return Ok(dst);
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(row_len)
        .for_each(|row| {
            // reversing the row also reverses the channel order of every pixel
            row.reverse();
            row.chunks_exact_mut(C).for_each(|pixel| pixel.reverse());
        });

    Ok(dst)
}
