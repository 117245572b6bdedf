use mono3d_image::{Image, ImageError};
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::{ParallelSlice, ParallelSliceMut},
};

/// Compose two images side by side at a column split.
///
/// Columns `[0, split_col)` are taken from `left` and columns `[split_col, width)` from
/// `right`, at the same horizontal positions.
///
/// # Arguments
///
/// * `left` - The image providing the left part.
/// * `right` - The image providing the right part.
/// * `split_col` - The first column taken from `right`.
///
/// # Errors
///
/// Returns an error if the two images differ in size or `split_col` exceeds the width.
///
/// # Example
///
/// ```
/// use mono3d_image::{Image, ImageSize};
/// use mono3d_imgproc::compose::splice_columns;
///
/// let size = ImageSize { width: 2, height: 1 };
/// let a = Image::<u8, 1>::new(size, vec![1, 2]).unwrap();
/// let b = Image::<u8, 1>::new(size, vec![3, 4]).unwrap();
///
/// let composed = splice_columns(&a, &b, 1).unwrap();
/// assert_eq!(composed.as_slice(), &[1, 4]);
/// ```
pub fn splice_columns<T, const C: usize>(
    left: &Image<T, C>,
    right: &Image<T, C>,
    split_col: usize,
) -> Result<Image<T, C>, ImageError>
where
    T: Copy + Send + Sync,
{
    if left.size() != right.size() {
        return Err(ImageError::InvalidImageSize(
            left.width(),
            left.height(),
            right.width(),
            right.height(),
        ));
    }

    if split_col > left.width() {
        return Err(ImageError::ColumnOutOfBounds(split_col, left.width()));
    }

    let mut dst = left.clone();
    let row_len = left.cols() * C;
    if row_len == 0 {
        return Ok(dst);
    }
    let offset = split_col * C;

    dst.as_slice_mut()
        .par_chunks_exact_mut(row_len)
        .zip(right.as_slice().par_chunks_exact(row_len))
        .for_each(|(dst_row, right_row)| {
            dst_row[offset..].copy_from_slice(&right_row[offset..]);
        });

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use mono3d_image::{Image, ImageError, ImageSize};

    #[test]
    fn splice_half() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 4,
            height: 2,
        };
        let primary = Image::<u8, 1>::from_size_val(size, 1)?;
        let secondary = Image::<u8, 1>::from_size_val(size, 2)?;

        let composed = super::splice_columns(&primary, &secondary, 2)?;
        assert_eq!(composed.as_slice(), &[1, 1, 2, 2, 1, 1, 2, 2]);
        Ok(())
    }

    #[test]
    fn splice_bounds() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 2,
            height: 1,
        };
        let a = Image::<u8, 3>::from_size_val(size, 1)?;
        let b = Image::<u8, 3>::from_size_val(size, 2)?;

        assert_eq!(super::splice_columns(&a, &b, 0)?, b);
        assert_eq!(super::splice_columns(&a, &b, 2)?, a);
        assert_eq!(
            super::splice_columns(&a, &b, 3),
            Err(ImageError::ColumnOutOfBounds(3, 2))
        );

        let c = Image::<u8, 3>::from_size_val(
            ImageSize {
                width: 3,
                height: 1,
            },
            0,
        )?;
        assert!(super::splice_columns(&a, &c, 1).is_err());
        Ok(())
    }
}
