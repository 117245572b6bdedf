use mono3d_image::ImageSize;
use mono3d_imgproc::warp::{
    get_affine_transform, invert_affine_transform, transform_point, WarpError,
};

/// Maps a virtual window of the source image onto a target resolution.
///
/// The window is centered at `center` with extent `size`; its center lands on the target
/// center, and its right and bottom edge midpoints on the target's right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    matrix: [f32; 6],
    inverse: [f32; 6],
}

impl AffineTransform {
    /// Builds the transform from the window `center` and `size` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`WarpError::DegenerateCorrespondences`] if the window has zero extent.
    ///
    /// # Example
    ///
    /// ```
    /// use mono3d_data::affine::AffineTransform;
    /// use mono3d_image::ImageSize;
    ///
    /// let target = ImageSize { width: 320, height: 96 };
    /// let tf = AffineTransform::from_center_size([640.0, 192.0], [1280.0, 384.0], target).unwrap();
    ///
    /// let [u, v] = tf.apply([640.0, 192.0]);
    /// assert!((u - 160.0).abs() < 1e-3);
    /// assert!((v - 48.0).abs() < 1e-3);
    /// ```
    pub fn from_center_size(
        center: [f32; 2],
        size: [f32; 2],
        target: ImageSize,
    ) -> Result<Self, WarpError> {
        let [cx, cy] = center;
        let [w, h] = size;
        let (dst_w, dst_h) = (target.width as f32, target.height as f32);

        let src = [[cx, cy], [cx + w * 0.5, cy], [cx, cy + h * 0.5]];
        let dst = [
            [dst_w * 0.5, dst_h * 0.5],
            [dst_w, dst_h * 0.5],
            [dst_w * 0.5, dst_h],
        ];

        let matrix = get_affine_transform(&src, &dst)?;
        let inverse = invert_affine_transform(&matrix);

        Ok(Self { matrix, inverse })
    }

    /// The forward 2x3 matrix, source to target.
    pub fn matrix(&self) -> &[f32; 6] {
        &self.matrix
    }

    /// The inverse 2x3 matrix, target to source.
    pub fn inverse(&self) -> &[f32; 6] {
        &self.inverse
    }

    /// Maps a source point to the target.
    pub fn apply(&self, point: [f32; 2]) -> [f32; 2] {
        let (u, v) = transform_point(point[0], point[1], &self.matrix);
        [u, v]
    }

    /// Maps a target point back to the source.
    pub fn apply_inverse(&self, point: [f32; 2]) -> [f32; 2] {
        let (x, y) = transform_point(point[0], point[1], &self.inverse);
        [x, y]
    }

    /// The forward matrix extended to 3x3 homogeneous form.
    pub fn to_homogeneous(&self) -> [[f32; 3]; 3] {
        let m = &self.matrix;
        [[m[0], m[1], m[2]], [m[3], m[4], m[5]], [0.0, 0.0, 1.0]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const OUTPUT: ImageSize = ImageSize {
        width: 320,
        height: 96,
    };

    #[test]
    fn identity_window() -> Result<(), WarpError> {
        let target = ImageSize {
            width: 1280,
            height: 384,
        };
        let tf = AffineTransform::from_center_size([640.0, 192.0], [1280.0, 384.0], target)?;
        let identity = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        for (m, i) in tf.matrix().iter().zip(identity.iter()) {
            assert_relative_eq!(m, i, epsilon = 1e-5);
        }
        for (m, i) in tf.inverse().iter().zip(identity.iter()) {
            assert_relative_eq!(m, i, epsilon = 1e-5);
        }
        Ok(())
    }

    #[test]
    fn anisotropic_scaling() -> Result<(), WarpError> {
        let tf = AffineTransform::from_center_size([621.0, 187.5], [1242.0, 375.0], OUTPUT)?;
        let m = tf.matrix();
        assert_relative_eq!(m[0], 320.0 / 1242.0, epsilon = 1e-6);
        assert_relative_eq!(m[4], 96.0 / 375.0, epsilon = 1e-6);
        assert_relative_eq!(m[1], 0.0);
        assert_relative_eq!(m[3], 0.0);

        let [u, v] = tf.apply([0.0, 0.0]);
        assert_relative_eq!(u, 0.0, epsilon = 1e-3);
        assert_relative_eq!(v, 0.0, epsilon = 1e-3);
        Ok(())
    }

    #[test]
    fn round_trip_window_points() -> Result<(), WarpError> {
        let center = [600.5, 170.25];
        let size = [1490.4, 450.0];
        let tf = AffineTransform::from_center_size(center, size, OUTPUT)?;

        let points = [
            center,
            [center[0] + size[0] * 0.5, center[1]],
            [center[0], center[1] + size[1] * 0.5],
            [center[0] - size[0] * 0.5, center[1] - size[1] * 0.5],
        ];
        for p in points {
            let q = tf.apply_inverse(tf.apply(p));
            assert_relative_eq!(q[0], p[0], epsilon = 1e-2);
            assert_relative_eq!(q[1], p[1], epsilon = 1e-2);
        }

        let [u, v] = tf.apply([center[0] + size[0] * 0.5, center[1]]);
        assert_relative_eq!(u, 320.0, epsilon = 1e-3);
        assert_relative_eq!(v, 48.0, epsilon = 1e-3);
        Ok(())
    }

    #[test]
    fn homogeneous_last_row() -> Result<(), WarpError> {
        let tf = AffineTransform::from_center_size([10.0, 10.0], [20.0, 20.0], OUTPUT)?;
        assert_eq!(tf.to_homogeneous()[2], [0.0, 0.0, 1.0]);
        Ok(())
    }

    #[test]
    fn zero_window_is_degenerate() {
        let res = AffineTransform::from_center_size([10.0, 10.0], [0.0, 20.0], OUTPUT);
        assert!(matches!(res, Err(WarpError::DegenerateCorrespondences(_))));
    }
}
