use glam::Vec3;

/// A 3x4 projective camera matrix mapping homogeneous camera-space points to pixels.
///
/// Rows are stored row-major, i.e. `rows[r][c]` is the element at row `r` and column `c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionMatrix {
    /// The three rows of the matrix.
    pub rows: [[f32; 4]; 3],
}

impl ProjectionMatrix {
    /// Creates a projection matrix from its 12 row-major values.
    pub fn from_row_major(values: &[f32; 12]) -> Self {
        let mut rows = [[0.0; 4]; 3];
        for (r, row) in rows.iter_mut().enumerate() {
            row.copy_from_slice(&values[r * 4..r * 4 + 4]);
        }
        Self { rows }
    }

    /// Creates a projection matrix `[K | 0]` from pinhole intrinsics.
    pub fn from_intrinsics(fx: f32, fy: f32, cx: f32, cy: f32) -> Self {
        Self {
            rows: [
                [fx, 0.0, cx, 0.0],
                [0.0, fy, cy, 0.0],
                [0.0, 0.0, 1.0, 0.0],
            ],
        }
    }

    /// Returns the left 3x3 block of the matrix.
    pub fn intrinsics(&self) -> [[f32; 3]; 3] {
        let mut k = [[0.0; 3]; 3];
        for (dst, src) in k.iter_mut().zip(self.rows.iter()) {
            dst.copy_from_slice(&src[..3]);
        }
        k
    }

    /// Returns the matrix extended to 4x4 with a last row of `[0, 0, 0, 1]`.
    pub fn to_homogeneous(&self) -> [[f32; 4]; 4] {
        [self.rows[0], self.rows[1], self.rows[2], [0.0, 0.0, 0.0, 1.0]]
    }

    /// Mirrors the principal-point column for a horizontally flipped image of `width` pixels.
    ///
    /// Applying it twice with the same width restores the original matrix.
    pub fn flip_horizontal(&mut self, width: f32) {
        self.rows[0][2] = width - self.rows[0][2] - 1.0;
    }

    /// Projects a camera-space point and returns its pixel coordinates.
    ///
    /// Points on the camera plane (zero depth) project to non-finite values.
    pub fn project(&self, point: Vec3) -> [f32; 2] {
        let p = point.extend(1.0);
        let u = glam::Vec4::from_array(self.rows[0]).dot(p);
        let v = glam::Vec4::from_array(self.rows[1]).dot(p);
        let w = glam::Vec4::from_array(self.rows[2]).dot(p);
        [u / w, v / w]
    }

    /// Back-projects a pixel to the camera-space point with the given depth (z coordinate).
    ///
    /// Returns `None` when the system is singular for this pixel.
    pub fn unproject(&self, pixel: [f32; 2], depth: f32) -> Option<Vec3> {
        let [u, v] = pixel;
        let [p0, p1, p2] = self.rows;

        // u * (p2 . X) = p0 . X and v * (p2 . X) = p1 . X, solved for x and y
        let a00 = p0[0] - u * p2[0];
        let a01 = p0[1] - u * p2[1];
        let a10 = p1[0] - v * p2[0];
        let a11 = p1[1] - v * p2[1];
        let b0 = -((p0[2] - u * p2[2]) * depth + (p0[3] - u * p2[3]));
        let b1 = -((p1[2] - v * p2[2]) * depth + (p1[3] - v * p2[3]));

        let det = a00 * a11 - a01 * a10;
        if det.abs() < f32::EPSILON {
            return None;
        }

        let x = (b0 * a11 - a01 * b1) / det;
        let y = (a00 * b1 - b0 * a10) / det;
        Some(Vec3::new(x, y, depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn kitti_p2() -> ProjectionMatrix {
        ProjectionMatrix::from_row_major(&[
            721.5377, 0.0, 609.5593, 44.85728, 0.0, 721.5377, 172.854, 0.2163791, 0.0, 0.0, 1.0,
            0.002745884,
        ])
    }

    #[test]
    fn project_principal_axis() {
        let p = ProjectionMatrix::from_intrinsics(700.0, 700.0, 600.0, 180.0);
        let [u, v] = p.project(Vec3::new(0.0, 0.0, 10.0));
        assert_relative_eq!(u, 600.0);
        assert_relative_eq!(v, 180.0);
    }

    #[test]
    fn unproject_round_trip() {
        let p = kitti_p2();
        let point = Vec3::new(5.0, 0.25, 20.0);
        let pixel = p.project(point);
        let back = p.unproject(pixel, point.z).unwrap_or(Vec3::ZERO);
        assert_relative_eq!(back.x, point.x, epsilon = 1e-3);
        assert_relative_eq!(back.y, point.y, epsilon = 1e-3);
    }

    #[test]
    fn flip_twice_is_identity() {
        let original = kitti_p2();
        let mut p = original;
        p.flip_horizontal(1242.0);
        assert_relative_eq!(p.rows[0][2], 1242.0 - 609.5593 - 1.0, epsilon = 1e-3);
        p.flip_horizontal(1242.0);
        assert_relative_eq!(p.rows[0][2], original.rows[0][2], epsilon = 1e-3);
    }

    #[test]
    fn homogeneous_last_row() {
        let h = kitti_p2().to_homogeneous();
        assert_eq!(h[3], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(h[0][3], 44.85728);
    }
}
