use glam::{Mat3, Vec3};

use crate::camera::ProjectionMatrix;
use crate::object::Annotation;

/// An oriented 3D box resting on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box3d {
    /// Dimensions as (length, height, width) in meters.
    pub dimensions: [f32; 3],
    /// Bottom-center in camera coordinates (meters).
    pub location: [f32; 3],
    /// Rotation around the camera y axis in radians.
    pub rotation_y: f32,
}

impl From<&Annotation> for Box3d {
    fn from(ann: &Annotation) -> Self {
        Self {
            dimensions: ann.dimensions,
            location: ann.location,
            rotation_y: ann.rotation_y,
        }
    }
}

impl Box3d {
    /// Returns the box mirrored about the camera's vertical plane (x and heading negated).
    pub fn mirrored(&self) -> Self {
        let [x, y, z] = self.location;
        Self {
            dimensions: self.dimensions,
            location: [-x, y, z],
            rotation_y: -self.rotation_y,
        }
    }

    /// The geometric center of the box.
    pub fn center(&self) -> Vec3 {
        let [x, y, z] = self.location;
        Vec3::new(x, y - self.dimensions[1] / 2.0, z)
    }

    /// The eight corners in camera coordinates as rows of x, y and z values.
    ///
    /// Corners 2, 3, 6 and 7 lie on the ground plane, the others on the top face.
    pub fn corners(&self) -> [[f32; 8]; 3] {
        let [l, h, w] = self.dimensions;
        let x_corners = [0.0, l, l, l, l, 0.0, 0.0, 0.0];
        let y_corners = [0.0, 0.0, h, h, 0.0, 0.0, h, h];
        let z_corners = [0.0, 0.0, 0.0, w, w, w, w, 0.0];

        let rotation = Mat3::from_rotation_y(self.rotation_y);
        let location = Vec3::from_array(self.location);

        let mut corners = [[0.0; 8]; 3];
        for i in 0..8 {
            let local = Vec3::new(
                x_corners[i] - l / 2.0,
                y_corners[i] - h,
                z_corners[i] - w / 2.0,
            );
            let p = rotation * local + location;
            corners[0][i] = p.x;
            corners[1][i] = p.y;
            corners[2][i] = p.z;
        }
        corners
    }
}

/// The image-space footprint of a 3D box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedBox {
    /// Projection of the box center, the heatmap keypoint.
    pub keypoint: [f32; 2],
    /// Axis-aligned box enclosing all projected corners as (x_min, y_min, x_max, y_max).
    pub box2d: [f32; 4],
    /// The eight 3D corners as rows of x, y and z values.
    pub corners: [[f32; 8]; 3],
}

/// Projects a 3D box through the camera and returns its keypoint, 2D box and corners.
///
/// # Example
///
/// ```
/// use mono3d_3d::{encode_label, Box3d, ProjectionMatrix};
///
/// let calib = ProjectionMatrix::from_intrinsics(700.0, 700.0, 600.0, 180.0);
/// let b = Box3d { dimensions: [4.0, 1.5, 1.8], location: [0.0, 0.75, 20.0], rotation_y: 0.0 };
///
/// let projected = encode_label(&calib, &b);
/// assert_eq!(projected.keypoint, [600.0, 180.0]);
/// ```
pub fn encode_label(calib: &ProjectionMatrix, b: &Box3d) -> ProjectedBox {
    let corners = b.corners();
    let keypoint = calib.project(b.center());

    let mut box2d = [f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY];
    for i in 0..8 {
        let [u, v] = calib.project(Vec3::new(corners[0][i], corners[1][i], corners[2][i]));
        box2d[0] = box2d[0].min(u);
        box2d[1] = box2d[1].min(v);
        box2d[2] = box2d[2].max(u);
        box2d[3] = box2d[3].max(v);
    }

    ProjectedBox {
        keypoint,
        box2d,
        corners,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn corners_axis_aligned() {
        let b = Box3d {
            dimensions: [4.0, 1.5, 1.8],
            location: [5.0, 1.0, 20.0],
            rotation_y: 0.0,
        };
        let corners = b.corners();

        let (x_min, x_max) = corners[0]
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        assert_relative_eq!(x_min, 3.0);
        assert_relative_eq!(x_max, 7.0);

        // bottom face at the annotated y, top face one height above (y points down)
        assert_relative_eq!(corners[1][2], 1.0);
        assert_relative_eq!(corners[1][0], -0.5);
        assert_relative_eq!(corners[2][3], 20.9, epsilon = 1e-5);
    }

    #[test]
    fn corners_rotated_quarter_turn() {
        let b = Box3d {
            dimensions: [4.0, 1.5, 2.0],
            location: [0.0, 0.0, 10.0],
            rotation_y: std::f32::consts::FRAC_PI_2,
        };
        let corners = b.corners();
        // length now extends along z
        let z_span = corners[2].iter().cloned().fold(f32::MIN, f32::max)
            - corners[2].iter().cloned().fold(f32::MAX, f32::min);
        assert_relative_eq!(z_span, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn encode_label_box_encloses_keypoint() {
        let calib = ProjectionMatrix::from_intrinsics(721.5, 721.5, 609.5, 172.8);
        let b = Box3d {
            dimensions: [4.0, 1.5, 1.8],
            location: [5.0, 1.0, 20.0],
            rotation_y: 0.3,
        };
        let projected = encode_label(&calib, &b);
        let [u, v] = projected.keypoint;
        assert!(projected.box2d[0] < u && u < projected.box2d[2]);
        assert!(projected.box2d[1] < v && v < projected.box2d[3]);
        assert_relative_eq!(u, 609.5 + 721.5 * 5.0 / 20.0, epsilon = 1e-3);
        assert_relative_eq!(v, 172.8 + 721.5 * 0.25 / 20.0, epsilon = 1e-3);
    }

    #[test]
    fn mirrored_twice_is_identity() {
        let b = Box3d {
            dimensions: [4.0, 1.5, 1.8],
            location: [5.0, 1.0, 20.0],
            rotation_y: 0.3,
        };
        assert_eq!(b.mirrored().mirrored(), b);
        assert_eq!(b.mirrored().location[0], -5.0);
    }
}
