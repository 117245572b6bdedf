use mono3d_3d::{encode_label, Annotation, Box3d, ObjectClass, ProjectionMatrix};
use mono3d_image::ImageSize;

use crate::affine::AffineTransform;
use crate::heatmap::gaussian_radius;

/// A rectangle of the output grid, `x_min < x < x_max` and `y_min < y < y_max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Left bound, exclusive.
    pub x_min: f32,
    /// Right bound, exclusive.
    pub x_max: f32,
    /// Top bound, exclusive.
    pub y_min: f32,
    /// Bottom bound, exclusive.
    pub y_max: f32,
}

impl Region {
    /// The whole grid.
    pub fn full(size: ImageSize) -> Self {
        Self {
            x_min: 0.0,
            x_max: size.width as f32,
            y_min: 0.0,
            y_max: size.height as f32,
        }
    }

    /// The columns `[x_min, x_max]` over the full grid height.
    pub fn columns(size: ImageSize, x_min: f32, x_max: f32) -> Self {
        Self {
            x_min,
            x_max,
            ..Self::full(size)
        }
    }

    /// Strict containment test.
    pub fn contains(&self, point: [f32; 2]) -> bool {
        self.x_min < point[0]
            && point[0] < self.x_max
            && self.y_min < point[1]
            && point[1] < self.y_max
    }
}

/// An annotation projected into the output grid.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedObject {
    /// The object class.
    pub class: ObjectClass,
    /// Heatmap channel of the class.
    pub class_index: usize,
    /// Keypoint in output-grid coordinates.
    pub keypoint: [f32; 2],
    /// The truncated keypoint.
    pub keypoint_int: [i32; 2],
    /// `keypoint - keypoint_int`.
    pub offset: [f32; 2],
    /// The eight 3D corners, rows of x, y and z.
    pub corners: [[f32; 8]; 3],
    /// The 2D box in output-grid coordinates, clipped to the grid.
    pub box2d: [f32; 4],
    /// Dimensions as (length, height, width).
    pub dimensions: [f32; 3],
    /// Bottom-center location, mirrored when flipped.
    pub location: [f32; 3],
    /// Heading, negated when flipped.
    pub rotation_y: f32,
    /// Heatmap radius in output-grid pixels.
    pub radius: u32,
}

impl EncodedObject {
    /// Box width and height.
    pub fn box_size(&self) -> [f32; 2] {
        [self.box2d[2] - self.box2d[0], self.box2d[3] - self.box2d[1]]
    }

    /// Offset from the integer keypoint to the 2D box center.
    pub fn box_center_offset(&self) -> [f32; 2] {
        let cx = (self.box2d[0] + self.box2d[2]) * 0.5;
        let cy = (self.box2d[1] + self.box2d[3]) * 0.5;
        [
            cx - self.keypoint_int[0] as f32,
            cy - self.keypoint_int[1] as f32,
        ]
    }
}

/// Projects annotations of one source image into the output grid.
pub struct LabelEncoder<'a> {
    calib: &'a ProjectionMatrix,
    transform: &'a AffineTransform,
    output_size: ImageSize,
    classes: &'a [ObjectClass],
    flipped: bool,
    min_overlap: f32,
}

impl<'a> LabelEncoder<'a> {
    /// Creates an encoder.
    ///
    /// # Arguments
    ///
    /// * `calib` - The active calibration, already mirrored if `flipped`.
    /// * `transform` - Source image to output grid.
    /// * `output_size` - Output grid resolution.
    /// * `classes` - The detected classes; their order defines the heatmap channels.
    /// * `flipped` - Whether the source image was mirrored.
    /// * `min_overlap` - Overlap target of the radius heuristic.
    pub fn new(
        calib: &'a ProjectionMatrix,
        transform: &'a AffineTransform,
        output_size: ImageSize,
        classes: &'a [ObjectClass],
        flipped: bool,
        min_overlap: f32,
    ) -> Self {
        Self {
            calib,
            transform,
            output_size,
            classes,
            flipped,
            min_overlap,
        }
    }

    /// Encodes one annotation; returns `None` for classes that are not detected.
    pub fn encode(&self, ann: &Annotation) -> Option<EncodedObject> {
        let class_index = self.classes.iter().position(|&c| c == ann.class)?;

        let mut b = Box3d::from(ann);
        if self.flipped {
            b = b.mirrored();
        }

        let projected = encode_label(self.calib, &b);
        let keypoint = self.transform.apply(projected.keypoint);

        let [x0, y0, x1, y1] = projected.box2d;
        let [x0, y0] = self.transform.apply([x0, y0]);
        let [x1, y1] = self.transform.apply([x1, y1]);
        let max_x = (self.output_size.width as f32 - 1.0).max(0.0);
        let max_y = (self.output_size.height as f32 - 1.0).max(0.0);
        let box2d = [
            x0.clamp(0.0, max_x),
            y0.clamp(0.0, max_y),
            x1.clamp(0.0, max_x),
            y1.clamp(0.0, max_y),
        ];

        let keypoint_int = [keypoint[0] as i32, keypoint[1] as i32];
        let offset = [
            keypoint[0] - keypoint_int[0] as f32,
            keypoint[1] - keypoint_int[1] as f32,
        ];
        let radius = gaussian_radius(box2d[3] - box2d[1], box2d[2] - box2d[0], self.min_overlap);

        Some(EncodedObject {
            class: ann.class,
            class_index,
            keypoint,
            keypoint_int,
            offset,
            corners: projected.corners,
            box2d,
            dimensions: b.dimensions,
            location: b.location,
            rotation_y: b.rotation_y,
            radius,
        })
    }
}
