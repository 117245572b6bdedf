use mono3d_image::{Image, ImageError, ImageSize};

use crate::encoder::EncodedObject;
use crate::heatmap::draw_gaussian;

/// Fixed-capacity per-object training targets plus one heatmap per class.
///
/// Slots past the number of accepted objects stay zero with both masks at 0.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetBuffers {
    /// One heatmap per detected class over the output grid.
    pub heatmaps: Vec<Image<f32, 1>>,
    /// 3D box corners, rows of x, y and z.
    pub regression: Vec<[[f32; 8]; 3]>,
    /// Heatmap channel of each object.
    pub cls_ids: Vec<i32>,
    /// Integer keypoints.
    pub proj_points: Vec<[i32; 2]>,
    /// Sub-pixel keypoint offsets.
    pub p_offsets: Vec<[f32; 2]>,
    /// Dimensions as (length, height, width).
    pub dimensions: Vec<[f32; 3]>,
    /// Bottom-center locations.
    pub locations: Vec<[f32; 3]>,
    /// Headings.
    pub rotys: Vec<f32>,
    /// 1 if the object contributes to the box regression loss.
    pub reg_mask: Vec<u8>,
    /// 1 if the object was mirrored and contributes to the flip loss.
    pub flip_mask: Vec<u8>,
    /// Clipped 2D boxes in output-grid coordinates.
    pub reg_2d: Vec<[f32; 4]>,
    /// Offsets from the integer keypoint to the 2D box center.
    pub p_2d_offsets: Vec<[f32; 2]>,
    /// 2D box width and height.
    pub p_2d_whs: Vec<[f32; 2]>,
}

impl TargetBuffers {
    /// Allocates zeroed buffers.
    ///
    /// # Arguments
    ///
    /// * `num_classes` - Number of heatmap channels.
    /// * `max_objects` - Number of object slots.
    /// * `output_size` - Output grid resolution.
    pub fn new(
        num_classes: usize,
        max_objects: usize,
        output_size: ImageSize,
    ) -> Result<Self, ImageError> {
        let heatmaps = (0..num_classes)
            .map(|_| Image::from_size_val(output_size, 0.0))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            heatmaps,
            regression: vec![[[0.0; 8]; 3]; max_objects],
            cls_ids: vec![0; max_objects],
            proj_points: vec![[0; 2]; max_objects],
            p_offsets: vec![[0.0; 2]; max_objects],
            dimensions: vec![[0.0; 3]; max_objects],
            locations: vec![[0.0; 3]; max_objects],
            rotys: vec![0.0; max_objects],
            reg_mask: vec![0; max_objects],
            flip_mask: vec![0; max_objects],
            reg_2d: vec![[0.0; 4]; max_objects],
            p_2d_offsets: vec![[0.0; 2]; max_objects],
            p_2d_whs: vec![[0.0; 2]; max_objects],
        })
    }

    /// Number of object slots.
    pub fn capacity(&self) -> usize {
        self.cls_ids.len()
    }

    /// Number of heatmap channels.
    pub fn num_classes(&self) -> usize {
        self.heatmaps.len()
    }

    /// Output grid resolution.
    pub fn output_size(&self) -> ImageSize {
        self.heatmaps
            .first()
            .map(|hm| hm.size())
            .unwrap_or(ImageSize {
                width: 0,
                height: 0,
            })
    }

    fn write(&mut self, slot: usize, obj: &EncodedObject, jittered: bool, flipped: bool) {
        self.cls_ids[slot] = obj.class_index as i32;
        self.regression[slot] = obj.corners;
        self.proj_points[slot] = obj.keypoint_int;
        self.p_offsets[slot] = obj.offset;
        self.dimensions[slot] = obj.dimensions;
        self.locations[slot] = obj.location;
        self.rotys[slot] = obj.rotation_y;
        self.reg_mask[slot] = u8::from(!jittered);
        self.flip_mask[slot] = u8::from(!jittered && flipped);
        self.reg_2d[slot] = obj.box2d;
        self.p_2d_offsets[slot] = obj.box_center_offset();
        self.p_2d_whs[slot] = obj.box_size();

        if let Some(hm) = self.heatmaps.get_mut(obj.class_index) {
            draw_gaussian(hm, obj.keypoint_int, obj.radius);
        }
    }
}

/// Fills [`TargetBuffers`] slot by slot across all source images of a sample.
pub struct TargetAssembler {
    buffers: TargetBuffers,
    next_slot: usize,
    jittered: bool,
    flipped: bool,
}

impl TargetAssembler {
    /// Starts assembling into `buffers`.
    ///
    /// # Arguments
    ///
    /// * `buffers` - Zeroed target buffers.
    /// * `jittered` - Whether the sample was shift/scale jittered.
    /// * `flipped` - Whether the sample was mirrored.
    pub fn new(buffers: TargetBuffers, jittered: bool, flipped: bool) -> Self {
        Self {
            buffers,
            next_slot: 0,
            jittered,
            flipped,
        }
    }

    /// Writes `obj` into the next free slot; returns `false` when all slots are taken.
    pub fn push(&mut self, obj: &EncodedObject) -> bool {
        if self.next_slot >= self.buffers.capacity() {
            return false;
        }
        self.buffers
            .write(self.next_slot, obj, self.jittered, self.flipped);
        self.next_slot += 1;
        true
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.next_slot
    }

    /// Whether no slot is occupied yet.
    pub fn is_empty(&self) -> bool {
        self.next_slot == 0
    }

    /// The integer keypoints of the occupied slots.
    pub fn keypoints(&self) -> &[[i32; 2]] {
        &self.buffers.proj_points[..self.next_slot]
    }

    /// Finishes assembly.
    pub fn finish(self) -> TargetBuffers {
        self.buffers
    }
}

/// Typed storage of a [`NamedArray`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    /// 32-bit floats.
    F32(Vec<f32>),
    /// 32-bit signed integers.
    I32(Vec<i32>),
    /// Bytes, used for masks.
    U8(Vec<u8>),
}

impl ArrayData {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            ArrayData::F32(v) => v.len(),
            ArrayData::I32(v) => v.len(),
            ArrayData::U8(v) => v.len(),
        }
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A flat row-major array with its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArray {
    /// Name of the target field.
    pub name: &'static str,
    /// Array dimensions, outermost first.
    pub shape: Vec<usize>,
    /// The elements.
    pub data: ArrayData,
}

impl NamedArray {
    fn f32(name: &'static str, shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self {
            name,
            shape,
            data: ArrayData::F32(data),
        }
    }
}

/// Metadata a decoder needs to map predictions back to the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceTarget {
    /// Size of the source window; the network input size in train mode.
    pub image_size: [f32; 2],
    /// Source image to output grid, 3x3 homogeneous.
    pub trans_mat: [[f32; 3]; 3],
    /// Active calibration, 4x4 homogeneous.
    pub calib: [[f32; 4]; 4],
}

/// Targets of a training sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTarget {
    /// Transform and calibration of the sample.
    pub meta: InferenceTarget,
    /// The per-object buffers and heatmaps.
    pub buffers: TargetBuffers,
}

/// The target attached to a sample.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleTarget {
    /// Full training targets.
    Train(TrainTarget),
    /// Transform and calibration only.
    Inference(InferenceTarget),
}

impl SampleTarget {
    /// Transform and calibration, present in both modes.
    pub fn meta(&self) -> &InferenceTarget {
        match self {
            SampleTarget::Train(t) => &t.meta,
            SampleTarget::Inference(meta) => meta,
        }
    }

    /// The training buffers, if any.
    pub fn buffers(&self) -> Option<&TargetBuffers> {
        match self {
            SampleTarget::Train(t) => Some(&t.buffers),
            SampleTarget::Inference(_) => None,
        }
    }

    /// Exposes every field as a name, shape and flat data triple.
    pub fn named_arrays(&self) -> Vec<NamedArray> {
        let meta = self.meta();
        let trans_mat = NamedArray::f32("trans_mat", vec![3, 3], meta.trans_mat.concat());
        let calib = NamedArray::f32("P", vec![4, 4], meta.calib.concat());

        let b = match self {
            SampleTarget::Train(t) => &t.buffers,
            SampleTarget::Inference(_) => return vec![trans_mat, calib],
        };

        let n = b.capacity();
        let ImageSize { width, height } = b.output_size();
        let hm = b
            .heatmaps
            .iter()
            .flat_map(|h| h.as_slice().iter().copied())
            .collect();

        vec![
            NamedArray::f32("hm", vec![b.num_classes(), height, width], hm),
            NamedArray::f32(
                "reg",
                vec![n, 3, 8],
                b.regression.iter().flat_map(|r| r.concat()).collect(),
            ),
            NamedArray {
                name: "cls_ids",
                shape: vec![n],
                data: ArrayData::I32(b.cls_ids.clone()),
            },
            NamedArray {
                name: "proj_p",
                shape: vec![n, 2],
                data: ArrayData::I32(b.proj_points.concat()),
            },
            NamedArray::f32("p_offsets", vec![n, 2], b.p_offsets.concat()),
            NamedArray::f32("dimensions", vec![n, 3], b.dimensions.concat()),
            NamedArray::f32("locations", vec![n, 3], b.locations.concat()),
            NamedArray::f32("rotys", vec![n], b.rotys.clone()),
            trans_mat,
            calib,
            NamedArray {
                name: "reg_mask",
                shape: vec![n],
                data: ArrayData::U8(b.reg_mask.clone()),
            },
            NamedArray {
                name: "flip_mask",
                shape: vec![n],
                data: ArrayData::U8(b.flip_mask.clone()),
            },
            NamedArray::f32("reg_2d", vec![n, 4], b.reg_2d.concat()),
            NamedArray::f32("p_2d_offsets", vec![n, 2], b.p_2d_offsets.concat()),
            NamedArray::f32("p_2d_whs", vec![n, 2], b.p_2d_whs.concat()),
        ]
    }

    /// Names and shapes of [`Self::named_arrays`].
    ///
    /// An array whose data does not fill its declared shape is reported with its flat length.
    pub fn layout(&self) -> Vec<(&'static str, Vec<usize>)> {
        self.named_arrays()
            .into_iter()
            .map(|a| {
                let expected = a.shape.iter().product::<usize>();
                let shape = if a.data.len() == expected {
                    a.shape
                } else {
                    vec![a.data.len()]
                };
                (a.name, shape)
            })
            .collect()
    }
}
