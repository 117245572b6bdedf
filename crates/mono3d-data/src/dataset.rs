use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use mono3d_3d::io::kitti::{read_calibration, read_labels, read_split, StereoCalibration};
use mono3d_3d::{Annotation, ProjectionMatrix};
use mono3d_image::{Image, ImageDtype, ImageSize};
use mono3d_imgproc::{
    compose::splice_columns,
    draw::draw_filled_circle,
    enhance::{add_gaussian_noise, color_jitter},
    flip::horizontal_flip,
    interpolation::InterpolationMode,
    warp::warp_affine_inverse,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::affine::AffineTransform;
use crate::augment::{AugmentationPlan, View};
use crate::config::{DatasetConfig, Mode};
use crate::debug::DebugSink;
use crate::encoder::{LabelEncoder, Region};
use crate::error::DatasetError;
use crate::targets::{InferenceTarget, SampleTarget, TargetAssembler, TargetBuffers, TrainTarget};
use crate::transforms::{apply_checked, SampleTransform};

const KEYPOINT_RADIUS: i64 = 3;
const KEYPOINT_COLOR: [u8; 3] = [255, 0, 0];

/// An encoded sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// The KITTI frame identifier, e.g. `000042`.
    pub frame_id: String,
    /// The network input image, RGB in `[0, 255]` unless a transform rescaled it.
    pub image: Image<f32, 3>,
    /// Training targets or inference metadata.
    pub target: SampleTarget,
}

/// Annotations of one source image together with its calibration and grid region.
struct Source {
    annotations: Vec<Annotation>,
    calib: ProjectionMatrix,
    region: Region,
}

/// A KITTI object-detection split.
///
/// Every call to [`KittiDataset::get`] reads the frame from disk; nothing is cached, so
/// mosaic partners are always fresh.
pub struct KittiDataset {
    config: DatasetConfig,
    frame_ids: Vec<String>,
    transforms: Option<Box<dyn SampleTransform>>,
    debug_sink: Option<Box<dyn DebugSink>>,
}

impl KittiDataset {
    /// Opens the split named in `config`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the split file cannot be read.
    pub fn new(config: DatasetConfig) -> Result<Self, DatasetError> {
        config.validate()?;

        let split_path = config
            .root
            .join("ImageSets")
            .join(format!("{}.txt", config.split.file_stem()));
        let frame_ids = read_split(&split_path)?;

        info!(
            "opened KITTI split {} with {} frames in {:?} mode",
            config.split,
            frame_ids.len(),
            config.mode
        );

        Ok(Self {
            config,
            frame_ids,
            transforms: None,
            debug_sink: None,
        })
    }

    /// Sets the post-processing transform.
    pub fn with_transforms(mut self, transforms: impl SampleTransform + 'static) -> Self {
        self.transforms = Some(Box::new(transforms));
        self
    }

    /// Sets the debug visualization sink.
    pub fn with_debug_sink(mut self, sink: impl DebugSink + 'static) -> Self {
        self.debug_sink = Some(Box::new(sink));
        self
    }

    /// The dataset configuration.
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Number of frames in the split.
    pub fn len(&self) -> usize {
        self.frame_ids.len()
    }

    /// Whether the split is empty.
    pub fn is_empty(&self) -> bool {
        self.frame_ids.is_empty()
    }

    /// The frame identifier at `idx`.
    pub fn frame_id(&self, idx: usize) -> Result<&str, DatasetError> {
        self.frame_ids
            .get(idx)
            .map(String::as_str)
            .ok_or(DatasetError::IndexOutOfRange(idx, self.frame_ids.len()))
    }

    fn frame_path(&self, dir: &str, idx: usize, ext: &str) -> Result<PathBuf, DatasetError> {
        let id = self.frame_id(idx)?;
        Ok(self.config.root.join(dir).join(format!("{id}.{ext}")))
    }

    /// Reads the annotations of the detected classes.
    pub fn load_annotations(&self, idx: usize) -> Result<Vec<Annotation>, DatasetError> {
        let path = self.frame_path("label_2", idx, "txt")?;
        Ok(read_labels(path, &self.config.detect_classes)?)
    }

    /// Reads both camera matrices.
    pub fn load_calibration(&self, idx: usize) -> Result<StereoCalibration, DatasetError> {
        let path = self.frame_path("calib", idx, "txt")?;
        Ok(read_calibration(path)?)
    }

    /// Reads the image of `view` as RGB floats in `[0, 255]`.
    pub fn load_image(&self, idx: usize, view: View) -> Result<Image<f32, 3>, DatasetError> {
        let dir = match view {
            View::Left => "image_2",
            View::Right => "image_3",
        };
        let path = self.frame_path(dir, idx, "png")?;
        read_image_rgb(&path)
    }

    /// Draws an augmentation plan and encodes the sample at `idx`.
    ///
    /// In inference mode nothing is drawn and the sample is only resampled.
    pub fn get(&self, idx: usize, rng: &mut impl Rng) -> Result<Sample, DatasetError> {
        let plan = match self.config.mode {
            Mode::Train => AugmentationPlan::draw(&self.config.augment, self.len(), rng),
            Mode::Inference => AugmentationPlan::identity(),
        };
        debug!("frame {idx}: {plan:?}");
        self.get_with_plan(idx, &plan)
    }

    /// Encodes the sample at `idx` under a given plan.
    ///
    /// In inference mode the plan is ignored.
    pub fn get_with_plan(
        &self,
        idx: usize,
        plan: &AugmentationPlan,
    ) -> Result<Sample, DatasetError> {
        let identity = AugmentationPlan::identity();
        let train = self.config.mode == Mode::Train;
        let plan = if train { plan } else { &identity };

        let frame_id = self.frame_id(idx)?.to_string();
        let stereo = self.load_calibration(idx)?;
        let mut calib = match plan.view {
            View::Left => stereo.left,
            View::Right => stereo.right,
        };

        let mut image = self.load_image(idx, plan.view)?;
        let (width, height) = (image.width() as f32, image.height() as f32);
        let mut center = [width / 2.0, height / 2.0];
        let mut size = [width, height];

        if plan.flip {
            image = horizontal_flip(&image)?;
            center[0] = width - center[0] - 1.0;
            calib.flip_horizontal(width);
        }

        if let Some(jitter) = &plan.jitter {
            center[0] += size[0] * jitter.shift[0];
            center[1] += size[1] * jitter.shift[1];
            size[0] *= jitter.scale;
            size[1] *= jitter.scale;
        }

        let output_size = self.config.output_size();
        let mut sources = Vec::new();
        if train {
            sources.push(Source {
                annotations: self.load_annotations(idx)?,
                calib,
                region: Region::full(output_size),
            });
        }

        if let Some(mosaic) = &plan.mosaic {
            if let Some((partner, composed)) =
                self.compose_mosaic(&image, plan.view, &mosaic.candidates, mosaic.split_ratio)?
            {
                image = composed;
                let split_x = mosaic.split_ratio * output_size.width as f32;
                if let Some(primary) = sources.first_mut() {
                    primary.region = Region::columns(output_size, 0.0, split_x);
                }
                sources.push(Source {
                    region: Region::columns(output_size, split_x, output_size.width as f32),
                    ..partner
                });
            }
        }

        if let Some(seed) = plan.noise_seed {
            let aug = &self.config.augment;
            let mut noise_rng = StdRng::seed_from_u64(seed);
            add_gaussian_noise(&mut image, aug.noise_mean, aug.noise_std, &mut noise_rng)?;
        }
        if let Some(factors) = &plan.color {
            color_jitter(&mut image, factors);
        }

        let input_tf = AffineTransform::from_center_size(center, size, self.config.input_size)?;
        let output_tf = AffineTransform::from_center_size(center, size, output_size)?;

        let mut input = Image::from_size_val(self.config.input_size, 0.0)?;
        warp_affine_inverse(&image, &mut input, input_tf.inverse(), InterpolationMode::Bilinear)?;

        let image_size = if train {
            let ImageSize { width, height } = self.config.input_size;
            [width as f32, height as f32]
        } else {
            size
        };
        let meta = InferenceTarget {
            image_size,
            trans_mat: output_tf.to_homogeneous(),
            calib: calib.to_homogeneous(),
        };

        let target = if train {
            let buffers = TargetBuffers::new(
                self.config.detect_classes.len(),
                self.config.max_objects,
                output_size,
            )?;
            let mut assembler = TargetAssembler::new(buffers, plan.is_jittered(), plan.flip);
            for source in &sources {
                self.encode_source(&frame_id, source, &output_tf, plan.flip, &mut assembler);
            }

            if let Some(sink) = &self.debug_sink {
                let vis = render_debug(&image, &output_tf, output_size, assembler.keypoints())?;
                if let Err(e) = sink.write(&frame_id, &vis) {
                    warn!("debug sink failed for frame {frame_id}: {e}");
                }
            }

            SampleTarget::Train(TrainTarget {
                meta,
                buffers: assembler.finish(),
            })
        } else {
            SampleTarget::Inference(meta)
        };

        let (image, target) = match &self.transforms {
            Some(t) => apply_checked(t.as_ref(), input, target)?,
            None => (input, target),
        };

        Ok(Sample {
            frame_id,
            image,
            target,
        })
    }

    /// Tries the partner candidates in order; returns the first whose image matches the
    /// primary resolution, spliced at `split_ratio` of the width.
    fn compose_mosaic(
        &self,
        primary: &Image<f32, 3>,
        view: View,
        candidates: &[usize],
        split_ratio: f32,
    ) -> Result<Option<(Source, Image<f32, 3>)>, DatasetError> {
        for &candidate in candidates {
            let partner = self.load_image(candidate, view)?;
            if partner.size() != primary.size() {
                debug!(
                    "mosaic partner {candidate} has size {}, expected {}",
                    partner.size(),
                    primary.size()
                );
                continue;
            }

            let stereo = self.load_calibration(candidate)?;
            let calib = match view {
                View::Left => stereo.left,
                View::Right => stereo.right,
            };
            let split_col = (split_ratio * primary.width() as f32) as usize;
            let composed = splice_columns(primary, &partner, split_col)?;

            let source = Source {
                annotations: self.load_annotations(candidate)?,
                calib,
                region: Region::full(self.config.output_size()),
            };
            return Ok(Some((source, composed)));
        }

        warn!(
            "no mosaic partner among {:?} matches size {}, keeping the primary image",
            candidates,
            primary.size()
        );
        Ok(None)
    }

    fn encode_source(
        &self,
        frame_id: &str,
        source: &Source,
        output_tf: &AffineTransform,
        flipped: bool,
        assembler: &mut TargetAssembler,
    ) {
        let encoder = LabelEncoder::new(
            &source.calib,
            output_tf,
            self.config.output_size(),
            &self.config.detect_classes,
            flipped,
            self.config.min_overlap,
        );

        for ann in &source.annotations {
            let Some(obj) = encoder.encode(ann) else {
                continue;
            };
            if !source.region.contains(obj.keypoint) {
                debug!(
                    "frame {frame_id}: {} at {:?} outside region {:?}",
                    obj.class, obj.keypoint, source.region
                );
                continue;
            }
            if !assembler.push(&obj) {
                debug!(
                    "frame {frame_id}: dropping {} at {:?}, all {} slots taken",
                    obj.class,
                    obj.keypoint,
                    assembler.len()
                );
            }
        }
    }
}

/// Decodes an image file into RGB floats in `[0, 255]`.
pub fn read_image_rgb(path: impl AsRef<Path>) -> Result<Image<f32, 3>, DatasetError> {
    let rgb = image::open(path)?.into_rgb8();
    let size = ImageSize {
        width: rgb.width() as usize,
        height: rgb.height() as usize,
    };
    let image = Image::<u8, 3>::new(size, rgb.into_raw())?;
    Ok(image.cast()?)
}

fn render_debug(
    image: &Image<f32, 3>,
    output_tf: &AffineTransform,
    output_size: ImageSize,
    keypoints: &[[i32; 2]],
) -> Result<Image<u8, 3>, DatasetError> {
    let mut grid = Image::from_size_val(output_size, 0.0)?;
    warp_affine_inverse(image, &mut grid, output_tf.inverse(), InterpolationMode::Nearest)?;

    let mut vis = grid.map(|&v| u8::from_f32(v));
    for &[x, y] in keypoints {
        draw_filled_circle(&mut vis, (x as i64, y as i64), KEYPOINT_RADIUS, KEYPOINT_COLOR);
    }
    Ok(vis)
}
