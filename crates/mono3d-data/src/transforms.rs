use mono3d_image::Image;
use mono3d_imgproc::normalize::normalize_mean_std;

use crate::error::DatasetError;
use crate::targets::SampleTarget;

/// Post-processing applied to every encoded sample.
///
/// Implementations may change values but must keep the target field set and array shapes.
pub trait SampleTransform: Send + Sync {
    /// Transforms an image and its target.
    fn apply(
        &self,
        image: Image<f32, 3>,
        target: SampleTarget,
    ) -> Result<(Image<f32, 3>, SampleTarget), DatasetError>;
}

/// Runs transforms in sequence.
#[derive(Default)]
pub struct Compose {
    transforms: Vec<Box<dyn SampleTransform>>,
}

impl Compose {
    /// Creates a pipeline from `transforms`, applied in order.
    pub fn new(transforms: Vec<Box<dyn SampleTransform>>) -> Self {
        Self { transforms }
    }

    /// Appends a transform.
    pub fn push(mut self, transform: impl SampleTransform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }
}

impl SampleTransform for Compose {
    fn apply(
        &self,
        image: Image<f32, 3>,
        target: SampleTarget,
    ) -> Result<(Image<f32, 3>, SampleTarget), DatasetError> {
        self.transforms
            .iter()
            .try_fold((image, target), |(image, target), t| t.apply(image, target))
    }
}

/// Per-channel `(x - mean) / std` on the image; the target is untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeMeanStd {
    /// Channel means.
    pub mean: [f32; 3],
    /// Channel standard deviations.
    pub std: [f32; 3],
}

impl NormalizeMeanStd {
    /// ImageNet statistics on the 0..255 range.
    pub fn imagenet() -> Self {
        Self {
            mean: [123.675, 116.28, 103.53],
            std: [58.395, 57.12, 57.375],
        }
    }
}

impl SampleTransform for NormalizeMeanStd {
    fn apply(
        &self,
        image: Image<f32, 3>,
        target: SampleTarget,
    ) -> Result<(Image<f32, 3>, SampleTarget), DatasetError> {
        let mut normalized = Image::from_size_val(image.size(), 0.0)?;
        normalize_mean_std(&image, &mut normalized, &self.mean, &self.std)?;
        Ok((normalized, target))
    }
}

/// Applies `transform` and checks it kept the target layout.
pub(crate) fn apply_checked(
    transform: &dyn SampleTransform,
    image: Image<f32, 3>,
    target: SampleTarget,
) -> Result<(Image<f32, 3>, SampleTarget), DatasetError> {
    let before = target.layout();
    let (image, target) = transform.apply(image, target)?;
    let after = target.layout();

    if before != after {
        return Err(DatasetError::TransformContract(format!(
            "expected {:?}, got {:?}",
            before, after
        )));
    }

    Ok((image, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::{InferenceTarget, TargetBuffers, TrainTarget};
    use approx::assert_relative_eq;
    use mono3d_image::ImageSize;

    fn train_target() -> Result<SampleTarget, DatasetError> {
        Ok(SampleTarget::Train(TrainTarget {
            meta: InferenceTarget {
                image_size: [16.0, 8.0],
                trans_mat: [[0.25, 0.0, 0.0], [0.0, 0.25, 0.0], [0.0, 0.0, 1.0]],
                calib: [[0.0; 4]; 4],
            },
            buffers: TargetBuffers::new(3, 4, ImageSize {
                width: 4,
                height: 2,
            })?,
        }))
    }

    fn image() -> Result<Image<f32, 3>, DatasetError> {
        Ok(Image::from_size_val(
            ImageSize {
                width: 16,
                height: 8,
            },
            128.0,
        )?)
    }

    struct DropSlot;

    impl SampleTransform for DropSlot {
        fn apply(
            &self,
            image: Image<f32, 3>,
            mut target: SampleTarget,
        ) -> Result<(Image<f32, 3>, SampleTarget), DatasetError> {
            if let SampleTarget::Train(t) = &mut target {
                t.buffers.regression.pop();
            }
            Ok((image, target))
        }
    }

    struct DropTargets;

    impl SampleTransform for DropTargets {
        fn apply(
            &self,
            image: Image<f32, 3>,
            target: SampleTarget,
        ) -> Result<(Image<f32, 3>, SampleTarget), DatasetError> {
            Ok((image, SampleTarget::Inference(target.meta().clone())))
        }
    }

    #[test]
    fn normalize_keeps_layout() -> Result<(), DatasetError> {
        let t = NormalizeMeanStd {
            mean: [128.0, 100.0, 0.0],
            std: [1.0, 2.0, 128.0],
        };
        let (out, _) = apply_checked(&t, image()?, train_target()?)?;
        assert_relative_eq!(out.as_slice()[0], 0.0);
        assert_relative_eq!(out.as_slice()[1], 14.0);
        assert_relative_eq!(out.as_slice()[2], 1.0);
        Ok(())
    }

    #[test]
    fn compose_runs_in_order() -> Result<(), DatasetError> {
        let t = Compose::default()
            .push(NormalizeMeanStd {
                mean: [128.0; 3],
                std: [1.0; 3],
            })
            .push(NormalizeMeanStd {
                mean: [-1.0; 3],
                std: [2.0; 3],
            });
        let (out, _) = apply_checked(&t, image()?, train_target()?)?;
        assert!(out.as_slice().iter().all(|&v| v == 0.5));
        Ok(())
    }

    #[test]
    fn contract_violations_detected() -> Result<(), DatasetError> {
        assert!(matches!(
            apply_checked(&DropSlot, image()?, train_target()?),
            Err(DatasetError::TransformContract(_))
        ));
        assert!(matches!(
            apply_checked(&DropTargets, image()?, train_target()?),
            Err(DatasetError::TransformContract(_))
        ));
        Ok(())
    }
}
