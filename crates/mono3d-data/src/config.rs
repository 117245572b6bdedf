use std::path::{Path, PathBuf};

use mono3d_3d::ObjectClass;
use mono3d_image::ImageSize;
use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// The KITTI image sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    /// `ImageSets/train.txt`
    Train,
    /// `ImageSets/val.txt`
    Val,
    /// `ImageSets/trainval.txt`
    TrainVal,
    /// `ImageSets/test.txt`
    Test,
}

impl Split {
    /// The stem of the split file under `ImageSets/`.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::TrainVal => "trainval",
            Split::Test => "test",
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Whether samples carry full training targets or only the inference metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Augment and encode annotations into target buffers.
    Train,
    /// Resample only; annotations are not read.
    Inference,
}

/// Ranges the color jitter factors are drawn from, in steps of 0.1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorJitterRanges {
    /// Saturation factor range.
    pub saturation: (f32, f32),
    /// Brightness factor range.
    pub brightness: (f32, f32),
    /// Contrast factor range.
    pub contrast: (f32, f32),
    /// Sharpness factor range.
    pub sharpness: (f32, f32),
}

impl Default for ColorJitterRanges {
    fn default() -> Self {
        Self {
            saturation: (0.0, 3.0),
            brightness: (1.0, 2.0),
            contrast: (1.0, 2.0),
            sharpness: (0.0, 3.0),
        }
    }
}

/// Probabilities and ranges of the per-sample augmentations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Probability of mirroring the left view.
    pub flip_prob: f32,
    /// Probability of shift/scale jitter.
    pub jitter_prob: f32,
    /// Largest center shift as a fraction of the image size.
    pub shift: f32,
    /// Largest deviation of the scale factor from 1.
    pub scale: f32,
    /// Step of the discrete shift and scale grids.
    pub jitter_step: f32,
    /// Probability of using the right camera instead of the left.
    pub right_view_prob: f32,
    /// Probability of composing a two-image mosaic.
    pub mosaic_prob: f32,
    /// Range of the mosaic split fraction.
    pub mosaic_split_range: (f32, f32),
    /// Number of partner frames tried before the mosaic is abandoned.
    pub mosaic_max_attempts: usize,
    /// Probability of additive Gaussian noise.
    pub noise_prob: f32,
    /// Mean of the additive noise.
    pub noise_mean: f32,
    /// Standard deviation of the additive noise.
    pub noise_std: f32,
    /// Probability of color jitter.
    pub color_prob: f32,
    /// Color jitter factor ranges.
    pub color: ColorJitterRanges,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            flip_prob: 0.5,
            jitter_prob: 0.3,
            shift: 0.2,
            scale: 0.4,
            jitter_step: 0.1,
            right_view_prob: 0.0,
            mosaic_prob: 0.0,
            mosaic_split_range: (0.3, 0.7),
            mosaic_max_attempts: 3,
            noise_prob: 0.0,
            noise_mean: 0.2,
            noise_std: 0.3,
            color_prob: 0.0,
            color: ColorJitterRanges::default(),
        }
    }
}

impl AugmentConfig {
    /// A configuration that never augments.
    pub fn disabled() -> Self {
        Self {
            flip_prob: 0.0,
            jitter_prob: 0.0,
            right_view_prob: 0.0,
            mosaic_prob: 0.0,
            noise_prob: 0.0,
            color_prob: 0.0,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), DatasetError> {
        let probs = [
            ("flip_prob", self.flip_prob),
            ("jitter_prob", self.jitter_prob),
            ("right_view_prob", self.right_view_prob),
            ("mosaic_prob", self.mosaic_prob),
            ("noise_prob", self.noise_prob),
            ("color_prob", self.color_prob),
        ];
        for (name, p) in probs {
            if !(0.0..=1.0).contains(&p) {
                return Err(DatasetError::InvalidConfig(format!(
                    "{name} must be in [0, 1], got {p}"
                )));
            }
        }

        if self.shift < 0.0 || self.scale < 0.0 || self.scale >= 1.0 {
            return Err(DatasetError::InvalidConfig(format!(
                "shift must be >= 0 and scale in [0, 1), got {} and {}",
                self.shift, self.scale
            )));
        }
        if self.jitter_step <= 0.0 {
            return Err(DatasetError::InvalidConfig(format!(
                "jitter_step must be positive, got {}",
                self.jitter_step
            )));
        }

        let (lo, hi) = self.mosaic_split_range;
        if !(0.0 < lo && lo <= hi && hi < 1.0) {
            return Err(DatasetError::InvalidConfig(format!(
                "mosaic_split_range must satisfy 0 < lo <= hi < 1, got ({lo}, {hi})"
            )));
        }
        if self.mosaic_prob > 0.0 && self.mosaic_max_attempts == 0 {
            return Err(DatasetError::InvalidConfig(
                "mosaic_max_attempts must be at least 1".to_string(),
            ));
        }
        if self.noise_std < 0.0 {
            return Err(DatasetError::InvalidConfig(format!(
                "noise_std must be >= 0, got {}",
                self.noise_std
            )));
        }

        let ranges = [
            ("saturation", self.color.saturation),
            ("brightness", self.color.brightness),
            ("contrast", self.color.contrast),
            ("sharpness", self.color.sharpness),
        ];
        for (name, (lo, hi)) in ranges {
            if lo < 0.0 || lo > hi {
                return Err(DatasetError::InvalidConfig(format!(
                    "{name} range must satisfy 0 <= lo <= hi, got ({lo}, {hi})"
                )));
            }
        }

        Ok(())
    }
}

/// Configuration of a [`KittiDataset`](crate::dataset::KittiDataset).
///
/// # Example
///
/// ```
/// use mono3d_data::config::{DatasetConfig, Mode};
///
/// let config = DatasetConfig {
///     mode: Mode::Inference,
///     ..Default::default()
/// };
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.output_size().width, 320);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Root of the KITTI object `training` (or `testing`) directory.
    pub root: PathBuf,
    /// The image set to read.
    pub split: Split,
    /// Train or inference encoding.
    pub mode: Mode,
    /// The classes to detect; the heatmap channel of a class is its position in this list.
    pub detect_classes: Vec<ObjectClass>,
    /// Network input resolution.
    pub input_size: ImageSize,
    /// Stride between the input resolution and the output grid.
    pub down_ratio: usize,
    /// Capacity of the per-sample target buffers.
    pub max_objects: usize,
    /// Overlap target of the Gaussian radius heuristic.
    pub min_overlap: f32,
    /// Augmentation parameters, ignored in inference mode.
    pub augment: AugmentConfig,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("datasets/kitti/training"),
            split: Split::Train,
            mode: Mode::Train,
            detect_classes: ObjectClass::ALL.to_vec(),
            input_size: ImageSize {
                width: 1280,
                height: 384,
            },
            down_ratio: 4,
            max_objects: 30,
            min_overlap: 0.7,
            augment: AugmentConfig::default(),
        }
    }
}

impl DatasetConfig {
    /// Reads a configuration from a JSON file; missing fields take their default value.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.down_ratio == 0 {
            return Err(DatasetError::InvalidConfig(
                "down_ratio must be positive".to_string(),
            ));
        }
        let ImageSize { width, height } = self.input_size;
        if width == 0 || height == 0 || width % self.down_ratio != 0 || height % self.down_ratio != 0
        {
            return Err(DatasetError::InvalidConfig(format!(
                "input size {}x{} must be non-empty and divisible by {}",
                width, height, self.down_ratio
            )));
        }
        if self.detect_classes.is_empty() {
            return Err(DatasetError::InvalidConfig(
                "detect_classes must not be empty".to_string(),
            ));
        }
        if self.max_objects == 0 {
            return Err(DatasetError::InvalidConfig(
                "max_objects must be positive".to_string(),
            ));
        }
        if !(self.min_overlap > 0.0 && self.min_overlap < 1.0) {
            return Err(DatasetError::InvalidConfig(format!(
                "min_overlap must be in (0, 1), got {}",
                self.min_overlap
            )));
        }
        self.augment.validate()
    }

    /// Resolution of the output grid.
    pub fn output_size(&self) -> ImageSize {
        ImageSize {
            width: self.input_size.width / self.down_ratio.max(1),
            height: self.input_size.height / self.down_ratio.max(1),
        }
    }

    /// The heatmap channel of `class`, if it is detected.
    pub fn class_index(&self, class: ObjectClass) -> Option<usize> {
        self.detect_classes.iter().position(|&c| c == class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_is_valid() -> Result<(), DatasetError> {
        let config = DatasetConfig::default();
        config.validate()?;
        assert_eq!(
            config.output_size(),
            ImageSize {
                width: 320,
                height: 96
            }
        );
        assert_eq!(config.class_index(ObjectClass::Pedestrian), Some(2));
        Ok(())
    }

    #[test]
    fn class_index_follows_list_order() {
        let config = DatasetConfig {
            detect_classes: vec![ObjectClass::Pedestrian, ObjectClass::Car],
            ..Default::default()
        };
        assert_eq!(config.class_index(ObjectClass::Car), Some(1));
        assert_eq!(config.class_index(ObjectClass::Cyclist), None);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let bad_ratio = DatasetConfig {
            down_ratio: 3,
            ..Default::default()
        };
        assert!(matches!(
            bad_ratio.validate(),
            Err(DatasetError::InvalidConfig(_))
        ));

        let mut bad_prob = DatasetConfig::default();
        bad_prob.augment.flip_prob = 1.5;
        assert!(matches!(
            bad_prob.validate(),
            Err(DatasetError::InvalidConfig(_))
        ));

        let mut bad_range = DatasetConfig::default();
        bad_range.augment.mosaic_split_range = (0.7, 0.3);
        assert!(matches!(
            bad_range.validate(),
            Err(DatasetError::InvalidConfig(_))
        ));

        let no_classes = DatasetConfig {
            detect_classes: vec![],
            ..Default::default()
        };
        assert!(no_classes.validate().is_err());
    }

    #[test]
    fn from_json_file_partial() -> Result<(), DatasetError> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{
                "root": "/data/kitti",
                "split": "val",
                "mode": "inference",
                "detect_classes": ["Car"],
                "augment": {{ "mosaic_prob": 0.5 }}
            }}"#
        )?;

        let config = DatasetConfig::from_json_file(file.path())?;
        assert_eq!(config.root, PathBuf::from("/data/kitti"));
        assert_eq!(config.split, Split::Val);
        assert_eq!(config.mode, Mode::Inference);
        assert_eq!(config.detect_classes, vec![ObjectClass::Car]);
        assert_eq!(config.augment.mosaic_prob, 0.5);
        assert_eq!(config.augment.flip_prob, 0.5);
        assert_eq!(config.max_objects, 30);
        Ok(())
    }

    #[test]
    fn from_json_file_malformed() -> Result<(), DatasetError> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, "{{ \"down_ratio\": \"four\" }}")?;
        assert!(matches!(
            DatasetConfig::from_json_file(file.path()),
            Err(DatasetError::Config(_))
        ));
        Ok(())
    }
}
