#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Source window to target resolution transforms.
pub mod affine;

/// Per-sample augmentation decisions.
pub mod augment;

/// Parallel batch encoding.
pub mod batch;

/// Dataset and augmentation configuration.
pub mod config;

/// The KITTI dataset and the per-sample encoding pipeline.
pub mod dataset;

/// Debug visualization sinks.
pub mod debug;

/// Projection of annotations into the output grid.
pub mod encoder;

/// Error types for the dataset pipeline.
pub mod error;

/// Gaussian heatmap rendering.
pub mod heatmap;

/// Fixed-capacity training target buffers.
pub mod targets;

/// Post-processing transforms.
pub mod transforms;

pub use crate::config::{DatasetConfig, Mode, Split};
pub use crate::dataset::{KittiDataset, Sample};
pub use crate::error::DatasetError;
pub use crate::targets::{NamedArray, SampleTarget};
