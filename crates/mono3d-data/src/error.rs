use mono3d_3d::io::kitti::KittiError;
use mono3d_image::ImageError;
use mono3d_imgproc::enhance::EnhanceError;
use mono3d_imgproc::warp::WarpError;

/// An error type for the dataset pipeline.
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// Error reading a calibration, label or split file.
    #[error(transparent)]
    Kitti(#[from] KittiError),

    /// Error from the image container.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error estimating or applying an affine transform.
    #[error(transparent)]
    Warp(#[from] WarpError),

    /// Error from a photometric perturbation.
    #[error(transparent)]
    Enhance(#[from] EnhanceError),

    /// Error decoding or encoding an image file.
    #[error("failed to process image file: {0}")]
    ImageFile(#[from] image::ImageError),

    /// Error reading or creating files and directories.
    #[error("error reading file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing a configuration file.
    #[error("failed to parse config: {0}")]
    Config(#[from] serde_json::Error),

    /// The configuration holds values the pipeline cannot work with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The sample index is past the end of the split.
    #[error("sample index {0} out of range for {1} frames")]
    IndexOutOfRange(usize, usize),

    /// A post-processing transform changed the target field set or shapes.
    #[error("transform changed the target layout: {0}")]
    TransformContract(String),
}
