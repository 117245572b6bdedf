use std::path::{Path, PathBuf};

use mono3d_image::{Image, ImageError};

use crate::error::DatasetError;

/// Receives a visualization of every encoded training sample.
///
/// The image is at output-grid resolution with the accepted keypoints drawn in.
pub trait DebugSink: Send + Sync {
    /// Consumes the visualization of `frame_id`.
    fn write(&self, frame_id: &str, image: &Image<u8, 3>) -> Result<(), DatasetError>;
}

/// Writes visualizations as `<dir>/<frame_id>.png`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates the sink, creating `dir` if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The path written for `frame_id`.
    pub fn path_for(&self, frame_id: &str) -> PathBuf {
        self.dir.join(format!("{frame_id}.png"))
    }
}

impl DebugSink for DirectorySink {
    fn write(&self, frame_id: &str, image: &Image<u8, 3>) -> Result<(), DatasetError> {
        let (width, height) = (image.width() as u32, image.height() as u32);
        let buffer = image::RgbImage::from_raw(width, height, image.as_slice().to_vec())
            .ok_or(ImageError::InvalidChannelShape(
                image.as_slice().len(),
                image.width() * image.height() * 3,
            ))?;
        buffer.save(self.path_for(frame_id))?;
        Ok(())
    }
}
