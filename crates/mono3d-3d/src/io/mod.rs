/// KITTI object-detection text formats.
pub mod kitti;
