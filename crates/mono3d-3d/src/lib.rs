#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Oriented 3D boxes and their projection into the image.
pub mod box3d;

/// Projective camera calibration.
pub mod camera;

/// I/O utilities for reading annotation and calibration files.
pub mod io;

/// Object classes and 3D annotations.
pub mod object;

pub use box3d::{encode_label, Box3d, ProjectedBox};
pub use camera::ProjectionMatrix;
pub use object::{Annotation, ObjectClass};
