//! Sampling of images at sub-pixel positions.

/// Grid generation and coordinate mapping utilities.
pub mod grid;

pub(crate) mod interpolate;

pub use interpolate::{interpolate_pixel, InterpolationMode};
