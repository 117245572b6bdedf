#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// horizontal composition of two images.
pub mod compose;

/// utilities to draw on images.
pub mod draw;

/// photometric image perturbations.
pub mod enhance;

/// image flipping module.
pub mod flip;

/// utilities for interpolation.
pub mod interpolation;

/// operations to normalize images.
pub mod normalize;

/// module containing parallization utilities.
pub mod parallel;

/// image geometric transformations module.
pub mod warp;
