//! Geometric image transformations using affine warps.
//!
//! - Affine transform estimation from three point correspondences
//! - Affine transform inversion
//! - Image resampling through an affine transform
//!
//! # Examples
//!
//! Estimating the transform that maps a unit triangle onto a scaled one:
//!
//! ```
//! use mono3d_imgproc::warp::get_affine_transform;
//!
//! let src = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
//! let dst = [[1.0, 1.0], [3.0, 1.0], [1.0, 3.0]];
//! let m = get_affine_transform(&src, &dst).unwrap();
//! assert_eq!(m, [2.0, 0.0, 1.0, 0.0, 2.0, 1.0]);
//! ```

mod affine;

pub use affine::{
    get_affine_transform, invert_affine_transform, transform_point, warp_affine,
    warp_affine_inverse, WarpError,
};
