//! Training-target encoding for monocular 3D object detection on KITTI.

#[doc(inline)]
pub use mono3d_image as image;

#[doc(inline)]
pub use mono3d_imgproc as imgproc;

#[doc(inline)]
pub use mono3d_3d as k3d;

#[doc(inline)]
pub use mono3d_data as data;
