//! Planar YUV 4:2:0 image handling.
//!
//! This module provides:
//! - Borrowed, bounds-checked plane descriptors over mapped camera buffers
//! - An owned contiguous I420 buffer for generated images
//! - Bilinear rescaling of a planar image (thumbnail generation)

mod planar;
mod scale;

pub use planar::{Dimensions, I420Buffer, PlanarImage, Plane, PlaneError};
pub use scale::{scale_i420, SCALE_ERROR_INVALID_ARGUMENT};
