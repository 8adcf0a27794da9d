//! hwcam-jpeg - YUV to JPEG blob compression for camera pipelines
//!
//! This crate turns a planar YCbCr 4:2:0 capture into the JPEG blob a camera
//! stream hands to its consumer: an EXIF-annotated baseline JPEG stream,
//! optionally carrying a scaled thumbnail, at the start of a fixed-capacity
//! buffer whose last bytes hold a trailer recording the stream length.

pub mod capture;
pub mod compress;
pub mod encode;
pub mod error;
pub mod metadata;
pub mod output;
pub mod yuv;

#[cfg(test)]
mod test_support;

pub use capture::{compress_jpeg, jpeg_max_size, GraphicBufferMapper};
pub use compress::compress_yuv;
pub use error::CompressError;
pub use metadata::{CaptureMetadata, ExifTags, GpsInfo, JpegSettings, MetadataView};
pub use output::{BoundedSink, JpegBlobTrailer, TRAILER_SIZE};
pub use yuv::{Dimensions, PlanarImage, Plane};
