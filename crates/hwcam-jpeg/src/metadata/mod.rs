//! Capture metadata consumed by the compressor.
//!
//! [`view`] holds the read-only accessor the caller implements over its
//! metadata records plus the settings resolved from it. [`exif_container`]
//! turns the typed tag values into the serialized EXIF payload carried in
//! the APP1 marker.

mod exif_container;
mod view;

pub use exif_container::{ExifContainer, SerializedExif, EXIF_HEADER};
pub use view::{
    CaptureMetadata, ExifTags, GpsInfo, JpegSettings, MetadataView, ThumbnailRequest,
    DEFAULT_JPEG_QUALITY,
};
