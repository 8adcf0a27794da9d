//! Error type for the blob compression pipeline.

use thiserror::Error;

use crate::yuv::Dimensions;

/// Every way a blob compression can fail.
///
/// Each variant is surfaced once, as the single outcome of the call; there
/// is no retry at this layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompressError {
    /// A source or destination buffer mapping could not be acquired.
    #[error("failed to lock {0} buffer")]
    BufferLockFailure(&'static str),

    /// Chroma samples are interleaved (chroma step != 1).
    #[error("unsupported chroma layout: chroma step {0}, only 1 is supported")]
    UnsupportedChromaLayout(usize),

    /// Requested thumbnail dimensions are not both even.
    #[error("invalid thumbnail dimensions {}x{}: both must be even", .0.width, .0.height)]
    InvalidThumbnailDimensions(Dimensions),

    /// The planar rescale failed with a numeric diagnostic code.
    #[error("planar YUV scaling failed with code {code}")]
    ScalingFailure { code: i32 },

    /// The block-transform encoder aborted.
    #[error("JPEG encoder failed: {0}")]
    EncoderFatalFailure(String),

    /// The EXIF container could not be built or serialized.
    #[error("failed to build EXIF data: {0}")]
    ExifBuildFailure(String),

    /// The compressed thumbnail could not be attached to the EXIF container.
    #[error("failed to attach EXIF thumbnail: {0}")]
    ExifThumbnailAttachFailure(String),
}
