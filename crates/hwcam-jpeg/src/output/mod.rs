//! Destination-side plumbing for compressed streams.
//!
//! A camera blob buffer has a fixed capacity that downstream consumers know,
//! but not the length of the JPEG stream inside it. This module provides:
//! - [`BoundedSink`]: a write target that never writes past its capacity
//! - [`JpegBlobTrailer`]: the fixed record at the buffer's end carrying the
//!   real stream length

mod sink;
mod trailer;

pub use sink::BoundedSink;
pub use trailer::{JpegBlobTrailer, JPEG_BLOB_ID, TRAILER_SIZE};
