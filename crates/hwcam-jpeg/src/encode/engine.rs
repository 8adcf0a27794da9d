//! Compression engine: one complete encoder pass into a bounded sink.
//!
//! Encoder configuration is fixed: three components in YCbCr, raw
//! pre-subsampled input with 2x2 luma and 1x1 chroma sampling (4:2:0), and
//! the fast integer DCT. Every fatal encoder condition surfaces as a
//! [`CodecError`] that unwinds to the single recovery point in
//! [`compress_planar`], where the session is dropped and the failure is
//! reported as [`CompressError::EncoderFatalFailure`].

use std::io::Write;

use tracing::{debug, error};

use super::feeder::feed_rows;
use super::raw::{CodecError, RawEncoder, MARKER_APP1};
use crate::error::CompressError;
use crate::output::BoundedSink;
use crate::yuv::PlanarImage;

/// Compress `image` into `sink` at `quality` (1-100).
///
/// A non-empty `app1` payload is written as an APP1 marker right after the
/// stream header. Returns the number of bytes the stream occupies in the
/// sink.
///
/// # Errors
///
/// - `UnsupportedChromaLayout` if the image's chroma step is not 1; no
///   encoder state is created in that case
/// - `EncoderFatalFailure` for any encoder abort, including running out of
///   sink capacity
pub fn compress_planar(
    image: &PlanarImage<'_>,
    quality: u8,
    app1: Option<&[u8]>,
    sink: &mut BoundedSink<'_>,
) -> Result<usize, CompressError> {
    if !image.is_fully_planar() {
        error!(chroma_step = image.chroma_step, "jpeg: interleaved chroma is not supported");
        return Err(CompressError::UnsupportedChromaLayout(image.chroma_step));
    }

    match run_pass(image, quality, app1, &mut *sink) {
        Ok(()) => {
            debug!(
                width = image.size.width,
                height = image.size.height,
                quality,
                bytes = sink.consumed(),
                "jpeg: compressed"
            );
            Ok(sink.consumed())
        }
        Err(err) => {
            error!(%err, capacity = sink.capacity(), "jpeg: compression failed");
            Err(CompressError::EncoderFatalFailure(err.to_string()))
        }
    }
}

fn run_pass<W: Write>(
    image: &PlanarImage<'_>,
    quality: u8,
    app1: Option<&[u8]>,
    writer: W,
) -> Result<(), CodecError> {
    let mut encoder = RawEncoder::start(writer, image.size, quality)?;

    if let Some(payload) = app1.filter(|payload| !payload.is_empty()) {
        encoder.write_marker(MARKER_APP1, payload)?;
    }

    feed_rows(image, &mut encoder)?;
    encoder.finish()?;
    Ok(())
}
