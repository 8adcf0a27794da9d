//! Blob compression: the full pipeline from a locked YUV image to a
//! trailer-terminated JPEG blob.
//!
//! ```text
//! Init -> [thumbnail requested: Scale -> CompressThumbnail -> AttachThumbnail]
//!      -> SerializeExif -> CompressMain (EXIF in APP1) -> WriteTrailer -> Done
//! ```
//!
//! Any stage failing ends the call with that stage's error. Everything
//! allocated along the way (scaled thumbnail, thumbnail stream, serialized
//! EXIF) is owned by this call and dropped on every exit path.

use tracing::{debug, error};

use crate::encode::compress_planar;
use crate::error::CompressError;
use crate::metadata::{ExifContainer, JpegSettings, MetadataView, ThumbnailRequest};
use crate::output::{BoundedSink, JpegBlobTrailer, TRAILER_SIZE};
use crate::yuv::{scale_i420, PlanarImage};

/// Compress `image` into `dest` and terminate it with a blob trailer.
///
/// On success the first `S` bytes of `dest` hold a complete JPEG stream and
/// the last [`TRAILER_SIZE`] bytes hold a [`JpegBlobTrailer`] recording `S`,
/// which is also returned. On failure the contents of `dest` are
/// unspecified. Nothing is ever written past `dest.len()`.
///
/// The thumbnail pass borrows `dest` as scratch space before the main pass
/// overwrites it.
///
/// # Errors
///
/// - `UnsupportedChromaLayout` for interleaved chroma, before any other work
/// - `ExifBuildFailure` if the EXIF container cannot be built or serialized
/// - `InvalidThumbnailDimensions` / `ScalingFailure` from thumbnail scaling
/// - `ExifThumbnailAttachFailure` if the thumbnail stream cannot be attached
/// - `EncoderFatalFailure` if either encoder pass aborts, including when the
///   stream does not fit in `dest`
pub fn compress_yuv<M: MetadataView + ?Sized>(
    image: &PlanarImage<'_>,
    metadata: &M,
    dest: &mut [u8],
) -> Result<usize, CompressError> {
    if !image.is_fully_planar() {
        error!(chroma_step = image.chroma_step, "compress: interleaved chroma is not supported");
        return Err(CompressError::UnsupportedChromaLayout(image.chroma_step));
    }

    let mut exif = ExifContainer::new(&metadata.exif_tags(), image.size)?;
    let settings = JpegSettings::from_metadata(metadata);

    if let Some(request) = settings.thumbnail {
        let thumbnail = compress_thumbnail(image, request, dest)?;
        exif.attach_thumbnail(thumbnail)?;
    }

    let app1 = exif.serialize()?;

    let capacity = dest.len();
    let payload_capacity = capacity.saturating_sub(TRAILER_SIZE);
    let mut sink = BoundedSink::new(&mut dest[..payload_capacity]);
    let size = compress_planar(image, settings.quality, Some(app1.as_bytes()), &mut sink)?;

    let recorded = u32::try_from(size).map_err(|_| {
        CompressError::EncoderFatalFailure(format!("stream of {size} bytes exceeds the trailer range"))
    })?;
    JpegBlobTrailer::new(recorded).write_into(dest).map_err(|err| {
        error!(%err, "compress: trailer does not fit");
        CompressError::EncoderFatalFailure(err.to_string())
    })?;

    debug!(
        width = image.size.width,
        height = image.size.height,
        quality = settings.quality,
        thumbnail = settings.thumbnail.is_some(),
        exif_bytes = app1.as_bytes().len(),
        size,
        capacity,
        "compress: blob written"
    );
    Ok(size)
}

/// Scale and compress the thumbnail, using `scratch` as the encoder's
/// destination, and return a copy of the stream.
fn compress_thumbnail(
    image: &PlanarImage<'_>,
    request: ThumbnailRequest,
    scratch: &mut [u8],
) -> Result<Vec<u8>, CompressError> {
    let scaled = scale_i420(image, request.size)?;

    let mut sink = BoundedSink::new(scratch);
    let size = compress_planar(&scaled.as_planar(), request.quality, None, &mut sink)?;

    debug!(
        width = request.size.width,
        height = request.size.height,
        quality = request.quality,
        size,
        "compress: thumbnail compressed"
    );
    Ok(sink.written().to_vec())
}
