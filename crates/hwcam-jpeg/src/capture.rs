//! Capture-side entry point: lock the source image and the blob buffer,
//! compress, and release both locks.
//!
//! Buffer mapping is owned by the platform through [`GraphicBufferMapper`].
//! Each acquired lock is held by a guard that releases it when dropped, so
//! every exit path unlocks exactly the mappings that were acquired, once.

use tracing::error;

use crate::compress::compress_yuv;
use crate::error::CompressError;
use crate::metadata::MetadataView;
use crate::output::TRAILER_SIZE;
use crate::yuv::{Dimensions, PlanarImage};

/// Platform graphics-buffer mapper.
///
/// A successful lock yields the CPU view of the buffer together with a
/// token; the token is handed back to [`unlock`](Self::unlock) exactly once.
pub trait GraphicBufferMapper {
    /// A graphics buffer owned by the caller.
    type Buffer;
    /// Proof of one outstanding lock.
    type Token;

    /// Lock `buffer` for reading as planar YCbCr of `size`.
    fn lock_ycbcr<'b>(
        &self,
        buffer: &'b Self::Buffer,
        size: Dimensions,
    ) -> Option<(PlanarImage<'b>, Self::Token)>;

    /// Lock `buffer` for writing as an opaque blob.
    fn lock_blob<'b>(&self, buffer: &'b mut Self::Buffer) -> Option<(&'b mut [u8], Self::Token)>;

    fn unlock(&self, token: Self::Token);
}

/// Releases one lock on drop.
struct LockGuard<'m, M: GraphicBufferMapper> {
    mapper: &'m M,
    token: Option<M::Token>,
}

impl<'m, M: GraphicBufferMapper> LockGuard<'m, M> {
    fn new(mapper: &'m M, token: M::Token) -> Self {
        Self {
            mapper,
            token: Some(token),
        }
    }
}

impl<M: GraphicBufferMapper> Drop for LockGuard<'_, M> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            self.mapper.unlock(token);
        }
    }
}

/// Compress the image in `image_buffer` into `blob_buffer`.
///
/// Returns the JPEG stream length recorded in the blob trailer.
///
/// # Errors
///
/// `BufferLockFailure` if either buffer cannot be locked, otherwise any error
/// from [`compress_yuv`].
pub fn compress_jpeg<M, T>(
    mapper: &M,
    image_buffer: &M::Buffer,
    blob_buffer: &mut M::Buffer,
    size: Dimensions,
    metadata: &T,
) -> Result<usize, CompressError>
where
    M: GraphicBufferMapper,
    T: MetadataView + ?Sized,
{
    let (image, token) = mapper.lock_ycbcr(image_buffer, size).ok_or_else(|| {
        error!(width = size.width, height = size.height, "capture: failed to lock image buffer");
        CompressError::BufferLockFailure("image")
    })?;
    let _image_lock = LockGuard::new(mapper, token);

    let (blob, token) = mapper.lock_blob(blob_buffer).ok_or_else(|| {
        error!("capture: failed to lock blob buffer");
        CompressError::BufferLockFailure("blob")
    })?;
    let _blob_lock = LockGuard::new(mapper, token);

    compress_yuv(&image, metadata, blob)
}

/// Blob buffer size to allocate for a JPEG stream of `size`.
pub fn jpeg_max_size(size: Dimensions) -> usize {
    size.pixel_count() + TRAILER_SIZE
}
