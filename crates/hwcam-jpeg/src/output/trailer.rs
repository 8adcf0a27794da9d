//! The JPEG blob trailer at the end of a fixed-capacity camera buffer.
//!
//! Layout (8 bytes, little-endian, matching `camera3_jpeg_blob`):
//!
//! | offset | size | field |
//! |---|---|---|
//! | 0 | 2 | blob id, always [`JPEG_BLOB_ID`] |
//! | 2 | 2 | padding, zero |
//! | 4 | 4 | JPEG stream length in bytes |
//!
//! The record sits at `capacity - TRAILER_SIZE`; the stream occupies
//! `[0, size)` of the same buffer.

use thiserror::Error;

/// Blob id identifying a compressed-image trailer.
pub const JPEG_BLOB_ID: u16 = 0x00FF;

/// Size in bytes of the serialized trailer.
pub const TRAILER_SIZE: usize = 8;

/// Errors writing a trailer into a destination buffer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrailerError {
    /// Buffer cannot hold the trailer after the payload.
    #[error("buffer of {capacity} bytes cannot hold a {size}-byte payload and trailer")]
    DoesNotFit { capacity: usize, size: u32 },
}

/// The fixed-size record carrying the real payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegBlobTrailer {
    /// Length of the JPEG stream at the start of the buffer.
    pub size: u32,
}

impl JpegBlobTrailer {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    /// Serialize to the on-buffer byte layout.
    pub fn to_bytes(self) -> [u8; TRAILER_SIZE] {
        let mut out = [0u8; TRAILER_SIZE];
        out[0..2].copy_from_slice(&JPEG_BLOB_ID.to_le_bytes());
        out[4..8].copy_from_slice(&self.size.to_le_bytes());
        out
    }

    /// Write the trailer into the last [`TRAILER_SIZE`] bytes of `dest`.
    ///
    /// Fails if the payload would overlap the trailer.
    pub fn write_into(self, dest: &mut [u8]) -> Result<(), TrailerError> {
        let offset = dest
            .len()
            .checked_sub(TRAILER_SIZE)
            .filter(|&offset| self.size as usize <= offset)
            .ok_or(TrailerError::DoesNotFit {
                capacity: dest.len(),
                size: self.size,
            })?;

        dest[offset..].copy_from_slice(&self.to_bytes());
        Ok(())
    }

    /// Recover the trailer from a full blob buffer.
    ///
    /// Returns `None` if the buffer is too small, the blob id does not match,
    /// or the recorded size would overlap the trailer itself.
    pub fn read_from(buf: &[u8]) -> Option<Self> {
        let offset = buf.len().checked_sub(TRAILER_SIZE)?;
        let raw = &buf[offset..];

        let id = u16::from_le_bytes([raw[0], raw[1]]);
        if id != JPEG_BLOB_ID {
            return None;
        }

        let size = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
        if size as usize > offset {
            return None;
        }

        Some(Self { size })
    }

    /// The payload slice described by this trailer.
    pub fn payload<'a>(&self, buf: &'a [u8]) -> Option<&'a [u8]> {
        buf.get(..self.size as usize)
    }
}
