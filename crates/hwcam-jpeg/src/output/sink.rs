//! Bounded-capacity write target with byte accounting.

use std::io::{self, Write};

/// A write target over a caller-owned byte region.
///
/// Writes that do not fit in the remaining space are refused as a whole:
/// nothing is copied and an error is returned. The sink never truncates a
/// write and never touches memory past its capacity.
#[derive(Debug)]
pub struct BoundedSink<'a> {
    buf: &'a mut [u8],
    written: usize,
}

impl<'a> BoundedSink<'a> {
    /// Create a sink over the whole of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, written: 0 }
    }

    /// Total number of bytes this sink may hold.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes still free.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.written
    }

    /// Bytes written so far (`capacity - remaining`).
    pub fn consumed(&self) -> usize {
        self.written
    }

    /// The written prefix of the region.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.written]
    }
}

impl Write for BoundedSink<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.len() > self.remaining() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!(
                    "destination full: {} bytes requested, {} of {} free",
                    data.len(),
                    self.remaining(),
                    self.capacity()
                ),
            ));
        }

        let end = self.written + data.len();
        self.buf[self.written..end].copy_from_slice(data);
        self.written = end;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
