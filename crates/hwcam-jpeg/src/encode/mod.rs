//! JPEG compression of planar YUV 4:2:0 images.
//!
//! This module provides:
//! - A baseline block-transform encoder fed with pre-subsampled rows
//! - The MCU feeder that hands it 16-row bands without reading out of bounds
//! - The compression engine that runs one pass into a bounded sink
//!
//! # Architecture
//!
//! All operations are synchronous and allocate per call; nothing is shared
//! between invocations except immutable tables.

mod dct;
mod engine;
mod feeder;
mod huffman;
mod raw;
mod tables;

pub use engine::compress_planar;
pub use feeder::{feed_rows, RawDataSink};
pub use raw::{CodecError, RawEncoder, RowGroup, CHROMA_MCU_ROWS, MARKER_APP1, MAX_MARKER_PAYLOAD, MCU_ROWS};
