//! Baseline JPEG encoder fed with pre-subsampled planar rows.
//!
//! The session writes `SOI` and the JFIF header on creation, accepts
//! application markers until the first row group arrives, then emits
//! `DQT`/`SOF0`/`DHT`/`SOS` and entropy-codes one 16-row MCU band per
//! [`RawEncoder::write_raw_data`] call. [`RawEncoder::finish`] consumes the
//! session, so a session can never be reused after completing or failing.

use std::io::{self, Write};

use thiserror::Error;

use super::dct::{forward_dct, Quantizer};
use super::huffman::{encode_block, BitWriter, DerivedTable};
use super::tables::{
    scaled_quant_table, HuffmanSpec, BLOCK_SIZE, STD_CHROMA_AC, STD_CHROMA_DC, STD_CHROMA_QUANT,
    STD_LUMA_AC, STD_LUMA_DC, STD_LUMA_QUANT, ZIGZAG,
};
use crate::yuv::Dimensions;

/// Luma rows per MCU band (vertical sampling factor 2 x 8).
pub const MCU_ROWS: usize = 16;

/// Chroma rows per MCU band.
pub const CHROMA_MCU_ROWS: usize = MCU_ROWS / 2;

/// Largest payload an application marker can carry.
pub const MAX_MARKER_PAYLOAD: usize = 65533;

/// Largest dimension a frame header can declare.
const MAX_DIMENSION: u32 = 65535;

/// Encoded bytes are buffered up to this size before reaching the writer.
const FLUSH_THRESHOLD: usize = 4096;

pub const MARKER_SOI: u8 = 0xD8;
pub const MARKER_EOI: u8 = 0xD9;
pub const MARKER_SOF0: u8 = 0xC0;
pub const MARKER_DHT: u8 = 0xC4;
pub const MARKER_DQT: u8 = 0xDB;
pub const MARKER_SOS: u8 = 0xDA;
pub const MARKER_APP0: u8 = 0xE0;
pub const MARKER_APP1: u8 = 0xE1;

/// Fatal encoder conditions. Any of these ends the session.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("image has no pixels")]
    EmptyImage,

    #[error("image {width}x{height} exceeds the 65535-pixel frame limit")]
    ImageTooLarge { width: u32, height: u32 },

    #[error("marker payload of {0} bytes exceeds 65533")]
    MarkerTooLong(usize),

    #[error("marker written after scan data started")]
    MarkerAfterScan,

    #[error("{plane} row {row} is not available")]
    MissingRow { plane: &'static str, row: usize },

    #[error("{plane} row has {actual} samples, expected at least {expected}")]
    ShortRow {
        plane: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("all {0} scanlines have already been written")]
    TooManyScanlines(u32),

    #[error("only {written} of {height} scanlines were written")]
    TooFewScanlines { written: u32, height: u32 },

    #[error("destination write failed: {0}")]
    Destination(#[from] io::Error),
}

/// One MCU band of borrowed rows: 16 luma rows and 8 rows of each chroma plane.
#[derive(Debug, Clone, Copy)]
pub struct RowGroup<'a> {
    pub luma: [&'a [u8]; MCU_ROWS],
    pub cb: [&'a [u8]; CHROMA_MCU_ROWS],
    pub cr: [&'a [u8]; CHROMA_MCU_ROWS],
}

/// Coding tables for one class of component.
#[derive(Debug, Clone)]
struct ComponentTables {
    quant: [u16; BLOCK_SIZE],
    quantizer: Quantizer,
    dc: DerivedTable,
    ac: DerivedTable,
}

impl ComponentTables {
    fn new(base: &[u16; BLOCK_SIZE], quality: u8, dc: &HuffmanSpec, ac: &HuffmanSpec) -> Self {
        let quant = scaled_quant_table(base, quality);
        Self {
            quantizer: Quantizer::new(&quant),
            quant,
            dc: DerivedTable::new(dc),
            ac: DerivedTable::new(ac),
        }
    }
}

/// An active 4:2:0 YCbCr baseline encoding session.
pub struct RawEncoder<W: Write> {
    writer: W,
    bits: BitWriter,
    size: Dimensions,
    luma: ComponentTables,
    chroma: ComponentTables,
    predictors: [i32; 3],
    next_scanline: u32,
    scan_started: bool,
}

impl<W: Write> RawEncoder<W> {
    /// Validate the frame and write `SOI` plus the JFIF header.
    pub fn start(writer: W, size: Dimensions, quality: u8) -> Result<Self, CodecError> {
        if size.is_empty() {
            return Err(CodecError::EmptyImage);
        }
        if size.width > MAX_DIMENSION || size.height > MAX_DIMENSION {
            return Err(CodecError::ImageTooLarge {
                width: size.width,
                height: size.height,
            });
        }

        let mut encoder = Self {
            writer,
            bits: BitWriter::new(),
            size,
            luma: ComponentTables::new(&STD_LUMA_QUANT, quality, &STD_LUMA_DC, &STD_LUMA_AC),
            chroma: ComponentTables::new(&STD_CHROMA_QUANT, quality, &STD_CHROMA_DC, &STD_CHROMA_AC),
            predictors: [0; 3],
            next_scanline: 0,
            scan_started: false,
        };

        encoder.bits.put_bytes(&[0xFF, MARKER_SOI]);
        encoder.put_segment(
            MARKER_APP0,
            &[b'J', b'F', b'I', b'F', 0, 1, 1, 0, 0, 1, 0, 1, 0, 0],
        );
        Ok(encoder)
    }

    pub fn image_height(&self) -> u32 {
        self.size.height
    }

    /// Luma rows consumed so far; advances by [`MCU_ROWS`] per band and may
    /// overshoot the image height on the last band.
    pub fn next_scanline(&self) -> u32 {
        self.next_scanline
    }

    /// Emit an application marker between the JFIF header and the frame.
    pub fn write_marker(&mut self, marker: u8, payload: &[u8]) -> Result<(), CodecError> {
        if self.scan_started {
            return Err(CodecError::MarkerAfterScan);
        }
        if payload.len() > MAX_MARKER_PAYLOAD {
            return Err(CodecError::MarkerTooLong(payload.len()));
        }
        self.put_segment(marker, payload);
        Ok(())
    }

    /// Encode one band of MCUs from `group`.
    pub fn write_raw_data(&mut self, group: &RowGroup<'_>) -> Result<(), CodecError> {
        if self.next_scanline >= self.size.height {
            return Err(CodecError::TooManyScanlines(self.size.height));
        }

        let width = self.size.width as usize;
        let chroma_width = self.size.chroma().width as usize;
        check_rows("luma", &group.luma, width)?;
        check_rows("cb", &group.cb, chroma_width)?;
        check_rows("cr", &group.cr, chroma_width)?;

        if !self.scan_started {
            self.write_frame_headers();
            self.scan_started = true;
        }

        let mcus_per_row = width.div_ceil(MCU_ROWS);
        for mcu in 0..mcus_per_row {
            let x = mcu * MCU_ROWS;
            for (rows, dx) in [(0, 0), (0, 8), (8, 0), (8, 8)] {
                let block = load_block(&group.luma[rows..rows + 8], x + dx, width);
                encode_component(&mut self.bits, &block, &mut self.predictors[0], &self.luma);
            }

            let cx = mcu * CHROMA_MCU_ROWS;
            let block = load_block(&group.cb, cx, chroma_width);
            encode_component(&mut self.bits, &block, &mut self.predictors[1], &self.chroma);
            let block = load_block(&group.cr, cx, chroma_width);
            encode_component(&mut self.bits, &block, &mut self.predictors[2], &self.chroma);
        }

        self.next_scanline += MCU_ROWS as u32;

        if self.bits.pending() >= FLUSH_THRESHOLD {
            self.flush()?;
        }
        Ok(())
    }

    /// Close the scan, write `EOI`, flush everything and hand back the writer.
    pub fn finish(mut self) -> Result<W, CodecError> {
        if self.next_scanline < self.size.height {
            return Err(CodecError::TooFewScanlines {
                written: self.next_scanline,
                height: self.size.height,
            });
        }

        self.bits.pad_to_byte();
        self.bits.put_bytes(&[0xFF, MARKER_EOI]);
        self.flush()?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn flush(&mut self) -> Result<(), CodecError> {
        let bytes = self.bits.take();
        self.writer.write_all(&bytes)?;
        Ok(())
    }

    fn put_segment(&mut self, marker: u8, payload: &[u8]) {
        let length = (payload.len() + 2) as u16;
        self.bits.put_bytes(&[0xFF, marker]);
        self.bits.put_bytes(&length.to_be_bytes());
        self.bits.put_bytes(payload);
    }

    fn write_frame_headers(&mut self) {
        for (id, quant) in [(0u8, self.luma.quant), (1u8, self.chroma.quant)] {
            let mut payload = Vec::with_capacity(1 + BLOCK_SIZE);
            payload.push(id);
            payload.extend(ZIGZAG.iter().map(|&i| quant[i] as u8));
            self.put_segment(MARKER_DQT, &payload);
        }

        let [h_hi, h_lo] = (self.size.height as u16).to_be_bytes();
        let [w_hi, w_lo] = (self.size.width as u16).to_be_bytes();
        self.put_segment(
            MARKER_SOF0,
            &[
                8, h_hi, h_lo, w_hi, w_lo, 3, //
                1, 0x22, 0, //
                2, 0x11, 1, //
                3, 0x11, 1,
            ],
        );

        for (class_id, spec) in [
            (0x00, &STD_LUMA_DC),
            (0x10, &STD_LUMA_AC),
            (0x01, &STD_CHROMA_DC),
            (0x11, &STD_CHROMA_AC),
        ] {
            let mut payload = Vec::with_capacity(17 + spec.values.len());
            payload.push(class_id);
            payload.extend_from_slice(&spec.bits);
            payload.extend_from_slice(spec.values);
            self.put_segment(MARKER_DHT, &payload);
        }

        self.put_segment(MARKER_SOS, &[3, 1, 0x00, 2, 0x11, 3, 0x11, 0, 63, 0]);
    }
}

fn check_rows(plane: &'static str, rows: &[&[u8]], expected: usize) -> Result<(), CodecError> {
    match rows.iter().find(|row| row.len() < expected) {
        Some(row) => Err(CodecError::ShortRow {
            plane,
            expected,
            actual: row.len(),
        }),
        None => Ok(()),
    }
}

/// Level-shifted 8x8 block at column `x`, repeating the last real column
/// past `width`.
fn load_block(rows: &[&[u8]], x: usize, width: usize) -> [i32; BLOCK_SIZE] {
    let mut block = [0i32; BLOCK_SIZE];
    for (r, row) in rows.iter().take(8).enumerate() {
        for c in 0..8 {
            let sample = row[(x + c).min(width - 1)];
            block[r * 8 + c] = i32::from(sample) - 128;
        }
    }
    block
}

fn encode_component(
    bits: &mut BitWriter,
    block: &[i32; BLOCK_SIZE],
    predictor: &mut i32,
    tables: &ComponentTables,
) {
    let mut coefficients = *block;
    forward_dct(&mut coefficients);
    let quantized = tables.quantizer.quantize(&coefficients);
    encode_block(bits, &quantized, predictor, &tables.dc, &tables.ac);
}
