//! Huffman entropy coding of quantized blocks.

use super::tables::{HuffmanSpec, BLOCK_SIZE, ZIGZAG};

/// Per-symbol code lookup derived from a [`HuffmanSpec`].
#[derive(Debug, Clone)]
pub struct DerivedTable {
    codes: [u16; 256],
    sizes: [u8; 256],
}

impl DerivedTable {
    /// Generate canonical codes (T.81 Annex C) for `spec`.
    pub fn new(spec: &HuffmanSpec) -> Self {
        let mut codes = [0u16; 256];
        let mut sizes = [0u8; 256];

        let mut code: u16 = 0;
        let mut k = 0usize;
        for (length, &count) in spec.bits.iter().enumerate() {
            for _ in 0..count {
                let symbol = spec.values[k] as usize;
                codes[symbol] = code;
                sizes[symbol] = (length + 1) as u8;
                code += 1;
                k += 1;
            }
            code <<= 1;
        }

        Self { codes, sizes }
    }

    /// `(code, length)` for `symbol`; length 0 means the symbol is absent.
    #[inline]
    pub fn lookup(&self, symbol: u8) -> (u16, u8) {
        (self.codes[symbol as usize], self.sizes[symbol as usize])
    }
}

/// Bit-level output with JPEG byte stuffing.
#[derive(Debug, Default)]
pub struct BitWriter {
    out: Vec<u8>,
    buffer: u64,
    bits: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `count` bits of `value`, most significant first.
    #[inline]
    pub fn put(&mut self, value: u32, count: u8) {
        if count == 0 {
            return;
        }
        let mask = (1u64 << count) - 1;
        self.buffer |= (u64::from(value) & mask) << (64 - u32::from(self.bits) - u32::from(count));
        self.bits += count;

        while self.bits >= 8 {
            let byte = (self.buffer >> 56) as u8;
            self.out.push(byte);
            if byte == 0xFF {
                self.out.push(0x00);
            }
            self.buffer <<= 8;
            self.bits -= 8;
        }
    }

    /// Pad the final partial byte with 1-bits.
    pub fn pad_to_byte(&mut self) {
        if self.bits > 0 {
            let padding = 8 - self.bits;
            self.put((1u32 << padding) - 1, padding);
        }
    }

    /// Append already-formatted bytes (markers); the bit buffer must be aligned.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        debug_assert_eq!(self.bits, 0, "marker bytes written mid-byte");
        self.out.extend_from_slice(bytes);
    }

    /// Completed bytes waiting to be flushed.
    pub fn pending(&self) -> usize {
        self.out.len()
    }

    /// Take the completed bytes, leaving any partial byte buffered.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out)
    }
}

/// Largest AC magnitude the baseline tables can code (category 10).
const MAX_AC_MAGNITUDE: i32 = 1023;

/// Largest DC difference the baseline tables can code (category 11).
const MAX_DC_DIFF: i32 = 2047;

/// Magnitude category and additional bits of a coefficient value.
#[inline]
fn categorize(value: i32) -> (u8, u32) {
    if value == 0 {
        return (0, 0);
    }
    let size = (32 - value.unsigned_abs().leading_zeros()) as u8;
    let bits = if value > 0 {
        value as u32
    } else {
        (value - 1) as u32 & ((1u32 << size) - 1)
    };
    (size, bits)
}

/// Entropy-code one quantized block (natural order) against `dc`/`ac`,
/// updating the component's DC predictor.
pub fn encode_block(
    writer: &mut BitWriter,
    block: &[i32; BLOCK_SIZE],
    predictor: &mut i32,
    dc: &DerivedTable,
    ac: &DerivedTable,
) {
    let diff = (block[0] - *predictor).clamp(-MAX_DC_DIFF, MAX_DC_DIFF);
    *predictor = block[0];

    let (size, bits) = categorize(diff);
    let (code, length) = dc.lookup(size);
    writer.put(u32::from(code), length);
    writer.put(bits, size);

    let mut run = 0u8;
    for &index in &ZIGZAG[1..] {
        let value = block[index].clamp(-MAX_AC_MAGNITUDE, MAX_AC_MAGNITUDE);
        if value == 0 {
            run += 1;
            continue;
        }

        while run >= 16 {
            let (code, length) = ac.lookup(0xF0);
            writer.put(u32::from(code), length);
            run -= 16;
        }

        let (size, bits) = categorize(value);
        let (code, length) = ac.lookup((run << 4) | size);
        writer.put(u32::from(code), length);
        writer.put(bits, size);
        run = 0;
    }

    if run > 0 {
        let (code, length) = ac.lookup(0x00);
        writer.put(u32::from(code), length);
    }
}
