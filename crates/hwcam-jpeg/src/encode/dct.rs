//! Fast integer forward DCT and quantization.
//!
//! The transform is the Arai-Agui-Nakajima scaled DCT with 8-bit fixed-point
//! constants: it trades a little accuracy for throughput. Its outputs carry
//! the AAN scale factors, which are folded into the quantization divisors.

use super::tables::{AAN_SCALE_FACTORS, BLOCK_SIZE};

const CONST_BITS: u32 = 8;

const FIX_0_382683433: i32 = 98;
const FIX_0_541196100: i32 = 139;
const FIX_0_707106781: i32 = 181;
const FIX_1_306562965: i32 = 334;

#[inline]
fn multiply(value: i32, constant: i32) -> i32 {
    (value * constant) >> CONST_BITS
}

/// One 1-D AAN butterfly over eight elements `step` apart starting at `base`.
#[inline]
fn butterfly(data: &mut [i32; BLOCK_SIZE], base: usize, step: usize) {
    let at = |k: usize| base + k * step;

    let tmp0 = data[at(0)] + data[at(7)];
    let tmp7 = data[at(0)] - data[at(7)];
    let tmp1 = data[at(1)] + data[at(6)];
    let tmp6 = data[at(1)] - data[at(6)];
    let tmp2 = data[at(2)] + data[at(5)];
    let tmp5 = data[at(2)] - data[at(5)];
    let tmp3 = data[at(3)] + data[at(4)];
    let tmp4 = data[at(3)] - data[at(4)];

    // Even part
    let tmp10 = tmp0 + tmp3;
    let tmp13 = tmp0 - tmp3;
    let tmp11 = tmp1 + tmp2;
    let tmp12 = tmp1 - tmp2;

    data[at(0)] = tmp10 + tmp11;
    data[at(4)] = tmp10 - tmp11;

    let z1 = multiply(tmp12 + tmp13, FIX_0_707106781);
    data[at(2)] = tmp13 + z1;
    data[at(6)] = tmp13 - z1;

    // Odd part
    let tmp10 = tmp4 + tmp5;
    let tmp11 = tmp5 + tmp6;
    let tmp12 = tmp6 + tmp7;

    let z5 = multiply(tmp10 - tmp12, FIX_0_382683433);
    let z2 = multiply(tmp10, FIX_0_541196100) + z5;
    let z4 = multiply(tmp12, FIX_1_306562965) + z5;
    let z3 = multiply(tmp11, FIX_0_707106781);

    let z11 = tmp7 + z3;
    let z13 = tmp7 - z3;

    data[at(5)] = z13 + z2;
    data[at(3)] = z13 - z2;
    data[at(1)] = z11 + z4;
    data[at(7)] = z11 - z4;
}

/// In-place forward DCT of a block of level-shifted samples (natural order).
pub fn forward_dct(data: &mut [i32; BLOCK_SIZE]) {
    for row in 0..8 {
        butterfly(data, row * 8, 1);
    }
    for col in 0..8 {
        butterfly(data, col, 8);
    }
}

/// Quantization divisors matched to [`forward_dct`]'s output scaling.
#[derive(Debug, Clone)]
pub struct Quantizer {
    divisors: [i32; BLOCK_SIZE],
}

impl Quantizer {
    /// Build divisors from a natural-order quantization table.
    pub fn new(table: &[u16; BLOCK_SIZE]) -> Self {
        let mut divisors = [0i32; BLOCK_SIZE];
        for (i, divisor) in divisors.iter_mut().enumerate() {
            let (row, col) = (i / 8, i % 8);
            let aan = (AAN_SCALE_FACTORS[row] * AAN_SCALE_FACTORS[col] * 16384.0).round() as i64;
            // aan is 14-bit fixed point; the DCT output carries a further x8.
            let scaled = (i64::from(table[i]) * aan + (1 << 10)) >> 11;
            *divisor = scaled.max(1) as i32;
        }
        Self { divisors }
    }

    /// Round-to-nearest quantization of DCT output, natural order.
    pub fn quantize(&self, coefficients: &[i32; BLOCK_SIZE]) -> [i32; BLOCK_SIZE] {
        let mut out = [0i32; BLOCK_SIZE];
        for ((out, &value), &divisor) in out.iter_mut().zip(coefficients).zip(&self.divisors) {
            let magnitude = (value.abs() + (divisor >> 1)) / divisor;
            *out = if value < 0 { -magnitude } else { magnitude };
        }
        out
    }
}
