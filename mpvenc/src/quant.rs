//! Quantisation laws for intra and inter tiles, and the matching MPEG-2
//! inverse quantisation used on the reconstruction path.
//!
//! Forward input is the output of [`crate::dct::forward_dct`] (four fractional
//! bits). Inverse output is at the orthonormal integer scale consumed by
//! [`crate::dct::inverse_dct`].

use crate::dct::{COEFF_FRACTION_BITS, round_div};

pub const MIN_Q_LEVEL: u8 = 1;
pub const MAX_Q_LEVEL: u8 = 4;

pub const LEVEL_MIN: i32 = -2047;
pub const LEVEL_MAX: i32 = 2047;

/// 11-bit intra DC, stored relative to mid-gray.
pub const INTRA_DC_MIN: i32 = -1024;
pub const INTRA_DC_MAX: i32 = 1023;

const DEQUANT_MIN: i32 = -2048;
const DEQUANT_MAX: i32 = 2047;

/// Weight of the default non-intra matrix (flat).
const NON_INTRA_WEIGHT: i32 = 16;

/// Default intra quantiser matrix, raster order.
#[rustfmt::skip]
pub const INTRA_QUANT_MATRIX: [i32; 64] = [
     8, 16, 19, 22, 26, 27, 29, 34,
    16, 16, 22, 24, 27, 29, 34, 37,
    19, 22, 26, 27, 29, 34, 34, 38,
    22, 22, 26, 27, 29, 34, 37, 40,
    22, 26, 27, 29, 32, 35, 40, 48,
    26, 27, 29, 32, 35, 40, 48, 58,
    26, 27, 29, 34, 38, 46, 56, 69,
    27, 29, 35, 38, 46, 56, 69, 83,
];

/// Linear quantiser scale for a quantisation level: `2^q_level`.
pub fn quantiser_scale(q_level: u8) -> i32 {
    1 << q_level
}

/// `quantiser_scale_code` written in slice headers. With the linear scale
/// type the decoder doubles it back to [`quantiser_scale`].
pub fn quantiser_scale_code(q_level: u8) -> u8 {
    1 << (q_level - 1)
}

pub fn quantize_intra(coeffs: &[i32; 64], q_level: u8) -> [i32; 64] {
    let scale = quantiser_scale(q_level);
    let mut out = [0i32; 64];
    out[0] = round_div(coeffs[0], 1 << COEFF_FRACTION_BITS).clamp(INTRA_DC_MIN, INTRA_DC_MAX);
    for i in 1..64 {
        out[i] = round_div(coeffs[i], INTRA_QUANT_MATRIX[i] * scale).clamp(LEVEL_MIN, LEVEL_MAX);
    }
    out
}

pub fn quantize_inter(coeffs: &[i32; 64], q_level: u8) -> [i32; 64] {
    let divisor = (1 << COEFF_FRACTION_BITS) * quantiser_scale(q_level);
    let mut out = [0i32; 64];
    for (o, &c) in out.iter_mut().zip(coeffs.iter()) {
        *o = round_div(c, divisor).clamp(LEVEL_MIN, LEVEL_MAX);
    }
    out
}

pub fn dequantize_intra(levels: &[i32; 64], q_level: u8) -> [i32; 64] {
    let scale = quantiser_scale(q_level);
    let mut out = [0i32; 64];
    out[0] = levels[0];
    for i in 1..64 {
        out[i] = (2 * levels[i] * INTRA_QUANT_MATRIX[i] * scale / 32).clamp(DEQUANT_MIN, DEQUANT_MAX);
    }
    mismatch_control(&mut out);
    out
}

pub fn dequantize_inter(levels: &[i32; 64], q_level: u8) -> [i32; 64] {
    let scale = quantiser_scale(q_level);
    let mut out = [0i32; 64];
    for (o, &q) in out.iter_mut().zip(levels.iter()) {
        if q != 0 {
            *o = ((2 * q + q.signum()) * NON_INTRA_WEIGHT * scale / 32).clamp(DEQUANT_MIN, DEQUANT_MAX);
        }
    }
    mismatch_control(&mut out);
    out
}

/// Makes the coefficient sum odd by toggling the lowest bit of the last
/// coefficient. The intra DC offset of 1024 is even, so parity is the same
/// whether DC is taken relative to mid-gray or not.
fn mismatch_control(coeffs: &mut [i32; 64]) {
    let sum: i32 = coeffs.iter().sum();
    if sum & 1 == 0 {
        if coeffs[63] & 1 != 0 {
            coeffs[63] -= 1;
        } else {
            coeffs[63] += 1;
        }
    }
}
