//! Fixed-point 8x8 DCT.
//!
//! The basis is the orthonormal 8-point DCT scaled by 2^13. The forward
//! transform leaves four fractional bits on its output (coefficients are 16x
//! the orthonormal values); the inverse consumes integer coefficients at the
//! orthonormal scale. Every stage boundary rounds by adding half the divisor
//! before shifting.

const BASIS_BITS: u32 = 13;

/// 2^13 * cos(k*pi/16) for k in 0..=8.
const COS_Q13: [i32; 9] = [4096, 4017, 3784, 3406, 2896, 2276, 1567, 799, 0];
/// 2^13 / (2 * sqrt(2)).
const DC_Q13: i32 = 2896;

const FORWARD_ROW_SHIFT: u32 = 11;
const FORWARD_COL_SHIFT: u32 = 11;
const INVERSE_ROW_SHIFT: u32 = 11;
const INVERSE_COL_SHIFT: u32 = 2 * BASIS_BITS - INVERSE_ROW_SHIFT;

/// Fractional bits carried by forward transform output.
pub const COEFF_FRACTION_BITS: u32 = 2 * BASIS_BITS - FORWARD_ROW_SHIFT - FORWARD_COL_SHIFT;

const fn cos_q13(k: usize) -> i32 {
    let k = k % 32;
    match k {
        0..=8 => COS_Q13[k],
        9..=16 => -COS_Q13[16 - k],
        17..=24 => -COS_Q13[k - 16],
        _ => COS_Q13[32 - k],
    }
}

const fn build_basis() -> [[i32; 8]; 8] {
    let mut basis = [[0i32; 8]; 8];
    let mut u = 0;
    while u < 8 {
        let mut n = 0;
        while n < 8 {
            basis[u][n] = if u == 0 { DC_Q13 } else { cos_q13((2 * n + 1) * u) };
            n += 1;
        }
        u += 1;
    }
    basis
}

/// `BASIS[u][n]`: frequency `u`, sample `n`.
static BASIS: [[i32; 8]; 8] = build_basis();

#[inline]
pub fn round_shift(value: i32, shift: u32) -> i32 {
    (value + (1 << (shift - 1))) >> shift
}

/// Divides rounding the magnitude to nearest (halves away from zero); the
/// result carries the sign of `value`.
#[inline]
pub fn round_div(value: i32, divisor: i32) -> i32 {
    debug_assert!(divisor > 0);
    let magnitude = ((value.unsigned_abs() + divisor as u32 / 2) / divisor as u32) as i32;
    if value < 0 { -magnitude } else { magnitude }
}

/// Row pass then column pass over a row-major 8x8 block of residual samples.
pub fn forward_dct(block: &[i32; 64]) -> [i32; 64] {
    let mut rows = [0i32; 64];
    for r in 0..8 {
        let samples = &block[r * 8..r * 8 + 8];
        for u in 0..8 {
            let acc: i32 = samples.iter().zip(BASIS[u].iter()).map(|(&x, &b)| x * b).sum();
            rows[r * 8 + u] = round_shift(acc, FORWARD_ROW_SHIFT);
        }
    }

    let mut out = [0i32; 64];
    for u in 0..8 {
        for v in 0..8 {
            let mut acc = 0i32;
            for r in 0..8 {
                acc += rows[r * 8 + u] * BASIS[v][r];
            }
            out[v * 8 + u] = round_shift(acc, FORWARD_COL_SHIFT);
        }
    }
    out
}

/// Inverse of [`forward_dct`] on orthonormal-scale integer coefficients,
/// using the transposed basis.
pub fn inverse_dct(coeffs: &[i32; 64]) -> [i32; 64] {
    let mut rows = [0i32; 64];
    for v in 0..8 {
        let freq = &coeffs[v * 8..v * 8 + 8];
        for n in 0..8 {
            let mut acc = 0i32;
            for u in 0..8 {
                acc += freq[u] * BASIS[u][n];
            }
            rows[v * 8 + n] = round_shift(acc, INVERSE_ROW_SHIFT);
        }
    }

    let mut out = [0i32; 64];
    for n in 0..8 {
        for m in 0..8 {
            let mut acc = 0i32;
            for v in 0..8 {
                acc += rows[v * 8 + n] * BASIS[v][m];
            }
            out[m * 8 + n] = round_shift(acc, INVERSE_COL_SHIFT);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round_trip(block: &[i32; 64]) -> [i32; 64] {
        let coeffs = forward_dct(block);
        let scale = 1 << COEFF_FRACTION_BITS;
        let integer: Vec<i32> = coeffs.iter().map(|&c| round_div(c, scale)).collect();
        inverse_dct(&integer.try_into().unwrap())
    }

    #[test]
    fn fraction_bits_is_four() {
        assert_eq!(COEFF_FRACTION_BITS, 4);
    }

    #[test]
    fn basis_symmetry() {
        for u in 0..8 {
            for n in 0..8 {
                let mirrored = BASIS[u][7 - n];
                if u % 2 == 0 {
                    assert_eq!(BASIS[u][n], mirrored);
                } else {
                    assert_eq!(BASIS[u][n], -mirrored);
                }
            }
        }
        assert_eq!(BASIS[1][0], 4017);
        assert_eq!(BASIS[2][1], 1567);
        assert_eq!(BASIS[4][1], -2896);
    }

    #[test]
    fn zero_block_transforms_to_zero() {
        assert_eq!(forward_dct(&[0; 64]), [0; 64]);
        assert_eq!(inverse_dct(&[0; 64]), [0; 64]);
    }

    #[test]
    fn flat_block_has_only_dc() {
        let coeffs = forward_dct(&[100; 64]);
        // orthonormal DC of a flat block is 8 * value
        assert!((coeffs[0] - 100 * 8 * 16).abs() <= 8, "dc {}", coeffs[0]);
        assert!(coeffs[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn dc_only_inverse_is_flat() {
        let mut coeffs = [0i32; 64];
        coeffs[0] = 80;
        let out = inverse_dct(&coeffs);
        assert!(out.iter().all(|&x| x == 10));
    }

    #[test]
    fn ramp_round_trip() {
        let mut block = [0i32; 64];
        for (i, v) in block.iter_mut().enumerate() {
            *v = (i as i32 % 8) * 30 - 100 + (i as i32 / 8) * 5;
        }
        let out = round_trip(&block);
        for (a, b) in block.iter().zip(out.iter()) {
            assert!((a - b).abs() <= 1, "{a} vs {b}");
        }
    }

    #[test]
    fn round_shift_rounds_half_up() {
        assert_eq!(round_shift(3, 1), 2);
        assert_eq!(round_shift(-3, 1), -1);
        assert_eq!(round_shift(5, 2), 1);
        assert_eq!(round_shift(6, 2), 2);
    }

    #[test]
    fn round_div_is_sign_symmetric() {
        assert_eq!(round_div(24, 16), 2);
        assert_eq!(round_div(-24, 16), -2);
        assert_eq!(round_div(23, 16), 1);
        assert_eq!(round_div(-23, 16), -1);
        assert_eq!(round_div(7, 16), 0);
        assert_eq!(round_div(-7, 16), 0);
    }

    proptest! {
        #[test]
        fn inverse_undoes_forward(values in proptest::collection::vec(-255i32..=255, 64)) {
            let mut block = [0i32; 64];
            block.copy_from_slice(&values);
            let out = round_trip(&block);
            for (a, b) in block.iter().zip(out.iter()) {
                prop_assert!((a - b).abs() <= 2, "{} vs {}", a, b);
            }
        }
    }
}
