use crate::dct::inverse_dct;
use crate::macroblock::{MacroblockPixels, TILES_PER_MB};
use crate::quant::{dequantize_inter, dequantize_intra};
use crate::reference::ReferenceStore;
use crate::transform::QuantizedMacroblock;

const RESIDUAL_MIN: i32 = -255;
const RESIDUAL_MAX: i32 = 255;

/// Rebuilds the pixels a decoder produces for `mb` on top of `predicted`.
/// Inter tiles without coefficients are not coded, so they reproduce the
/// prediction exactly.
pub fn reconstruct(mb: &QuantizedMacroblock, predicted: &MacroblockPixels, q_level: u8) -> MacroblockPixels {
    let mut out = *predicted;
    for i in 0..TILES_PER_MB {
        let tile = &mb.tiles[i];
        if !mb.intra && !tile.nonzero {
            continue;
        }
        let coeffs = if mb.intra {
            dequantize_intra(&tile.coeffs, q_level)
        } else {
            dequantize_inter(&tile.coeffs, q_level)
        };
        let residual = inverse_dct(&coeffs);
        let pred = predicted.tile(i);
        let mut samples = [0u8; 64];
        for ((s, &r), &p) in samples.iter_mut().zip(residual.iter()).zip(pred.iter()) {
            *s = (p as i32 + r.clamp(RESIDUAL_MIN, RESIDUAL_MAX)).clamp(0, 255) as u8;
        }
        out.set_tile(i, &samples);
    }
    out
}

/// [`reconstruct`], then queue the result in the reference store.
pub fn reconstruct_into(
    store: &mut ReferenceStore,
    mb_x: u32,
    mb_y: u32,
    mb: &QuantizedMacroblock,
    predicted: &MacroblockPixels,
    q_level: u8,
) -> MacroblockPixels {
    let pixels = reconstruct(mb, predicted, q_level);
    store.submit(mb_x, mb_y, pixels);
    pixels
}
