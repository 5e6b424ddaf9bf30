use crate::dct::forward_dct;
use crate::macroblock::{MacroblockPixels, TILES_PER_MB};
use crate::quant::{quantize_inter, quantize_intra};

/// Quantised coefficients of one 8x8 tile, raster order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub coeffs: [i32; 64],
    pub nonzero: bool,
}

impl Tile {
    pub fn new(coeffs: [i32; 64]) -> Self {
        let nonzero = coeffs.iter().any(|&c| c != 0);
        Self { coeffs, nonzero }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedMacroblock {
    pub tiles: [Tile; TILES_PER_MB],
    pub intra: bool,
}

impl QuantizedMacroblock {
    /// One bit per tile, tile 0 in the most significant of six bits. Intra
    /// tiles are always coded.
    pub fn coded_block_pattern(&self) -> u8 {
        self.tiles
            .iter()
            .fold(0u8, |cbp, tile| (cbp << 1) | (self.intra || tile.nonzero) as u8)
    }

    pub fn is_all_zero(&self) -> bool {
        !self.intra && self.tiles.iter().all(|t| !t.nonzero)
    }
}

pub fn residual_tiles(
    current: &MacroblockPixels,
    predicted: &MacroblockPixels,
) -> [[i32; 64]; TILES_PER_MB] {
    let mut out = [[0i32; 64]; TILES_PER_MB];
    for (i, residual) in out.iter_mut().enumerate() {
        let (cur, pred) = (current.tile(i), predicted.tile(i));
        for ((r, &c), &p) in residual.iter_mut().zip(cur.iter()).zip(pred.iter()) {
            *r = c as i32 - p as i32;
        }
    }
    out
}

pub fn transform(
    residual: &[[i32; 64]; TILES_PER_MB],
    intra: bool,
    q_level: u8,
) -> QuantizedMacroblock {
    let tiles = std::array::from_fn(|i| {
        let coeffs = forward_dct(&residual[i]);
        let levels = if intra {
            quantize_intra(&coeffs, q_level)
        } else {
            quantize_inter(&coeffs, q_level)
        };
        Tile::new(levels)
    });
    QuantizedMacroblock { tiles, intra }
}
