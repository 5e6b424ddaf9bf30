//! Macroblock layer: type, motion vector, coded block pattern and the
//! run/level coding of each tile.

use crate::bitwriter::BitWriter;
use crate::macroblock::Component;
use crate::motion::MotionVector;
use crate::packet::FrameType;
use crate::scan::zigzag;
use crate::transform::{QuantizedMacroblock, Tile};
use crate::vlc;

/// Range of a motion vector difference with `f_code` 1.
const MV_RANGE: i32 = 32;
const MV_MAX: i32 = MV_RANGE / 2 - 1;
const MV_MIN: i32 = -MV_RANGE / 2;

/// Predictors carried from one macroblock to the next within a slice.
/// DC predictors are kept relative to mid-gray, so their reset value is 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceContext {
    prev_dc: [i32; 3],
    prev_mv: MotionVector,
}

impl SliceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn previous_dc(&self, component: Component) -> i32 {
        self.prev_dc[component.index()]
    }

    pub fn previous_vector(&self) -> MotionVector {
        self.prev_mv
    }
}

/// Counts of what a macroblock produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MacroblockBits {
    pub bits: u64,
    pub escapes: u32,
}

/// Codes one macroblock. Every macroblock is sent with an address
/// increment of one; an inter macroblock without coefficients uses the
/// motion-compensated, not-coded type.
pub fn encode_macroblock(
    w: &mut BitWriter,
    mb: &QuantizedMacroblock,
    mv: MotionVector,
    frame_type: FrameType,
    ctx: &mut SliceContext,
) -> MacroblockBits {
    let start = w.bit_position();
    let mut escapes = 0;
    w.write_vlc(vlc::MB_ADDRESS_INCREMENT_ONE);

    if mb.intra {
        w.write_vlc(match frame_type {
            FrameType::Intra => vlc::MB_TYPE_I_INTRA,
            FrameType::Predicted => vlc::MB_TYPE_P_INTRA,
        });
        ctx.prev_mv = MotionVector::ZERO;
        for (i, tile) in mb.tiles.iter().enumerate() {
            escapes += write_intra_tile(w, tile, Component::of_tile(i), ctx);
        }
    } else {
        debug_assert_eq!(frame_type, FrameType::Predicted);
        ctx.prev_dc = [0; 3];
        let cbp = mb.coded_block_pattern();
        w.write_vlc(if cbp == 0 {
            vlc::MB_TYPE_P_NOT_CODED
        } else {
            vlc::MB_TYPE_P_CODED
        });
        write_motion_vector(w, mv, ctx);
        if cbp != 0 {
            w.write_vlc(vlc::CODED_BLOCK_PATTERN[cbp as usize]);
            for tile in mb.tiles.iter().filter(|t| t.nonzero) {
                escapes += write_coefficients(w, &zigzag(&tile.coeffs), 0, true);
            }
        }
    }

    MacroblockBits {
        bits: w.bit_position() - start,
        escapes,
    }
}

fn write_motion_vector(w: &mut BitWriter, mv: MotionVector, ctx: &mut SliceContext) {
    let prev = ctx.prev_mv;
    for (value, predictor) in [(mv.x, prev.x), (mv.y, prev.y)] {
        let mut delta = value - predictor;
        if delta > MV_MAX {
            delta -= MV_RANGE;
        } else if delta < MV_MIN {
            delta += MV_RANGE;
        }
        w.write_vlc(vlc::MOTION_CODE[delta.unsigned_abs() as usize]);
        if delta != 0 {
            w.write_bit(delta < 0);
        }
    }
    ctx.prev_mv = mv;
}

fn write_intra_tile(w: &mut BitWriter, tile: &Tile, component: Component, ctx: &mut SliceContext) -> u32 {
    let dc = tile.coeffs[0];
    let slot = &mut ctx.prev_dc[component.index()];
    let diff = dc - *slot;
    *slot = dc;

    let size = vlc::dc_size(diff);
    let table = match component {
        Component::Luma => &vlc::DC_SIZE_LUMA,
        Component::Cb | Component::Cr => &vlc::DC_SIZE_CHROMA,
    };
    w.write_vlc(table[size]);
    if size > 0 {
        // negative differentials are sent as their one's complement
        let bits = if diff < 0 { diff + (1 << size) - 1 } else { diff };
        w.write_bits(bits as u32, size as u8);
    }

    write_coefficients(w, &zigzag(&tile.coeffs), 1, false)
}

/// Run/level codes for `scanned[start..]` followed by end of block. Returns
/// the number of escape codes used.
fn write_coefficients(w: &mut BitWriter, scanned: &[i32; 64], start: usize, non_intra: bool) -> u32 {
    let mut escapes = 0;
    let mut run = 0u32;
    let mut first = true;
    for &level in &scanned[start..] {
        if level == 0 {
            run += 1;
            continue;
        }
        let magnitude = level.unsigned_abs();
        if first && non_intra && run == 0 && magnitude == 1 {
            w.write_vlc(vlc::FIRST_COEFF_ONE);
            w.write_bit(level < 0);
        } else if let Some(code) = vlc::run_level(run, magnitude) {
            w.write_vlc(code);
            w.write_bit(level < 0);
        } else {
            write_escape(w, run, level);
            escapes += 1;
        }
        first = false;
        run = 0;
    }
    w.write_vlc(vlc::END_OF_BLOCK);
    escapes
}

fn write_escape(w: &mut BitWriter, run: u32, level: i32) {
    w.write_vlc(vlc::ESCAPE);
    w.write_bits(run, vlc::ESCAPE_RUN_BITS);
    w.write_bits(level as u32 & 0xFFF, vlc::ESCAPE_LEVEL_BITS);
}
