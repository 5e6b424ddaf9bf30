//! Picture layer: headers, then one slice per macroblock row, each
//! macroblock run through estimation, transform, entropy coding and
//! reconstruction in raster order.

use log::trace;

use crate::bitwriter::BitWriter;
use crate::entropy::{SliceContext, encode_macroblock};
use crate::macroblock::MacroblockPixels;
use crate::motion::MotionEstimator;
use crate::packet::FrameType;
use crate::quant::quantiser_scale_code;
use crate::recon::reconstruct_into;
use crate::reference::ReferenceStore;
use crate::sequence;
use crate::transform::{residual_tiles, transform};
use crate::y4m::FramePixels;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PictureStats {
    pub intra_macroblocks: u32,
    pub inter_macroblocks: u32,
    pub all_zero_macroblocks: u32,
    pub escapes: u32,
    pub bits: u64,
}

/// Fixed per-session parameters of the picture coder.
#[derive(Debug, Clone, Copy)]
pub struct PictureCoder {
    pub mb_cols: u32,
    pub mb_rows: u32,
    pub q_level: u8,
    pub estimator: MotionEstimator,
}

impl PictureCoder {
    /// Codes `frame` as one picture. P pictures predict from `reference`,
    /// which holds the reconstruction of the previous picture on entry and
    /// of this one on return.
    pub fn encode(
        &self,
        w: &mut BitWriter,
        frame: &FramePixels,
        frame_type: FrameType,
        temporal_reference: u32,
        reference: &mut ReferenceStore,
    ) -> PictureStats {
        let start = w.bit_position();
        let mut stats = PictureStats::default();

        sequence::write_picture_header(w, temporal_reference, frame_type);
        sequence::write_picture_coding_extension(w, frame_type);

        let scale_code = quantiser_scale_code(self.q_level);
        let mut ctx = SliceContext::new();

        for mb_y in 0..self.mb_rows {
            let slice_start = w.bit_position();
            sequence::write_slice_header(w, mb_y, scale_code);
            ctx.reset();

            for mb_x in 0..self.mb_cols {
                let current = MacroblockPixels::extract(frame, mb_x, mb_y);
                let estimate = self
                    .estimator
                    .estimate(frame_type, &current, mb_x, mb_y, reference);
                let quantized = transform(
                    &residual_tiles(&current, &estimate.predicted),
                    !estimate.inter,
                    self.q_level,
                );

                let bits = encode_macroblock(w, &quantized, estimate.vector, frame_type, &mut ctx);
                stats.escapes += bits.escapes;
                if quantized.intra {
                    stats.intra_macroblocks += 1;
                } else {
                    stats.inter_macroblocks += 1;
                    if quantized.is_all_zero() {
                        stats.all_zero_macroblocks += 1;
                    }
                }

                reconstruct_into(reference, mb_x, mb_y, &quantized, &estimate.predicted, self.q_level);
            }

            trace!(
                "slice {mb_y}: {} bits, {} pending reference blocks",
                w.bit_position() - slice_start,
                reference.pending()
            );
        }

        reference.flush();
        stats.bits = w.bit_position() - start;
        stats
    }
}
