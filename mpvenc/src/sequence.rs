//! Sequence, GOP, picture and slice header syntax.

use crate::bitwriter::BitWriter;
use crate::packet::FrameType;

pub const PICTURE_START_CODE: u8 = 0x00;
pub const SLICE_START_CODE_MIN: u8 = 0x01;
pub const SLICE_START_CODE_MAX: u8 = 0xAF;
pub const SEQUENCE_HEADER_CODE: u8 = 0xB3;
pub const EXTENSION_START_CODE: u8 = 0xB5;
pub const SEQUENCE_END_CODE: u8 = 0xB7;
pub const GROUP_START_CODE: u8 = 0xB8;

const SEQUENCE_EXTENSION_ID: u32 = 0b0001;
const PICTURE_CODING_EXTENSION_ID: u32 = 0b1000;

/// High profile, high level.
const PROFILE_AND_LEVEL: u32 = 0x14;
const ASPECT_RATIO_SQUARE: u32 = 1;
const CHROMA_FORMAT_420: u32 = 1;
const BIT_RATE_VARIABLE: u32 = 0x3FFFF;
const VBV_BUFFER_SIZE: u32 = 112;
const VBV_DELAY_VARIABLE: u32 = 0xFFFF;
const INTRA_DC_PRECISION_11_BIT: u32 = 3;
const PICTURE_STRUCTURE_FRAME: u32 = 3;
const F_CODE_UNUSED: u32 = 15;
const F_CODE_FORWARD: u32 = 1;
/// MPEG-1 picture header field, fixed to 7 in MPEG-2 streams.
const FORWARD_F_CODE_LEGACY: u32 = 7;

pub fn write_sequence_header(w: &mut BitWriter, width: u32, height: u32, frame_rate_code: u8) {
    w.start_code(SEQUENCE_HEADER_CODE);
    w.write_bits(width & 0xFFF, 12);
    w.write_bits(height & 0xFFF, 12);
    w.write_bits(ASPECT_RATIO_SQUARE, 4);
    w.write_bits(frame_rate_code as u32, 4);
    w.write_bits(BIT_RATE_VARIABLE, 18);
    w.write_bit(true);
    w.write_bits(VBV_BUFFER_SIZE, 10);
    w.write_bit(false); // constrained_parameters_flag
    w.write_bit(false); // load_intra_quantiser_matrix
    w.write_bit(false); // load_non_intra_quantiser_matrix
}

pub fn write_sequence_extension(w: &mut BitWriter, width: u32, height: u32) {
    w.start_code(EXTENSION_START_CODE);
    w.write_bits(SEQUENCE_EXTENSION_ID, 4);
    w.write_bits(PROFILE_AND_LEVEL, 8);
    w.write_bit(true); // progressive_sequence
    w.write_bits(CHROMA_FORMAT_420, 2);
    w.write_bits((width >> 12) & 3, 2);
    w.write_bits((height >> 12) & 3, 2);
    w.write_bits(0, 12); // bit_rate_extension
    w.write_bit(true);
    w.write_bits(0, 8); // vbv_buffer_size_extension
    w.write_bit(true); // low_delay
    w.write_bits(0, 2); // frame_rate_extension_n
    w.write_bits(0, 5); // frame_rate_extension_d
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeCode {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub pictures: u32,
}

impl TimeCode {
    /// Time code of the `count`-th picture of the stream at `fps` pictures
    /// per second. Hours wrap at 24.
    pub fn from_picture_count(count: u64, fps: u32) -> Self {
        let fps = fps.max(1) as u64;
        let total_seconds = count / fps;
        Self {
            hours: ((total_seconds / 3600) % 24) as u32,
            minutes: ((total_seconds / 60) % 60) as u32,
            seconds: (total_seconds % 60) as u32,
            pictures: (count % fps) as u32,
        }
    }
}

pub fn write_gop_header(w: &mut BitWriter, time_code: TimeCode) {
    w.start_code(GROUP_START_CODE);
    w.write_bit(false); // drop_frame_flag
    w.write_bits(time_code.hours, 5);
    w.write_bits(time_code.minutes, 6);
    w.write_bit(true);
    w.write_bits(time_code.seconds, 6);
    w.write_bits(time_code.pictures, 6);
    w.write_bit(true); // closed_gop
    w.write_bit(false); // broken_link
}

pub fn write_picture_header(w: &mut BitWriter, temporal_reference: u32, frame_type: FrameType) {
    w.start_code(PICTURE_START_CODE);
    w.write_bits(temporal_reference & 0x3FF, 10);
    w.write_bits(frame_type.coding_type(), 3);
    w.write_bits(VBV_DELAY_VARIABLE, 16);
    if frame_type == FrameType::Predicted {
        w.write_bit(false); // full_pel_forward_vector
        w.write_bits(FORWARD_F_CODE_LEGACY, 3);
    }
    w.write_bit(false); // extra_bit_picture
}

pub fn write_picture_coding_extension(w: &mut BitWriter, frame_type: FrameType) {
    w.start_code(EXTENSION_START_CODE);
    w.write_bits(PICTURE_CODING_EXTENSION_ID, 4);
    let forward = match frame_type {
        FrameType::Intra => F_CODE_UNUSED,
        FrameType::Predicted => F_CODE_FORWARD,
    };
    w.write_bits(forward, 4);
    w.write_bits(forward, 4);
    w.write_bits(F_CODE_UNUSED, 4);
    w.write_bits(F_CODE_UNUSED, 4);
    w.write_bits(INTRA_DC_PRECISION_11_BIT, 2);
    w.write_bits(PICTURE_STRUCTURE_FRAME, 2);
    w.write_bit(false); // top_field_first
    w.write_bit(true); // frame_pred_frame_dct
    w.write_bit(false); // concealment_motion_vectors
    w.write_bit(false); // q_scale_type
    w.write_bit(false); // intra_vlc_format
    w.write_bit(false); // alternate_scan
    w.write_bit(false); // repeat_first_field
    w.write_bit(true); // chroma_420_type
    w.write_bit(true); // progressive_frame
    w.write_bit(false); // composite_display_flag
}

/// Slice covering macroblock row `mb_row`.
pub fn write_slice_header(w: &mut BitWriter, mb_row: u32, quantiser_scale_code: u8) {
    debug_assert!(mb_row < (SLICE_START_CODE_MAX - SLICE_START_CODE_MIN + 1) as u32);
    w.start_code(SLICE_START_CODE_MIN + mb_row as u8);
    w.write_bits(quantiser_scale_code as u32, 5);
    w.write_bit(false); // extra_bit_slice
}

pub fn write_sequence_end(w: &mut BitWriter) {
    w.start_code(SEQUENCE_END_CODE);
}
