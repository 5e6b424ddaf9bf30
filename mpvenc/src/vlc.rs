//! Static variable-length code tables of the MPEG-2 video syntax.
//!
//! Codes are stored without their trailing sign bit; callers append it.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vlc {
    pub code: u32,
    pub len: u8,
}

impl Vlc {
    pub const NONE: Vlc = Vlc { code: 0, len: 0 };

    pub const fn new(code: u32, len: u8) -> Self {
        Self { code, len }
    }

    pub fn is_none(self) -> bool {
        self.len == 0
    }
}

pub const MB_ADDRESS_INCREMENT_ONE: Vlc = Vlc::new(0b1, 1);

pub const MB_TYPE_I_INTRA: Vlc = Vlc::new(0b1, 1);
pub const MB_TYPE_P_CODED: Vlc = Vlc::new(0b1, 1);
pub const MB_TYPE_P_NOT_CODED: Vlc = Vlc::new(0b001, 3);
pub const MB_TYPE_P_INTRA: Vlc = Vlc::new(0b00011, 5);

pub const END_OF_BLOCK: Vlc = Vlc::new(0b10, 2);
/// Run 0, level 1 as the first coefficient of a non-intra block.
pub const FIRST_COEFF_ONE: Vlc = Vlc::new(0b1, 1);
pub const ESCAPE: Vlc = Vlc::new(0b000001, 6);
pub const ESCAPE_RUN_BITS: u8 = 6;
pub const ESCAPE_LEVEL_BITS: u8 = 12;

pub const MOTION_CODE: [Vlc; 17] = [
    Vlc::new(0b1, 1),
    Vlc::new(0b01, 2),
    Vlc::new(0b001, 3),
    Vlc::new(0b0001, 4),
    Vlc::new(0b000011, 6),
    Vlc::new(0b0000101, 7),
    Vlc::new(0b0000100, 7),
    Vlc::new(0b0000011, 7),
    Vlc::new(0b000001011, 9),
    Vlc::new(0b000001010, 9),
    Vlc::new(0b000001001, 9),
    Vlc::new(0b0000010001, 10),
    Vlc::new(0b0000010000, 10),
    Vlc::new(0b0000001111, 10),
    Vlc::new(0b0000001110, 10),
    Vlc::new(0b0000001101, 10),
    Vlc::new(0b0000001100, 10),
];

pub const DC_SIZE_LUMA: [Vlc; 12] = [
    Vlc::new(0b100, 3),
    Vlc::new(0b00, 2),
    Vlc::new(0b01, 2),
    Vlc::new(0b101, 3),
    Vlc::new(0b110, 3),
    Vlc::new(0b1110, 4),
    Vlc::new(0b11110, 5),
    Vlc::new(0b111110, 6),
    Vlc::new(0b1111110, 7),
    Vlc::new(0b11111110, 8),
    Vlc::new(0b111111110, 9),
    Vlc::new(0b111111111, 9),
];

pub const DC_SIZE_CHROMA: [Vlc; 12] = [
    Vlc::new(0b00, 2),
    Vlc::new(0b01, 2),
    Vlc::new(0b10, 2),
    Vlc::new(0b110, 3),
    Vlc::new(0b1110, 4),
    Vlc::new(0b11110, 5),
    Vlc::new(0b111110, 6),
    Vlc::new(0b1111110, 7),
    Vlc::new(0b11111110, 8),
    Vlc::new(0b111111110, 9),
    Vlc::new(0b1111111110, 10),
    Vlc::new(0b1111111111, 10),
];

pub const CODED_BLOCK_PATTERN: [Vlc; 64] = [
    Vlc::new(0b000000001, 9), // 0
    Vlc::new(0b01011, 5), // 1
    Vlc::new(0b01001, 5), // 2
    Vlc::new(0b001101, 6), // 3
    Vlc::new(0b1101, 4), // 4
    Vlc::new(0b0010111, 7), // 5
    Vlc::new(0b0010011, 7), // 6
    Vlc::new(0b00011111, 8), // 7
    Vlc::new(0b1100, 4), // 8
    Vlc::new(0b0010110, 7), // 9
    Vlc::new(0b0010010, 7), // 10
    Vlc::new(0b00011110, 8), // 11
    Vlc::new(0b10011, 5), // 12
    Vlc::new(0b00011011, 8), // 13
    Vlc::new(0b00010111, 8), // 14
    Vlc::new(0b00010011, 8), // 15
    Vlc::new(0b1011, 4), // 16
    Vlc::new(0b0010101, 7), // 17
    Vlc::new(0b0010001, 7), // 18
    Vlc::new(0b00011101, 8), // 19
    Vlc::new(0b10001, 5), // 20
    Vlc::new(0b00011001, 8), // 21
    Vlc::new(0b00010101, 8), // 22
    Vlc::new(0b00010001, 8), // 23
    Vlc::new(0b001111, 6), // 24
    Vlc::new(0b00001111, 8), // 25
    Vlc::new(0b00001101, 8), // 26
    Vlc::new(0b000000011, 9), // 27
    Vlc::new(0b01111, 5), // 28
    Vlc::new(0b00001011, 8), // 29
    Vlc::new(0b00000111, 8), // 30
    Vlc::new(0b000000111, 9), // 31
    Vlc::new(0b1010, 4), // 32
    Vlc::new(0b0010100, 7), // 33
    Vlc::new(0b0010000, 7), // 34
    Vlc::new(0b00011100, 8), // 35
    Vlc::new(0b001110, 6), // 36
    Vlc::new(0b00001110, 8), // 37
    Vlc::new(0b00001100, 8), // 38
    Vlc::new(0b000000010, 9), // 39
    Vlc::new(0b10000, 5), // 40
    Vlc::new(0b00011000, 8), // 41
    Vlc::new(0b00010100, 8), // 42
    Vlc::new(0b00010000, 8), // 43
    Vlc::new(0b01110, 5), // 44
    Vlc::new(0b00001010, 8), // 45
    Vlc::new(0b00000110, 8), // 46
    Vlc::new(0b000000110, 9), // 47
    Vlc::new(0b10010, 5), // 48
    Vlc::new(0b00011010, 8), // 49
    Vlc::new(0b00010110, 8), // 50
    Vlc::new(0b00010010, 8), // 51
    Vlc::new(0b01101, 5), // 52
    Vlc::new(0b00001001, 8), // 53
    Vlc::new(0b00000101, 8), // 54
    Vlc::new(0b000000101, 9), // 55
    Vlc::new(0b01100, 5), // 56
    Vlc::new(0b00001000, 8), // 57
    Vlc::new(0b00000100, 8), // 58
    Vlc::new(0b000000100, 9), // 59
    Vlc::new(0b111, 3), // 60
    Vlc::new(0b01010, 5), // 61
    Vlc::new(0b01000, 5), // 62
    Vlc::new(0b001100, 6), // 63
];

const DCT_RUN0: [Vlc; 40] = [
    Vlc::new(0b11, 2), // level 1
    Vlc::new(0b0100, 4), // level 2
    Vlc::new(0b00101, 5), // level 3
    Vlc::new(0b0000110, 7), // level 4
    Vlc::new(0b00100110, 8), // level 5
    Vlc::new(0b00100001, 8), // level 6
    Vlc::new(0b0000001010, 10), // level 7
    Vlc::new(0b000000011101, 12), // level 8
    Vlc::new(0b000000011000, 12), // level 9
    Vlc::new(0b000000010011, 12), // level 10
    Vlc::new(0b000000010000, 12), // level 11
    Vlc::new(0b0000000011010, 13), // level 12
    Vlc::new(0b0000000011001, 13), // level 13
    Vlc::new(0b0000000011000, 13), // level 14
    Vlc::new(0b0000000010111, 13), // level 15
    Vlc::new(0b00000000011111, 14), // level 16
    Vlc::new(0b00000000011110, 14), // level 17
    Vlc::new(0b00000000011101, 14), // level 18
    Vlc::new(0b00000000011100, 14), // level 19
    Vlc::new(0b00000000011011, 14), // level 20
    Vlc::new(0b00000000011010, 14), // level 21
    Vlc::new(0b00000000011001, 14), // level 22
    Vlc::new(0b00000000011000, 14), // level 23
    Vlc::new(0b00000000010111, 14), // level 24
    Vlc::new(0b00000000010110, 14), // level 25
    Vlc::new(0b00000000010101, 14), // level 26
    Vlc::new(0b00000000010100, 14), // level 27
    Vlc::new(0b00000000010011, 14), // level 28
    Vlc::new(0b00000000010010, 14), // level 29
    Vlc::new(0b00000000010001, 14), // level 30
    Vlc::new(0b00000000010000, 14), // level 31
    Vlc::new(0b000000000011000, 15), // level 32
    Vlc::new(0b000000000010111, 15), // level 33
    Vlc::new(0b000000000010110, 15), // level 34
    Vlc::new(0b000000000010101, 15), // level 35
    Vlc::new(0b000000000010100, 15), // level 36
    Vlc::new(0b000000000010011, 15), // level 37
    Vlc::new(0b000000000010010, 15), // level 38
    Vlc::new(0b000000000010001, 15), // level 39
    Vlc::new(0b000000000010000, 15), // level 40
];

const DCT_RUN1: [Vlc; 18] = [
    Vlc::new(0b011, 3), // level 1
    Vlc::new(0b000110, 6), // level 2
    Vlc::new(0b00100101, 8), // level 3
    Vlc::new(0b0000001100, 10), // level 4
    Vlc::new(0b000000011011, 12), // level 5
    Vlc::new(0b0000000010110, 13), // level 6
    Vlc::new(0b0000000010101, 13), // level 7
    Vlc::new(0b000000000011111, 15), // level 8
    Vlc::new(0b000000000011110, 15), // level 9
    Vlc::new(0b000000000011101, 15), // level 10
    Vlc::new(0b000000000011100, 15), // level 11
    Vlc::new(0b000000000011011, 15), // level 12
    Vlc::new(0b000000000011010, 15), // level 13
    Vlc::new(0b000000000011001, 15), // level 14
    Vlc::new(0b0000000000010011, 16), // level 15
    Vlc::new(0b0000000000010010, 16), // level 16
    Vlc::new(0b0000000000010001, 16), // level 17
    Vlc::new(0b0000000000010000, 16), // level 18
];

const DCT_RUN2: [Vlc; 5] = [
    Vlc::new(0b0101, 4), // level 1
    Vlc::new(0b0000100, 7), // level 2
    Vlc::new(0b0000001011, 10), // level 3
    Vlc::new(0b000000010100, 12), // level 4
    Vlc::new(0b0000000010100, 13), // level 5
];

const DCT_RUN3: [Vlc; 4] = [
    Vlc::new(0b00111, 5), // level 1
    Vlc::new(0b00100100, 8), // level 2
    Vlc::new(0b000000011100, 12), // level 3
    Vlc::new(0b0000000010011, 13), // level 4
];

const DCT_SPARSE: [[Vlc; 3]; 28] = [
    [Vlc::new(0b00110, 5), Vlc::new(0b0000001111, 10), Vlc::new(0b000000010010, 12)], // run 4
    [Vlc::new(0b000111, 6), Vlc::new(0b0000001001, 10), Vlc::new(0b0000000010010, 13)], // run 5
    [Vlc::new(0b000101, 6), Vlc::new(0b000000011110, 12), Vlc::new(0b0000000000010100, 16)], // run 6
    [Vlc::new(0b000100, 6), Vlc::new(0b000000010101, 12), Vlc::NONE], // run 7
    [Vlc::new(0b0000111, 7), Vlc::new(0b000000010001, 12), Vlc::NONE], // run 8
    [Vlc::new(0b0000101, 7), Vlc::new(0b0000000010001, 13), Vlc::NONE], // run 9
    [Vlc::new(0b00100111, 8), Vlc::new(0b0000000010000, 13), Vlc::NONE], // run 10
    [Vlc::new(0b00100011, 8), Vlc::new(0b0000000000011010, 16), Vlc::NONE], // run 11
    [Vlc::new(0b00100010, 8), Vlc::new(0b0000000000011001, 16), Vlc::NONE], // run 12
    [Vlc::new(0b00100000, 8), Vlc::new(0b0000000000011000, 16), Vlc::NONE], // run 13
    [Vlc::new(0b0000001110, 10), Vlc::new(0b0000000000010111, 16), Vlc::NONE], // run 14
    [Vlc::new(0b0000001101, 10), Vlc::new(0b0000000000010110, 16), Vlc::NONE], // run 15
    [Vlc::new(0b0000001000, 10), Vlc::new(0b0000000000010101, 16), Vlc::NONE], // run 16
    [Vlc::new(0b000000011111, 12), Vlc::NONE, Vlc::NONE], // run 17
    [Vlc::new(0b000000011010, 12), Vlc::NONE, Vlc::NONE], // run 18
    [Vlc::new(0b000000011001, 12), Vlc::NONE, Vlc::NONE], // run 19
    [Vlc::new(0b000000010111, 12), Vlc::NONE, Vlc::NONE], // run 20
    [Vlc::new(0b000000010110, 12), Vlc::NONE, Vlc::NONE], // run 21
    [Vlc::new(0b0000000011111, 13), Vlc::NONE, Vlc::NONE], // run 22
    [Vlc::new(0b0000000011110, 13), Vlc::NONE, Vlc::NONE], // run 23
    [Vlc::new(0b0000000011101, 13), Vlc::NONE, Vlc::NONE], // run 24
    [Vlc::new(0b0000000011100, 13), Vlc::NONE, Vlc::NONE], // run 25
    [Vlc::new(0b0000000011011, 13), Vlc::NONE, Vlc::NONE], // run 26
    [Vlc::new(0b0000000000011111, 16), Vlc::NONE, Vlc::NONE], // run 27
    [Vlc::new(0b0000000000011110, 16), Vlc::NONE, Vlc::NONE], // run 28
    [Vlc::new(0b0000000000011101, 16), Vlc::NONE, Vlc::NONE], // run 29
    [Vlc::new(0b0000000000011100, 16), Vlc::NONE, Vlc::NONE], // run 30
    [Vlc::new(0b0000000000011011, 16), Vlc::NONE, Vlc::NONE], // run 31
];

const DCT_DENSE: [&[Vlc]; 4] = [&DCT_RUN0, &DCT_RUN1, &DCT_RUN2, &DCT_RUN3];

/// Looks up the run/level code for a non-zero coefficient. Runs 0..=3 come
/// from the dense table, runs 4..=31 from the sparse one. `None` means the
/// pair has to be escape coded.
pub fn run_level(run: u32, level: u32) -> Option<Vlc> {
    if level == 0 {
        return None;
    }
    let vlc = match run {
        0..=3 => *DCT_DENSE[run as usize].get(level as usize - 1)?,
        4..=31 => *DCT_SPARSE[run as usize - 4].get(level as usize - 1)?,
        _ => return None,
    };
    if vlc.is_none() { None } else { Some(vlc) }
}

/// Number of bits needed for the magnitude of an intra DC differential.
pub fn dc_size(diff: i32) -> usize {
    (32 - diff.unsigned_abs().leading_zeros()) as usize
}
