use crate::vlc::Vlc;

/// Size of one output word. Completed words are the unit handed to the
/// transport, and the stream is zero-padded to a whole word when it ends.
pub const OUTPUT_WORD_BYTES: usize = 4;

const WORD_BITS: u32 = (OUTPUT_WORD_BYTES * 8) as u32;

#[derive(Debug, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    acc: u64,
    bits: u32,
    total_bits: u64,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u32, 1);
    }

    pub fn write_bits(&mut self, value: u32, n: u8) {
        debug_assert!(n <= 32);
        if n == 0 {
            return;
        }
        let mask = (1u64 << n) - 1;
        self.acc = (self.acc << n) | (value as u64 & mask);
        self.bits += n as u32;
        self.total_bits += n as u64;
        while self.bits >= WORD_BITS {
            let word = (self.acc >> (self.bits - WORD_BITS)) as u32;
            self.buf.extend_from_slice(&word.to_be_bytes());
            self.bits -= WORD_BITS;
            self.acc &= (1u64 << self.bits) - 1;
        }
    }

    pub fn write_vlc(&mut self, vlc: Vlc) {
        self.write_bits(vlc.code, vlc.len);
    }

    pub fn bit_position(&self) -> u64 {
        self.total_bits
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.bits.is_multiple_of(8)
    }

    pub fn byte_align(&mut self) {
        let rem = self.bits % 8;
        if rem != 0 {
            self.write_bits(0, (8 - rem) as u8);
        }
    }

    /// Byte-aligns and writes the 32-bit start code `0x000001xx`.
    pub fn start_code(&mut self, code: u8) {
        self.byte_align();
        self.write_bits(0x0000_01, 24);
        self.write_bits(code as u32, 8);
    }

    /// Drains the output words completed so far. Bits of a partial word stay
    /// in the accumulator.
    pub fn take_words(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    pub fn finalize(mut self) -> Vec<u8> {
        self.byte_align();
        let pending_bytes = self.bits / 8;
        for i in (0..pending_bytes).rev() {
            self.buf.push((self.acc >> (i * 8)) as u8);
        }
        self.bits = 0;
        self.acc = 0;
        while !self.buf.len().is_multiple_of(OUTPUT_WORD_BYTES) {
            self.buf.push(0);
        }
        self.buf
    }
}
