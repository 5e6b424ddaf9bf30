use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::EncodeConfig;
use crate::bitwriter::BitWriter;
use crate::error::EncoderError;
use crate::fps::FrameRate;
use crate::frame::{PictureCoder, PictureStats};
use crate::macroblock::MB_SIZE;
use crate::motion::{MotionEstimator, SearchRange};
use crate::packet::{FrameType, Packet, PacketKind};
use crate::quant::{MAX_Q_LEVEL, MIN_Q_LEVEL};
use crate::reference::ReferenceStore;
use crate::sequence::{self, TimeCode};
use crate::y4m::FramePixels;

pub const MIN_MB_DIM: u32 = 4;
const MAX_WIDTH_LIMIT: u32 = 4096;
const MAX_HEIGHT_LIMIT: u32 = 2048;

/// Validated session configuration.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub q_level: u8,
    pub search_range: SearchRange,
    pub p_frames: u8,
    pub frame_rate: FrameRate,
    pub max_width: u32,
    pub max_height: u32,
}

impl EncoderConfig {
    fn validate(mut self) -> Result<Self, EncoderError> {
        let dim_ok = |v: u32, limit: u32| {
            v.is_power_of_two() && (MIN_MB_DIM * MB_SIZE as u32..=limit).contains(&v)
        };
        if !dim_ok(self.max_width, MAX_WIDTH_LIMIT) || !dim_ok(self.max_height, MAX_HEIGHT_LIMIT) {
            return Err(EncoderError::InvalidMaxDimensions {
                max_width: self.max_width,
                max_height: self.max_height,
            });
        }
        self.frame_rate = FrameRate::new(self.frame_rate.num, self.frame_rate.den)?;
        let q_level = self.q_level.clamp(MIN_Q_LEVEL, MAX_Q_LEVEL);
        if q_level != self.q_level {
            warn!("q_level {} out of range, using {q_level}", self.q_level);
            self.q_level = q_level;
        }
        Ok(self)
    }
}

impl TryFrom<&EncodeConfig> for EncoderConfig {
    type Error = EncoderError;

    fn try_from(c: &EncodeConfig) -> Result<Self, Self::Error> {
        Self {
            q_level: c.q_level,
            search_range: c.search_range,
            p_frames: c.p_frames,
            frame_rate: c.frame_rate,
            max_width: c.max_width,
            max_height: c.max_height,
        }
        .validate()
    }
}

/// Running totals over a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderStats {
    pub pictures: u64,
    pub intra_pictures: u64,
    pub intra_macroblocks: u64,
    pub inter_macroblocks: u64,
    pub all_zero_macroblocks: u64,
    pub escapes: u64,
    pub bytes: u64,
}

impl EncoderStats {
    fn add(&mut self, picture: &PictureStats, frame_type: FrameType) {
        self.pictures += 1;
        if frame_type == FrameType::Intra {
            self.intra_pictures += 1;
        }
        self.intra_macroblocks += picture.intra_macroblocks as u64;
        self.inter_macroblocks += picture.inter_macroblocks as u64;
        self.all_zero_macroblocks += picture.all_zero_macroblocks as u64;
        self.escapes += picture.escapes as u64;
    }
}

fn coded_mbs(pixels: u32, max: u32, axis: &str) -> u32 {
    let wanted = pixels.div_ceil(MB_SIZE as u32);
    let limit = max / MB_SIZE as u32;
    let mbs = wanted.clamp(MIN_MB_DIM, limit);
    if mbs != wanted {
        warn!("{axis} {pixels} coded as {} pixels", mbs * MB_SIZE as u32);
    }
    mbs
}

#[derive(Debug)]
pub struct Encoder {
    config: EncoderConfig,
    width: u32,
    height: u32,
    coder: PictureCoder,
    reference: ReferenceStore,
    writer: BitWriter,
    frame_index: u64,
    packets: VecDeque<Packet>,
    stats: EncoderStats,
    finished: bool,
}

impl Encoder {
    /// Starts a session for `width` x `height` input frames. The coded size
    /// is the input rounded up to whole macroblocks, clamped to between four
    /// macroblocks and the configured maximum on each axis.
    pub fn new(width: u32, height: u32, config: EncoderConfig) -> Result<Self, EncoderError> {
        let config = config.validate()?;
        let mb_cols = coded_mbs(width, config.max_width, "width");
        let mb_rows = coded_mbs(height, config.max_height, "height");

        let mut reference = ReferenceStore::new(config.max_width, config.max_height);
        reference.reset(mb_cols * MB_SIZE as u32, mb_rows * MB_SIZE as u32);

        let coder = PictureCoder {
            mb_cols,
            mb_rows,
            q_level: config.q_level,
            estimator: MotionEstimator::new(config.search_range),
        };

        debug!(
            "session {width}x{height} coded {}x{} q_level {} range {:?} gop {} fps {}",
            mb_cols * MB_SIZE as u32,
            mb_rows * MB_SIZE as u32,
            config.q_level,
            config.search_range,
            config.p_frames as u32 + 1,
            config.frame_rate
        );

        Ok(Self {
            config,
            width,
            height,
            coder,
            reference,
            writer: BitWriter::new(),
            frame_index: 0,
            packets: VecDeque::new(),
            stats: EncoderStats::default(),
            finished: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn coded_width(&self) -> u32 {
        self.coder.mb_cols * MB_SIZE as u32
    }

    pub fn coded_height(&self) -> u32 {
        self.coder.mb_rows * MB_SIZE as u32
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Sequence header and sequence extension as repeated before each GOP.
    pub fn headers(&self) -> Vec<u8> {
        let mut w = BitWriter::new();
        self.write_sequence_headers(&mut w);
        w.finalize()
    }

    fn write_sequence_headers(&self, w: &mut BitWriter) {
        let (cw, ch) = (self.coded_width(), self.coded_height());
        sequence::write_sequence_header(w, cw, ch, self.config.frame_rate.code());
        sequence::write_sequence_extension(w, cw, ch);
    }

    pub fn send_frame(&mut self, pixels: &FramePixels) -> Result<(), EncoderError> {
        if self.finished {
            return Err(EncoderError::SessionFinished);
        }
        if pixels.width != self.width || pixels.height != self.height {
            return Err(EncoderError::DimensionMismatch {
                expected_w: self.width,
                expected_h: self.height,
                got_w: pixels.width,
                got_h: pixels.height,
            });
        }

        let gop_len = self.config.p_frames as u64 + 1;
        let temporal_reference = (self.frame_index % gop_len) as u32;
        let frame_type = if temporal_reference == 0 {
            FrameType::Intra
        } else {
            FrameType::Predicted
        };

        let mut writer = std::mem::take(&mut self.writer);
        if frame_type == FrameType::Intra {
            self.write_sequence_headers(&mut writer);
            let time_code = TimeCode::from_picture_count(self.frame_index, self.config.frame_rate.nominal());
            sequence::write_gop_header(&mut writer, time_code);
        }

        let picture = self.coder.encode(
            &mut writer,
            pixels,
            frame_type,
            temporal_reference,
            &mut self.reference,
        );

        let data = writer.take_words();
        self.writer = writer;
        self.stats.add(&picture, frame_type);
        self.stats.bytes += data.len() as u64;

        debug!(
            "picture {} {:?}: {} bits, {} intra / {} inter ({} all-zero) macroblocks, {} escapes",
            self.frame_index,
            frame_type,
            picture.bits,
            picture.intra_macroblocks,
            picture.inter_macroblocks,
            picture.all_zero_macroblocks,
            picture.escapes
        );

        self.packets.push_back(Packet {
            data,
            kind: PacketKind::Picture(frame_type),
            frame_number: self.frame_index,
        });
        self.frame_index += 1;

        Ok(())
    }

    pub fn receive_packet(&mut self) -> Option<Packet> {
        self.packets.pop_front()
    }

    /// Ends the sequence: writes the end code, pads to a whole output word
    /// and queues the tail as the last packet. A session that never coded a
    /// picture produces no output.
    pub fn flush(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if self.frame_index == 0 {
            return;
        }

        let mut writer = std::mem::take(&mut self.writer);
        sequence::write_sequence_end(&mut writer);
        let data = writer.finalize();
        self.stats.bytes += data.len() as u64;
        self.packets.push_back(Packet {
            data,
            kind: PacketKind::EndOfSequence,
            frame_number: self.frame_index,
        });

        info!(
            "sequence end: {} pictures ({} intra), {} bytes",
            self.stats.pictures, self.stats.intra_pictures, self.stats.bytes
        );
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Current reference picture at the coded size.
    pub fn reconstructed(&self) -> FramePixels {
        self.reference.snapshot()
    }

    pub fn stats(&self) -> &EncoderStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EncoderConfig {
        EncoderConfig::try_from(&EncodeConfig::default()).unwrap()
    }

    #[test]
    fn new_valid_dimensions() {
        let enc = Encoder::new(64, 64, config()).unwrap();
        assert_eq!(enc.width(), 64);
        assert_eq!(enc.height(), 64);
        assert_eq!(enc.coded_width(), 64);
        assert_eq!(enc.coded_height(), 64);
    }

    #[test]
    fn small_frames_are_clamped_up() {
        let enc = Encoder::new(1, 20, config()).unwrap();
        assert_eq!(enc.coded_width(), 64);
        assert_eq!(enc.coded_height(), 64);
    }

    #[test]
    fn empty_frames_code_as_gray() {
        let mut enc = Encoder::new(0, 0, config()).unwrap();
        assert_eq!((enc.coded_width(), enc.coded_height()), (64, 64));

        enc.send_frame(&FramePixels::solid(0, 0, 1, 2, 3)).unwrap();
        let packet = enc.receive_packet().unwrap();
        assert_eq!(packet.kind, PacketKind::Picture(FrameType::Intra));
        assert!(enc.reconstructed().y.iter().all(|&p| p == 128));

        enc.send_frame(&FramePixels::solid(0, 0, 1, 2, 3)).unwrap();
        let packet = enc.receive_packet().unwrap();
        assert_eq!(packet.kind, PacketKind::Picture(FrameType::Predicted));
    }

    #[test]
    fn odd_frames_round_up_to_macroblocks() {
        let enc = Encoder::new(100, 70, config()).unwrap();
        assert_eq!(enc.coded_width(), 112);
        assert_eq!(enc.coded_height(), 80);
    }

    #[test]
    fn large_frames_are_clamped_to_maximum() {
        let mut c = config();
        c.max_width = 128;
        c.max_height = 64;
        let enc = Encoder::new(300, 300, c).unwrap();
        assert_eq!(enc.coded_width(), 128);
        assert_eq!(enc.coded_height(), 64);
    }

    #[test]
    fn invalid_max_dimensions() {
        for (w, h) in [(100, 64), (32, 64), (8192, 64), (64, 4096), (0, 64)] {
            let mut c = config();
            c.max_width = w;
            c.max_height = h;
            match Encoder::new(64, 64, c).unwrap_err() {
                EncoderError::InvalidMaxDimensions { max_width, max_height } => {
                    assert_eq!((max_width, max_height), (w, h));
                }
                other => panic!("expected InvalidMaxDimensions, got {other:?}"),
            }
        }
    }

    #[test]
    fn invalid_frame_rate() {
        let mut c = config();
        c.frame_rate = FrameRate { num: 15, den: 1 };
        assert!(matches!(
            Encoder::new(64, 64, c),
            Err(EncoderError::InvalidFrameRate { num: 15, den: 1 })
        ));
    }

    #[test]
    fn q_level_is_clamped() {
        let mut c = config();
        c.q_level = 9;
        let enc = Encoder::new(64, 64, c).unwrap();
        assert_eq!(enc.config().q_level, MAX_Q_LEVEL);
        let mut c = config();
        c.q_level = 0;
        let enc = Encoder::new(64, 64, c).unwrap();
        assert_eq!(enc.config().q_level, MIN_Q_LEVEL);
    }

    #[test]
    fn send_frame_receive_packet_lifecycle() {
        let mut enc = Encoder::new(64, 64, config()).unwrap();
        let frame = FramePixels::solid(64, 64, 128, 128, 128);

        assert!(enc.receive_packet().is_none());

        enc.send_frame(&frame).unwrap();
        let packet = enc.receive_packet().unwrap();

        assert_eq!(packet.kind, PacketKind::Picture(FrameType::Intra));
        assert_eq!(packet.frame_number, 0);
        assert!(!packet.data.is_empty());
        assert_eq!(packet.data.len() % 4, 0);
        assert_eq!(&packet.data[..4], &[0x00, 0x00, 0x01, 0xB3]);

        assert!(enc.receive_packet().is_none());
    }

    #[test]
    fn gop_structure_follows_p_frames() {
        let mut c = config();
        c.p_frames = 2;
        let mut enc = Encoder::new(64, 64, c).unwrap();
        let frame = FramePixels::solid(64, 64, 128, 128, 128);

        let expected_types = [
            FrameType::Intra,
            FrameType::Predicted,
            FrameType::Predicted,
            FrameType::Intra,
            FrameType::Predicted,
        ];

        for (n, expected) in expected_types.iter().enumerate() {
            enc.send_frame(&frame).unwrap();
            let packet = enc.receive_packet().unwrap();
            assert_eq!(packet.frame_type(), Some(*expected));
            assert_eq!(packet.frame_number, n as u64);
        }
        assert_eq!(enc.stats().pictures, 5);
        assert_eq!(enc.stats().intra_pictures, 2);
    }

    #[test]
    fn zero_p_frames_is_all_intra() {
        let mut c = config();
        c.p_frames = 0;
        let mut enc = Encoder::new(64, 64, c).unwrap();
        let frame = FramePixels::solid(64, 64, 10, 20, 30);
        for _ in 0..3 {
            enc.send_frame(&frame).unwrap();
            assert_eq!(enc.receive_packet().unwrap().frame_type(), Some(FrameType::Intra));
        }
        assert_eq!(enc.stats().inter_macroblocks, 0);
    }

    #[test]
    fn dimension_mismatch_error() {
        let mut enc = Encoder::new(64, 64, config()).unwrap();
        let wrong_frame = FramePixels::solid(128, 128, 128, 128, 128);

        match enc.send_frame(&wrong_frame).unwrap_err() {
            EncoderError::DimensionMismatch {
                expected_w,
                expected_h,
                got_w,
                got_h,
            } => {
                assert_eq!((expected_w, expected_h), (64, 64));
                assert_eq!((got_w, got_h), (128, 128));
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn flush_without_pictures_is_empty() {
        let mut enc = Encoder::new(64, 64, config()).unwrap();
        enc.flush();
        assert!(enc.is_finished());
        assert!(enc.receive_packet().is_none());
    }

    #[test]
    fn flush_ends_sequence() {
        let mut enc = Encoder::new(64, 64, config()).unwrap();
        enc.send_frame(&FramePixels::solid(64, 64, 1, 2, 3)).unwrap();
        enc.receive_packet();
        enc.flush();
        let tail = enc.receive_packet().unwrap();
        assert_eq!(tail.kind, PacketKind::EndOfSequence);
        assert_eq!(tail.frame_type(), None);
        assert_eq!(tail.data.len() % 4, 0);
        let end = tail.data.windows(4).rposition(|w| w == [0x00, 0x00, 0x01, 0xB7]);
        assert!(end.is_some());
        assert!(tail.data[end.unwrap() + 4..].iter().all(|&b| b == 0));

        assert!(matches!(
            enc.send_frame(&FramePixels::solid(64, 64, 1, 2, 3)),
            Err(EncoderError::SessionFinished)
        ));
        enc.flush();
        assert!(enc.receive_packet().is_none());
    }

    #[test]
    fn headers_match_stream_start() {
        let mut enc = Encoder::new(64, 64, config()).unwrap();
        let headers = enc.headers();
        assert_eq!(&headers[..4], &[0x00, 0x00, 0x01, 0xB3]);
        enc.send_frame(&FramePixels::solid(64, 64, 128, 128, 128)).unwrap();
        let packet = enc.receive_packet().unwrap();
        // header padding lines up with the zero prefix of the GOP start code
        assert_eq!(&packet.data[..headers.len()], &headers[..]);
    }

    #[test]
    fn reconstructed_tracks_last_picture() {
        let mut enc = Encoder::new(64, 64, config()).unwrap();
        let frame = FramePixels::solid(64, 64, 60, 70, 80);
        enc.send_frame(&frame).unwrap();
        assert_eq!(enc.reconstructed(), frame);
        enc.send_frame(&frame).unwrap();
        assert_eq!(enc.reconstructed(), frame);
        assert_eq!(enc.stats().all_zero_macroblocks, 16);
    }

    #[test]
    fn stats_count_bytes_of_all_packets() {
        let mut enc = Encoder::new(64, 64, config()).unwrap();
        let mut total = 0;
        for i in 0..3 {
            enc.send_frame(&FramePixels::grid(64, 64, i)).unwrap();
            while let Some(p) = enc.receive_packet() {
                total += p.data.len() as u64;
            }
        }
        enc.flush();
        while let Some(p) = enc.receive_packet() {
            total += p.data.len() as u64;
        }
        assert_eq!(enc.stats().bytes, total);
    }

    #[test]
    fn encoder_config_from_encode_config() {
        let ec = EncodeConfig {
            q_level: 3,
            search_range: SearchRange::Wide,
            p_frames: 10,
            frame_rate: FrameRate::new(60_000, 1_001).unwrap(),
            max_width: 1024,
            max_height: 512,
        };
        let config = EncoderConfig::try_from(&ec).unwrap();
        assert_eq!(config.q_level, 3);
        assert_eq!(config.search_range, SearchRange::Wide);
        assert_eq!(config.p_frames, 10);
        assert_eq!(config.frame_rate.code(), 7);
        assert_eq!((config.max_width, config.max_height), (1024, 512));
    }
}
