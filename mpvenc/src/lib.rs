#![forbid(unsafe_code)]

pub mod bitwriter;
pub mod dct;
pub mod encoder;
pub mod entropy;
pub mod error;
pub mod fps;
pub mod frame;
pub mod macroblock;
pub mod motion;
pub mod packet;
pub mod quant;
pub mod recon;
pub mod reference;
pub mod scan;
pub mod sequence;
pub mod transform;
pub mod vlc;
pub mod y4m;

pub use encoder::{Encoder, EncoderConfig, EncoderStats};
pub use error::EncoderError;
pub use fps::FrameRate;
pub use motion::SearchRange;
pub use packet::{FrameType, Packet, PacketKind};
pub use y4m::FramePixels;

pub const DEFAULT_Q_LEVEL: u8 = 2;
pub const DEFAULT_P_FRAMES: u8 = 11;
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;

#[derive(Debug, Clone)]
pub struct EncodeConfig {
    pub q_level: u8,
    pub search_range: SearchRange,
    pub p_frames: u8,
    pub frame_rate: FrameRate,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            q_level: DEFAULT_Q_LEVEL,
            search_range: SearchRange::default(),
            p_frames: DEFAULT_P_FRAMES,
            frame_rate: FrameRate::default(),
            max_width: DEFAULT_MAX_DIMENSION,
            max_height: DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Codes `frames` as one elementary stream. All frames must share the size
/// of the first. An empty slice yields an empty stream.
pub fn encode(frames: &[FramePixels], config: &EncodeConfig) -> Result<Vec<u8>, EncoderError> {
    let Some(first) = frames.first() else {
        return Ok(Vec::new());
    };

    let mut enc = Encoder::new(first.width, first.height, EncoderConfig::try_from(config)?)?;
    let mut output = Vec::new();

    for pixels in frames {
        enc.send_frame(pixels)?;
        while let Some(packet) = enc.receive_packet() {
            output.extend_from_slice(&packet.data);
        }
    }

    enc.flush();
    while let Some(packet) = enc.receive_packet() {
        output.extend_from_slice(&packet.data);
    }

    Ok(output)
}

/// `frames` repetitions of one solid-colour picture.
pub fn encode_solid(
    width: u32,
    height: u32,
    y: u8,
    u: u8,
    v: u8,
    frames: usize,
    config: &EncodeConfig,
) -> Result<Vec<u8>, EncoderError> {
    let pixels = FramePixels::solid(width, height, y, u, v);
    encode(&vec![pixels; frames], config)
}
