use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error(
        "invalid maximum dimensions {max_width}x{max_height}: each must be a power of two, \
         width 64..=4096 and height 64..=2048"
    )]
    InvalidMaxDimensions { max_width: u32, max_height: u32 },
    #[error("frame rate {num}/{den} has no MPEG-2 frame_rate_code")]
    InvalidFrameRate { num: u32, den: u32 },
    #[error("frame dimension mismatch: expected {expected_w}x{expected_h}, got {got_w}x{got_h}")]
    DimensionMismatch {
        expected_w: u32,
        expected_h: u32,
        got_w: u32,
        got_h: u32,
    },
    #[error("invalid Y4M data: {0}")]
    Y4m(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("sequence already ended")]
    SessionFinished,
}
