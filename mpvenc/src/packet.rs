#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Intra,
    Predicted,
}

impl FrameType {
    /// `picture_coding_type` of the picture header.
    pub fn coding_type(self) -> u32 {
        match self {
            FrameType::Intra => 1,
            FrameType::Predicted => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Picture(FrameType),
    EndOfSequence,
}

/// Output words completed while coding one picture, or the stream tail
/// written by [`crate::Encoder::flush`].
#[derive(Debug)]
pub struct Packet {
    pub data: Vec<u8>,
    pub kind: PacketKind,
    pub frame_number: u64,
}

impl Packet {
    pub fn frame_type(&self) -> Option<FrameType> {
        match self.kind {
            PacketKind::Picture(t) => Some(t),
            PacketKind::EndOfSequence => None,
        }
    }
}
