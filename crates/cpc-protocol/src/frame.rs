use std::fmt;

use crate::message_id::MessageId;

/// Wire discriminant for a [`Frame`] variant.
///
/// Discriminant 2 (`RES`) is intentionally absent: responses are carried by
/// `END`, optionally preceded by `CHUNK`s, rather than a dedicated type.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Hello = 0,
    Req = 1,
    Chunk = 3,
    End = 4,
    Log = 5,
    Err = 6,
    Heartbeat = 7,
    StreamStart = 8,
    StreamEnd = 9,
    RelayNotify = 10,
    RelayState = 11,
}

impl TryFrom<u8> for FrameType {
    type Error = UnknownFrameType;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(FrameType::Hello),
            1 => Ok(FrameType::Req),
            3 => Ok(FrameType::Chunk),
            4 => Ok(FrameType::End),
            5 => Ok(FrameType::Log),
            6 => Ok(FrameType::Err),
            7 => Ok(FrameType::Heartbeat),
            8 => Ok(FrameType::StreamStart),
            9 => Ok(FrameType::StreamEnd),
            10 => Ok(FrameType::RelayNotify),
            11 => Ok(FrameType::RelayState),
            _ => Err(UnknownFrameType(v)),
        }
    }
}

impl From<FrameType> for u8 {
    fn from(ft: FrameType) -> u8 {
        ft as u8
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameType::Hello => "HELLO",
            FrameType::Req => "REQ",
            FrameType::Chunk => "CHUNK",
            FrameType::End => "END",
            FrameType::Log => "LOG",
            FrameType::Err => "ERR",
            FrameType::Heartbeat => "HEARTBEAT",
            FrameType::StreamStart => "STREAM_START",
            FrameType::StreamEnd => "STREAM_END",
            FrameType::RelayNotify => "RELAY_NOTIFY",
            FrameType::RelayState => "RELAY_STATE",
        };
        f.write_str(name)
    }
}

/// An unrecognized frame-type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownFrameType(pub u8);

impl fmt::Display for UnknownFrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown frame type discriminant: {}", self.0)
    }
}

impl std::error::Error for UnknownFrameType {}

/// The reserved `ERR` code used to cancel an in-flight request.
pub const ECANCEL: &str = "ECANCEL";
/// The `ERR` code emitted when no registered provider accepts a request.
pub const ENOPROVIDER: &str = "ENOPROVIDER";
/// The `ERR` code emitted, best-effort, when a peer's handshake version
/// does not match this implementation's.
pub const EVERSION: &str = "EVERSION";

/// A single protocol frame. Each variant carries exactly the fields its
/// frame type requires; there is no field that is meaningful for one
/// variant and absent for another, unlike a single field-bag record.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Hello {
        id: MessageId,
        seq: u64,
        max_frame: u64,
        max_chunk: u64,
        version: u64,
        manifest: Option<Vec<u8>>,
    },
    Req {
        id: MessageId,
        seq: u64,
        cap: String,
        payload: Vec<u8>,
        content_type: Option<String>,
    },
    Chunk {
        id: MessageId,
        seq: u64,
        stream_id: String,
        payload: Vec<u8>,
    },
    End {
        id: MessageId,
        seq: u64,
        eof: bool,
        payload: Option<Vec<u8>>,
    },
    Log {
        id: MessageId,
        seq: u64,
        level: String,
        message: String,
    },
    Err {
        id: MessageId,
        seq: u64,
        code: String,
        message: String,
    },
    Heartbeat {
        id: MessageId,
        seq: u64,
    },
    StreamStart {
        id: MessageId,
        seq: u64,
        stream_id: String,
        media_urn: String,
    },
    StreamEnd {
        id: MessageId,
        seq: u64,
        stream_id: String,
    },
    RelayNotify {
        id: MessageId,
        seq: u64,
        manifest: Vec<u8>,
        max_frame: u64,
        max_chunk: u64,
    },
    RelayState {
        id: MessageId,
        seq: u64,
        payload: Vec<u8>,
    },
}

impl Frame {
    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::Hello { .. } => FrameType::Hello,
            Frame::Req { .. } => FrameType::Req,
            Frame::Chunk { .. } => FrameType::Chunk,
            Frame::End { .. } => FrameType::End,
            Frame::Log { .. } => FrameType::Log,
            Frame::Err { .. } => FrameType::Err,
            Frame::Heartbeat { .. } => FrameType::Heartbeat,
            Frame::StreamStart { .. } => FrameType::StreamStart,
            Frame::StreamEnd { .. } => FrameType::StreamEnd,
            Frame::RelayNotify { .. } => FrameType::RelayNotify,
            Frame::RelayState { .. } => FrameType::RelayState,
        }
    }

    pub fn id(&self) -> MessageId {
        match self {
            Frame::Hello { id, .. }
            | Frame::Req { id, .. }
            | Frame::Chunk { id, .. }
            | Frame::End { id, .. }
            | Frame::Log { id, .. }
            | Frame::Err { id, .. }
            | Frame::Heartbeat { id, .. }
            | Frame::StreamStart { id, .. }
            | Frame::StreamEnd { id, .. }
            | Frame::RelayNotify { id, .. }
            | Frame::RelayState { id, .. } => *id,
        }
    }

    pub fn seq(&self) -> u64 {
        match self {
            Frame::Hello { seq, .. }
            | Frame::Req { seq, .. }
            | Frame::Chunk { seq, .. }
            | Frame::End { seq, .. }
            | Frame::Log { seq, .. }
            | Frame::Err { seq, .. }
            | Frame::Heartbeat { seq, .. }
            | Frame::StreamStart { seq, .. }
            | Frame::StreamEnd { seq, .. }
            | Frame::RelayNotify { seq, .. }
            | Frame::RelayState { seq, .. } => *seq,
        }
    }

    /// Construct the cancellation `ERR` frame for `id` (§4.6).
    pub fn cancel(id: MessageId) -> Self {
        Frame::Err { id, seq: 0, code: ECANCEL.to_string(), message: "cancelled by caller".to_string() }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Frame::Err { code, .. } if code == ECANCEL)
    }
}
