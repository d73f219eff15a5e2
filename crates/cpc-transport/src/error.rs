use std::fmt;

use cpc_protocol::CodecError;

/// A multiplexed-stream sequencing violation (§4.6). All of these are
/// fatal for the connection; per-request faults use `ERR` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// `STREAM_START` for a stream ID that is already open.
    DuplicateStream { stream_id: String },
    /// `CHUNK` whose `seq` doesn't match the stream's next expected `seq`,
    /// or that names a stream that was never opened.
    OutOfOrderOrUnknownStream { stream_id: String },
    /// `STREAM_END` for a stream that was never opened.
    UnknownStream { stream_id: String },
    /// `CHUNK` received after that stream's `STREAM_END`.
    ChunkAfterEnd { stream_id: String },
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolViolation::DuplicateStream { stream_id } => {
                write!(f, "stream {stream_id:?} already open")
            }
            ProtocolViolation::OutOfOrderOrUnknownStream { stream_id } => {
                write!(f, "out-of-order or unknown stream {stream_id:?}")
            }
            ProtocolViolation::UnknownStream { stream_id } => {
                write!(f, "unknown stream {stream_id:?}")
            }
            ProtocolViolation::ChunkAfterEnd { stream_id } => {
                write!(f, "chunk received after end of stream {stream_id:?}")
            }
        }
    }
}

/// Error produced by the framer, handshake, or stream manager. Every
/// variant except [`TransportError::Closed`] and the handler-visible
/// application errors is fatal for the connection (§7).
#[derive(Debug)]
pub enum TransportError {
    /// EOF occurred mid-length-prefix or mid-body.
    Truncated,
    /// Encoded or incoming frame exceeds the negotiated `max_frame`.
    FrameTooLarge { size: u64, max_frame: u64 },
    /// Encoded or incoming frame exceeds the absolute hard limit.
    HardLimitExceeded { size: u64 },
    /// The frame's CBOR body failed to decode.
    MalformedFrame(CodecError),
    /// A peer's handshake `version` did not match ours.
    VersionMismatch { found: u64 },
    /// A multiplexed-stream sequencing rule was violated.
    Protocol(ProtocolViolation),
    /// The connection is already closed.
    Closed,
    /// The underlying byte stream returned an I/O error.
    Io(std::io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Truncated => write!(f, "connection truncated mid-frame"),
            TransportError::FrameTooLarge { size, max_frame } => {
                write!(f, "frame of {size} bytes exceeds negotiated max_frame of {max_frame}")
            }
            TransportError::HardLimitExceeded { size } => {
                write!(f, "frame of {size} bytes exceeds the hard limit")
            }
            TransportError::MalformedFrame(e) => write!(f, "malformed frame: {e}"),
            TransportError::VersionMismatch { found } => {
                write!(f, "handshake version mismatch: found {found}")
            }
            TransportError::Protocol(v) => write!(f, "protocol error: {v}"),
            TransportError::Closed => write!(f, "connection closed"),
            TransportError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::MalformedFrame(e) => Some(e),
            TransportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}

impl From<CodecError> for TransportError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::VersionMismatch { found } => TransportError::VersionMismatch { found },
            other => TransportError::MalformedFrame(other),
        }
    }
}

impl From<ProtocolViolation> for TransportError {
    fn from(v: ProtocolViolation) -> Self {
        TransportError::Protocol(v)
    }
}
