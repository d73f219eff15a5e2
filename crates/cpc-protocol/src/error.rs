use std::fmt;

/// The wire protocol version this implementation speaks. A `HELLO` whose
/// `meta.version` differs from this MUST be refused.
pub const WIRE_VERSION: u64 = 2;

/// Why a CBOR map failed to decode into a [`crate::Frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    NotAMap,
    UnknownFrameType(u64),
    MissingField(&'static str),
    WrongType(&'static str),
    ExtraneousField(&'static str),
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::NotAMap => write!(f, "frame body is not a CBOR map"),
            MalformedReason::UnknownFrameType(v) => write!(f, "unknown frame_type {v}"),
            MalformedReason::MissingField(name) => write!(f, "missing field {name:?}"),
            MalformedReason::WrongType(name) => write!(f, "field {name:?} has the wrong type"),
            MalformedReason::ExtraneousField(name) => {
                write!(f, "unexpected field {name:?} for this frame type")
            }
        }
    }
}

/// Error produced while encoding or decoding a [`crate::Frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// `meta.version` was present but not [`WIRE_VERSION`].
    VersionMismatch { found: u64 },
    /// The CBOR map did not match the field-presence rules for its frame type.
    MalformedFrame(MalformedReason),
    /// The CBOR bytes themselves did not parse.
    Cbor(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::VersionMismatch { found } => {
                write!(f, "protocol version mismatch: expected {WIRE_VERSION}, found {found}")
            }
            CodecError::MalformedFrame(reason) => write!(f, "malformed frame: {reason}"),
            CodecError::Cbor(msg) => write!(f, "cbor error: {msg}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<MalformedReason> for CodecError {
    fn from(reason: MalformedReason) -> Self {
        CodecError::MalformedFrame(reason)
    }
}
