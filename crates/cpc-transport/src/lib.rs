//! Byte-level framing, handshake negotiation, and multiplexed-stream
//! bookkeeping for the capability protocol.
//!
//! [`session::Session`] is the entry point: it performs the handshake
//! (`Session::connect`/`Session::accept`), then exposes `send_frame`/
//! `recv_frame` over the negotiated [`limits::Limits`], tracking
//! `STREAM_START`/`CHUNK`/`STREAM_END` sequencing per request and turning
//! violations into fatal [`error::TransportError::Protocol`] errors.

pub mod error;
pub mod framer;
pub mod handshake;
pub mod heartbeat;
pub mod limits;
pub mod mem;
pub mod session;
pub mod streams;

pub use error::{ProtocolViolation, TransportError};
pub use framer::{chunk_payload, read_frame, write_frame, DEFAULT_STREAM};
pub use handshake::HandshakeOutcome;
pub use heartbeat::Heartbeat;
pub use limits::{Limits, DEFAULT_MAX_CHUNK, DEFAULT_MAX_FRAME, HARD_LIMIT};
pub use mem::MemTransport;
pub use session::Session;
pub use streams::StreamManager;
