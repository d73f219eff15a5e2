use tokio::io::{AsyncRead, AsyncWrite};

use cpc_protocol::{CodecError, Frame, MalformedReason, MessageId, WIRE_VERSION};

use crate::error::TransportError;
use crate::framer::{read_frame, write_frame};
use crate::limits::{Limits, HARD_LIMIT};

/// The outcome of a completed handshake: the negotiated `Limits` in effect
/// for the rest of the connection, and the peer's opaque capability
/// manifest, if it sent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeOutcome {
    pub limits: Limits,
    pub peer_manifest: Option<Vec<u8>>,
}

/// `Limits` generous enough that our own `HELLO` can never be rejected by
/// our own writer before negotiation has produced a real limit.
fn pre_negotiation_limits() -> Limits {
    Limits { max_frame: HARD_LIMIT, max_chunk: HARD_LIMIT }
}

fn not_a_hello() -> TransportError {
    TransportError::MalformedFrame(CodecError::MalformedFrame(MalformedReason::WrongType("frame_type")))
}

/// Step 1 + 3: send the initiator's `HELLO`, then read the responder's.
pub async fn initiate<RW: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut RW,
    local: Limits,
) -> Result<HandshakeOutcome, TransportError> {
    let hello = Frame::Hello {
        id: MessageId::sentinel(),
        seq: 0,
        max_frame: local.max_frame,
        max_chunk: local.max_chunk,
        version: WIRE_VERSION,
        manifest: None,
    };
    write_frame(stream, &hello, &pre_negotiation_limits()).await?;

    let reply = read_frame(stream, &pre_negotiation_limits()).await?.ok_or(TransportError::Truncated)?;
    match reply {
        Frame::Hello { max_frame, max_chunk, version, manifest, .. } => {
            if version != WIRE_VERSION {
                return Err(TransportError::VersionMismatch { found: version });
            }
            let peer = Limits { max_frame, max_chunk };
            Ok(HandshakeOutcome { limits: Limits::negotiate(local, peer), peer_manifest: manifest })
        }
        _ => Err(not_a_hello()),
    }
}

/// Step 2: read the initiator's `HELLO`, then send ours (with `manifest`).
pub async fn respond<RW: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut RW,
    local: Limits,
    manifest: Option<Vec<u8>>,
) -> Result<HandshakeOutcome, TransportError> {
    let first = read_frame(stream, &pre_negotiation_limits()).await?.ok_or(TransportError::Truncated)?;
    let peer = match first {
        Frame::Hello { max_frame, max_chunk, version, .. } => {
            if version != WIRE_VERSION {
                return Err(TransportError::VersionMismatch { found: version });
            }
            Limits { max_frame, max_chunk }
        }
        _ => return Err(not_a_hello()),
    };

    let reply = Frame::Hello {
        id: MessageId::sentinel(),
        seq: 0,
        max_frame: local.max_frame,
        max_chunk: local.max_chunk,
        version: WIRE_VERSION,
        manifest,
    };
    write_frame(stream, &reply, &pre_negotiation_limits()).await?;

    Ok(HandshakeOutcome { limits: Limits::negotiate(local, peer), peer_manifest: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn handshake_negotiates_the_minimum_of_both_sides() {
        let (mut a, mut b) = duplex(8192);
        let a_limits = Limits { max_frame: 1000, max_chunk: 500 };
        let b_limits = Limits { max_frame: 800, max_chunk: 256 };

        let a_task = tokio::spawn(async move { initiate(&mut a, a_limits).await });
        let b_task =
            tokio::spawn(async move { respond(&mut b, b_limits, Some(vec![0xDE, 0xAD, 0xBE, 0xEF])).await });

        let a_outcome = a_task.await.unwrap().unwrap();
        let b_outcome = b_task.await.unwrap().unwrap();

        let expected = Limits { max_frame: 800, max_chunk: 256 };
        assert_eq!(a_outcome.limits, expected);
        assert_eq!(b_outcome.limits, expected);
        assert_eq!(a_outcome.peer_manifest, Some(vec![0xDE, 0xAD, 0xBE, 0xEF]));
        assert_eq!(b_outcome.peer_manifest, None);
    }

    #[tokio::test]
    async fn version_mismatch_is_rejected_by_responder() {
        let (mut a, mut b) = duplex(8192);
        let bad_hello = Frame::Hello {
            id: MessageId::sentinel(),
            seq: 0,
            max_frame: 1000,
            max_chunk: 500,
            version: 1,
            manifest: None,
        };
        write_frame(&mut a, &bad_hello, &pre_negotiation_limits()).await.unwrap();

        let err = respond(&mut b, Limits::default(), None).await.unwrap_err();
        assert!(matches!(err, TransportError::VersionMismatch { found: 1 }));
    }

    #[tokio::test]
    async fn version_mismatch_is_rejected_by_initiator() {
        let (mut a, mut b) = duplex(8192);
        let a_limits = Limits::default();

        let a_task = tokio::spawn(async move { initiate(&mut a, a_limits).await });

        let _their_hello = read_frame(&mut b, &pre_negotiation_limits()).await.unwrap().unwrap();
        let bad_reply = Frame::Hello {
            id: MessageId::sentinel(),
            seq: 0,
            max_frame: 1000,
            max_chunk: 500,
            version: 1,
            manifest: None,
        };
        write_frame(&mut b, &bad_reply, &pre_negotiation_limits()).await.unwrap();

        let err = a_task.await.unwrap().unwrap_err();
        assert!(matches!(err, TransportError::VersionMismatch { found: 1 }));
    }
}
