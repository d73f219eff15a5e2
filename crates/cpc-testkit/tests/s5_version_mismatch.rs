//! S5 — Version mismatch.
//!
//! A peer's `HELLO{version:1,...}` must be rejected with
//! `TransportError::VersionMismatch`. The responder drops the connection
//! without completing the handshake, so no [`Session`] is ever produced
//! for either side.

use cpc_protocol::{codec, Frame, MessageId};
use cpc_transport::{Limits, Session, TransportError};
use tokio::io::{duplex, AsyncWriteExt};

#[tokio::test]
async fn mismatched_version_fails_the_handshake() {
    let (mut a, b) = duplex(8192);

    let hello = Frame::Hello { id: MessageId::sentinel(), seq: 0, max_frame: 1000, max_chunk: 500, version: 1, manifest: None };
    let body = codec::encode(&hello).unwrap();
    a.write_all(&(body.len() as u32).to_be_bytes()).await.unwrap();
    a.write_all(&body).await.unwrap();
    a.flush().await.unwrap();

    let err = Session::accept(b, Limits::default(), None).await.unwrap_err();
    assert!(matches!(err, TransportError::VersionMismatch { found: 1 }));
}
