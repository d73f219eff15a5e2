//! S4 — Protocol violation.
//!
//! A `CHUNK` for a stream that was never opened with `STREAM_START` must
//! be a fatal `ProtocolError::OutOfOrderOrUnknownStream`, closing the
//! connection (no further frames are processed).

use tokio::io::duplex;

use cpc_protocol::{Frame, MessageId};
use cpc_transport::{Limits, ProtocolViolation, Session, TransportError};

#[tokio::test]
async fn chunk_without_stream_start_is_fatal() {
    let (a, b) = duplex(8192);

    let a_task = tokio::spawn(async move { Session::connect(a, Limits::default()).await });
    let b_task = tokio::spawn(async move { Session::accept(b, Limits::default(), None).await });
    let a_session = a_task.await.unwrap().unwrap();
    let b_session = b_task.await.unwrap().unwrap();

    let id = MessageId::new_uuid();
    a_session
        .send_frame(&Frame::Chunk { id, seq: 0, stream_id: "s1".into(), payload: vec![1, 2, 3] })
        .await
        .unwrap();

    let err = b_session.recv_frame().await.unwrap_err();
    match err {
        TransportError::Protocol(ProtocolViolation::OutOfOrderOrUnknownStream { stream_id }) => {
            assert_eq!(stream_id, "s1");
        }
        other => panic!("expected OutOfOrderOrUnknownStream, got {other:?}"),
    }
}
