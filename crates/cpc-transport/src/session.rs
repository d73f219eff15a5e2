use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{split, AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::Mutex as AsyncMutex;

use cpc_protocol::{Frame, MessageId};

use crate::error::TransportError;
use crate::framer::{read_frame, write_frame, DEFAULT_STREAM};
use crate::handshake::{self, HandshakeOutcome};
use crate::limits::Limits;
use crate::streams::StreamManager;

/// Ties the framer, handshake, and stream manager together over one
/// duplex byte stream. One `Session` per connection.
pub struct Session<S> {
    reader: AsyncMutex<ReadHalf<S>>,
    writer: AsyncMutex<WriteHalf<S>>,
    limits: Limits,
    peer_manifest: Option<Vec<u8>>,
    /// Stream bookkeeping for requests currently in flight, keyed by
    /// request `id`. Entries are removed once the request ends.
    in_flight: Mutex<HashMap<MessageId, Arc<StreamManager>>>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    /// Perform the initiator side of the handshake (§4.5 step 1 + 3) and
    /// wrap the now-negotiated connection.
    pub async fn connect(mut stream: S, local: Limits) -> Result<Self, TransportError> {
        let HandshakeOutcome { limits, peer_manifest } = handshake::initiate(&mut stream, local).await?;
        Ok(Self::from_parts(stream, limits, peer_manifest))
    }

    /// Perform the responder side of the handshake (§4.5 step 2).
    pub async fn accept(
        mut stream: S,
        local: Limits,
        manifest: Option<Vec<u8>>,
    ) -> Result<Self, TransportError> {
        let HandshakeOutcome { limits, peer_manifest } =
            handshake::respond(&mut stream, local, manifest).await?;
        Ok(Self::from_parts(stream, limits, peer_manifest))
    }

    fn from_parts(stream: S, limits: Limits, peer_manifest: Option<Vec<u8>>) -> Self {
        let (reader, writer) = split(stream);
        Session {
            reader: AsyncMutex::new(reader),
            writer: AsyncMutex::new(writer),
            limits,
            peer_manifest,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn peer_manifest(&self) -> Option<&[u8]> {
        self.peer_manifest.as_deref()
    }

    pub async fn send_frame(&self, frame: &Frame) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, frame, &self.limits).await
    }

    /// Read one frame, updating multiplexed-stream bookkeeping for the
    /// frame's request. Sequencing violations are fatal per §4.6; the
    /// connection should be closed by the caller on error.
    pub async fn recv_frame(&self) -> Result<Option<Frame>, TransportError> {
        let frame = {
            let mut reader = self.reader.lock().await;
            read_frame(&mut *reader, &self.limits).await?
        };
        let Some(frame) = frame else { return Ok(None) };
        self.track(&frame)?;
        Ok(Some(frame))
    }

    fn manager_for(&self, id: MessageId) -> Arc<StreamManager> {
        self.in_flight.lock().entry(id).or_insert_with(|| Arc::new(StreamManager::new())).clone()
    }

    fn track(&self, frame: &Frame) -> Result<(), TransportError> {
        match frame {
            Frame::StreamStart { id, stream_id, .. } => {
                self.manager_for(*id).on_stream_start(stream_id)?;
            }
            Frame::Chunk { id, stream_id, seq, .. } => {
                let mgr = self.manager_for(*id);
                // The default stream carries a terminal reply's chunks
                // without an explicit STREAM_START/STREAM_END pair (the
                // "legacy" chunking path in `chunk_payload`): open it
                // implicitly on its first chunk instead of requiring an
                // announcement for a stream that is never named.
                if stream_id == DEFAULT_STREAM && !mgr.is_open(stream_id) && *seq == 0 {
                    mgr.on_stream_start(stream_id)?;
                }
                mgr.on_chunk(stream_id, *seq)?;
            }
            Frame::StreamEnd { id, stream_id, .. } => {
                self.manager_for(*id).on_stream_end(stream_id)?;
            }
            Frame::End { id, .. } => {
                if let Some(mgr) = self.in_flight.lock().remove(id) {
                    mgr.on_request_end();
                }
            }
            Frame::Err { id, .. } => {
                if let Some(mgr) = self.in_flight.lock().remove(id) {
                    mgr.on_request_err();
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Cancel an in-flight request: send `ERR(ECANCEL)` and drop local
    /// stream state for it, per the cancellation mechanism in §4.6.
    pub async fn cancel(&self, id: MessageId) -> Result<(), TransportError> {
        self.send_frame(&Frame::cancel(id)).await?;
        if let Some(mgr) = self.in_flight.lock().remove(&id) {
            mgr.on_request_err();
        }
        Ok(())
    }

    /// Send a keepalive. `HEARTBEAT` never affects stream state (§5).
    pub async fn send_heartbeat(&self) -> Result<(), TransportError> {
        self.send_frame(&Frame::Heartbeat { id: MessageId::sentinel(), seq: 0 }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn connect_and_accept_negotiate_and_carry_manifest() {
        let (a, b) = duplex(8192);
        let a_limits = Limits { max_frame: 1000, max_chunk: 500 };
        let b_limits = Limits { max_frame: 800, max_chunk: 256 };

        let a_task = tokio::spawn(async move { Session::connect(a, a_limits).await });
        let b_task = tokio::spawn(async move { Session::accept(b, b_limits, Some(vec![1, 2, 3])).await });

        let a_session = a_task.await.unwrap().unwrap();
        let b_session = b_task.await.unwrap().unwrap();

        let expected = Limits { max_frame: 800, max_chunk: 256 };
        assert_eq!(a_session.limits(), expected);
        assert_eq!(b_session.limits(), expected);
        assert_eq!(a_session.peer_manifest(), Some(&[1, 2, 3][..]));
    }

    #[tokio::test]
    async fn duplicate_stream_start_is_a_fatal_protocol_error() {
        let (a, b) = duplex(8192);
        let a_task = tokio::spawn(async move { Session::connect(a, Limits::default()).await });
        let b_task = tokio::spawn(async move { Session::accept(b, Limits::default(), None).await });
        let a_session = a_task.await.unwrap().unwrap();
        let b_session = b_task.await.unwrap().unwrap();

        let id = MessageId::new_uuid();
        a_session
            .send_frame(&Frame::StreamStart { id, seq: 0, stream_id: "s1".into(), media_urn: "media:bytes".into() })
            .await
            .unwrap();
        a_session
            .send_frame(&Frame::StreamStart { id, seq: 0, stream_id: "s1".into(), media_urn: "media:bytes".into() })
            .await
            .unwrap();

        b_session.recv_frame().await.unwrap();
        let err = b_session.recv_frame().await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol(_)));
    }

    #[tokio::test]
    async fn chunk_without_stream_start_is_fatal() {
        let (a, b) = duplex(8192);
        let a_task = tokio::spawn(async move { Session::connect(a, Limits::default()).await });
        let b_task = tokio::spawn(async move { Session::accept(b, Limits::default(), None).await });
        let a_session = a_task.await.unwrap().unwrap();
        let b_session = b_task.await.unwrap().unwrap();

        let id = MessageId::new_uuid();
        a_session
            .send_frame(&Frame::Chunk { id, seq: 0, stream_id: "ghost".into(), payload: vec![1] })
            .await
            .unwrap();

        let err = b_session.recv_frame().await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol(_)));
    }

    #[tokio::test]
    async fn default_stream_chunks_need_no_stream_start() {
        let (a, b) = duplex(8192);
        let a_task = tokio::spawn(async move { Session::connect(a, Limits::default()).await });
        let b_task = tokio::spawn(async move { Session::accept(b, Limits::default(), None).await });
        let a_session = a_task.await.unwrap().unwrap();
        let b_session = b_task.await.unwrap().unwrap();

        let id = MessageId::new_uuid();
        for frame in crate::framer::chunk_payload(id, DEFAULT_STREAM, &[7u8; 150], 100) {
            a_session.send_frame(&frame).await.unwrap();
        }

        let first = b_session.recv_frame().await.unwrap().unwrap();
        assert!(matches!(first, Frame::Chunk { seq: 0, .. }));
        let second = b_session.recv_frame().await.unwrap().unwrap();
        assert!(matches!(second, Frame::End { .. }));
    }

    #[tokio::test]
    async fn cancel_sends_ecancel_and_clears_local_stream_state() {
        let (a, b) = duplex(8192);
        let a_task = tokio::spawn(async move { Session::connect(a, Limits::default()).await });
        let b_task = tokio::spawn(async move { Session::accept(b, Limits::default(), None).await });
        let a_session = a_task.await.unwrap().unwrap();
        let b_session = b_task.await.unwrap().unwrap();

        let id = MessageId::new_uuid();
        a_session.cancel(id).await.unwrap();
        let frame = b_session.recv_frame().await.unwrap().unwrap();
        assert!(frame.is_cancellation());
    }
}
