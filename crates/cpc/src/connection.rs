use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use cpc_protocol::{Frame, MessageId, ENOPROVIDER};
use cpc_registry::{CapabilityRegistry, Matched};
use cpc_transport::{Limits, Session, TransportError};

/// One event surfaced to a connection's caller after a frame has passed
/// through routing. Request routing happens here rather than being left
/// to the caller, since it needs the registry and the session together.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A `REQ` whose capability was resolved to a registered provider.
    Request { id: MessageId, cap: String, payload: Vec<u8>, content_type: Option<String>, matched: Matched },
    /// A `REQ` for which no provider accepted; `ERR(ENOPROVIDER)` has
    /// already been sent back to the peer.
    NoProvider { id: MessageId, cap: String },
    /// Any other frame, passed through unmodified for the caller to
    /// interpret (`CHUNK`, `END`, `LOG`, `ERR`, `HEARTBEAT`, streams, relay).
    Frame(Frame),
}

/// Wraps a [`Session`] with a [`CapabilityRegistry`] so incoming `REQ`
/// frames are routed to a provider as part of receiving them.
pub struct Connection<S> {
    session: Session<S>,
    registry: Arc<CapabilityRegistry>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub async fn connect(
        stream: S,
        local: Limits,
        registry: Arc<CapabilityRegistry>,
    ) -> Result<Self, TransportError> {
        let session = Session::connect(stream, local).await?;
        info!(limits = ?session.limits(), "handshake complete (initiator)");
        Ok(Connection { session, registry })
    }

    pub async fn accept(
        stream: S,
        local: Limits,
        manifest: Option<Vec<u8>>,
        registry: Arc<CapabilityRegistry>,
    ) -> Result<Self, TransportError> {
        let session = Session::accept(stream, local, manifest).await?;
        info!(limits = ?session.limits(), "handshake complete (responder)");
        Ok(Connection { session, registry })
    }

    pub fn limits(&self) -> Limits {
        self.session.limits()
    }

    pub fn peer_manifest(&self) -> Option<&[u8]> {
        self.session.peer_manifest()
    }

    pub async fn send_frame(&self, frame: &Frame) -> Result<(), TransportError> {
        self.session.send_frame(frame).await
    }

    /// Cancel an in-flight request (§4.6, supplemented first-class API).
    pub async fn cancel(&self, id: MessageId) -> Result<(), TransportError> {
        self.session.cancel(id).await
    }

    /// Receive the next frame, routing `REQ`s through the registry.
    ///
    /// Returns `Ok(None)` on orderly connection close. Any
    /// [`TransportError`] other than [`TransportError::Closed`] is fatal
    /// and the connection should not be used again afterward.
    pub async fn recv_event(&self) -> Result<Option<Event>, TransportError> {
        let Some(frame) = self.session.recv_frame().await? else { return Ok(None) };
        match frame {
            Frame::Req { id, cap, payload, content_type, .. } => {
                match self.registry.find_best(&cap) {
                    Ok(matched) => {
                        info!(provider = %matched.provider, %cap, "routed request");
                        Ok(Some(Event::Request { id, cap, payload, content_type, matched }))
                    }
                    Err(_) => {
                        warn!(%cap, "no provider accepts this request");
                        let err = Frame::Err { id, seq: 0, code: ENOPROVIDER.to_string(), message: format!("no provider for {cap}") };
                        self.session.send_frame(&err).await?;
                        Ok(Some(Event::NoProvider { id, cap }))
                    }
                }
            }
            other => Ok(Some(Event::Frame(other))),
        }
    }
}
