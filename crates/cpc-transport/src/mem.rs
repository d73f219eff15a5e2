use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex as AsyncMutex};

use cpc_protocol::Frame;

use crate::error::TransportError;

const CHANNEL_CAPACITY: usize = 64;

/// An in-process, frame-level transport for tests: a pair of these move
/// [`Frame`]s directly through `tokio::sync::mpsc` channels, bypassing the
/// byte-level framer entirely. Handy for exercising handshake, stream, and
/// dispatcher logic without a real byte stream.
#[derive(Clone, Debug)]
pub struct MemTransport {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    tx: mpsc::Sender<Frame>,
    rx: AsyncMutex<mpsc::Receiver<Frame>>,
    closed: AtomicBool,
}

impl MemTransport {
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_a) = mpsc::channel(CHANNEL_CAPACITY);
        let (tx_b, rx_b) = mpsc::channel(CHANNEL_CAPACITY);

        let a = Inner { tx: tx_b, rx: AsyncMutex::new(rx_a), closed: AtomicBool::new(false) };
        let b = Inner { tx: tx_a, rx: AsyncMutex::new(rx_b), closed: AtomicBool::new(false) };

        (MemTransport { inner: Arc::new(a) }, MemTransport { inner: Arc::new(b) })
    }

    pub async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.inner.tx.send(frame).await.map_err(|_| TransportError::Closed)
    }

    pub async fn recv(&self) -> Result<Frame, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let mut rx = self.inner.rx.lock().await;
        rx.recv().await.ok_or(TransportError::Closed)
    }

    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpc_protocol::MessageId;

    #[tokio::test]
    async fn frames_sent_on_one_side_arrive_on_the_other() {
        let (a, b) = MemTransport::pair();
        let frame = Frame::Heartbeat { id: MessageId::sentinel(), seq: 0 };
        a.send(frame.clone()).await.unwrap();
        let received = b.recv().await.unwrap();
        assert_eq!(received, frame);
    }

    #[tokio::test]
    async fn closing_one_side_fails_further_sends_on_that_side() {
        let (a, _b) = MemTransport::pair();
        a.close();
        let err = a.send(Frame::Heartbeat { id: MessageId::sentinel(), seq: 0 }).await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[tokio::test]
    async fn dropping_the_sender_side_closes_recv() {
        let (a, b) = MemTransport::pair();
        drop(a);
        let err = b.recv().await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }
}
