use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::ProtocolViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Open { next_seq: u64 },
    Closed,
}

/// Tracks `STREAM_START`/`CHUNK`/`STREAM_END` sequencing for the streams
/// opened within a single request, per the transition table in §4.6.
///
/// One `StreamManager` is scoped to one `(request_id)`; stream IDs are
/// only unique within that scope.
#[derive(Debug, Default)]
pub struct StreamManager {
    streams: Mutex<HashMap<String, StreamState>>,
}

impl StreamManager {
    pub fn new() -> Self {
        StreamManager { streams: Mutex::new(HashMap::new()) }
    }

    pub fn on_stream_start(&self, stream_id: &str) -> Result<(), ProtocolViolation> {
        let mut streams = self.streams.lock();
        if streams.contains_key(stream_id) {
            return Err(ProtocolViolation::DuplicateStream { stream_id: stream_id.to_string() });
        }
        streams.insert(stream_id.to_string(), StreamState::Open { next_seq: 0 });
        Ok(())
    }

    pub fn on_chunk(&self, stream_id: &str, seq: u64) -> Result<(), ProtocolViolation> {
        let mut streams = self.streams.lock();
        match streams.get_mut(stream_id) {
            Some(StreamState::Open { next_seq }) if *next_seq == seq => {
                *next_seq += 1;
                Ok(())
            }
            Some(StreamState::Closed) => {
                Err(ProtocolViolation::ChunkAfterEnd { stream_id: stream_id.to_string() })
            }
            _ => Err(ProtocolViolation::OutOfOrderOrUnknownStream { stream_id: stream_id.to_string() }),
        }
    }

    pub fn on_stream_end(&self, stream_id: &str) -> Result<(), ProtocolViolation> {
        let mut streams = self.streams.lock();
        match streams.get_mut(stream_id) {
            Some(state @ StreamState::Open { .. }) => {
                *state = StreamState::Closed;
                Ok(())
            }
            _ => Err(ProtocolViolation::UnknownStream { stream_id: stream_id.to_string() }),
        }
    }

    /// `END(req)`: close any still-open streams implicitly, as a
    /// convenience, rather than requiring every stream to be explicitly
    /// closed before the request terminates.
    pub fn on_request_end(&self) {
        let mut streams = self.streams.lock();
        for state in streams.values_mut() {
            *state = StreamState::Closed;
        }
    }

    /// `ERR(req)`: abort the request and drop all stream state.
    pub fn on_request_err(&self) {
        self.streams.lock().clear();
    }

    pub fn is_open(&self, stream_id: &str) -> bool {
        matches!(self.streams.lock().get(stream_id), Some(StreamState::Open { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_start_then_chunks_then_end_is_valid() {
        let mgr = StreamManager::new();
        mgr.on_stream_start("s1").unwrap();
        mgr.on_chunk("s1", 0).unwrap();
        mgr.on_chunk("s1", 1).unwrap();
        mgr.on_stream_end("s1").unwrap();
        assert!(!mgr.is_open("s1"));
    }

    #[test]
    fn duplicate_stream_start_is_rejected() {
        let mgr = StreamManager::new();
        mgr.on_stream_start("s1").unwrap();
        assert_eq!(
            mgr.on_stream_start("s1"),
            Err(ProtocolViolation::DuplicateStream { stream_id: "s1".into() })
        );
    }

    #[test]
    fn chunk_without_stream_start_is_out_of_order_or_unknown() {
        let mgr = StreamManager::new();
        assert_eq!(
            mgr.on_chunk("s1", 0),
            Err(ProtocolViolation::OutOfOrderOrUnknownStream { stream_id: "s1".into() })
        );
    }

    #[test]
    fn out_of_order_seq_is_rejected() {
        let mgr = StreamManager::new();
        mgr.on_stream_start("s1").unwrap();
        assert_eq!(
            mgr.on_chunk("s1", 5),
            Err(ProtocolViolation::OutOfOrderOrUnknownStream { stream_id: "s1".into() })
        );
    }

    #[test]
    fn stream_end_without_start_is_unknown_stream() {
        let mgr = StreamManager::new();
        assert_eq!(mgr.on_stream_end("s1"), Err(ProtocolViolation::UnknownStream { stream_id: "s1".into() }));
    }

    #[test]
    fn chunk_after_end_is_rejected() {
        let mgr = StreamManager::new();
        mgr.on_stream_start("s1").unwrap();
        mgr.on_stream_end("s1").unwrap();
        assert_eq!(
            mgr.on_chunk("s1", 0),
            Err(ProtocolViolation::ChunkAfterEnd { stream_id: "s1".into() })
        );
    }

    #[test]
    fn request_end_implicitly_closes_open_streams() {
        let mgr = StreamManager::new();
        mgr.on_stream_start("s1").unwrap();
        mgr.on_stream_start("s2").unwrap();
        mgr.on_stream_end("s1").unwrap();
        mgr.on_request_end();
        assert!(!mgr.is_open("s1"));
        assert!(!mgr.is_open("s2"));
    }

    #[test]
    fn request_err_drops_all_stream_state() {
        let mgr = StreamManager::new();
        mgr.on_stream_start("s1").unwrap();
        mgr.on_request_err();
        assert!(!mgr.is_open("s1"));
        // After a drop, even a fresh STREAM_START is allowed again.
        mgr.on_stream_start("s1").unwrap();
    }
}
