use parking_lot::Mutex;
use tokio::time::{Duration, Instant};

/// Tells a caller when it's time to emit a `HEARTBEAT` frame.
///
/// This does not send anything itself and does not track round-trip
/// latency — there is no flow-control window in this protocol to tune
/// from RTT, so unlike a full ping/pong exchange this is just an interval
/// timer a connection loop can poll alongside its other work.
pub struct Heartbeat {
    interval: Duration,
    last_sent: Mutex<Instant>,
}

impl Heartbeat {
    pub fn new(interval: Duration) -> Self {
        Heartbeat { interval, last_sent: Mutex::new(Instant::now()) }
    }

    /// Returns `true` if `interval` has elapsed since the last heartbeat
    /// (or construction). Calling this resets the timer when it returns
    /// `true`, so callers should treat a `true` result as "send one now".
    pub fn due(&self) -> bool {
        let mut last = self.last_sent.lock();
        if last.elapsed() >= self.interval {
            *last = Instant::now();
            true
        } else {
            false
        }
    }

    /// Reset the timer, e.g. after receiving any frame from the peer.
    pub fn reset(&self) {
        *self.last_sent.lock() = Instant::now();
    }
}
