use std::fmt;

use uuid::Uuid;

/// Correlates frames belonging to the same request.
///
/// Equality is within-variant only: `MessageId::Uuid(Uuid::nil())` is not
/// equal to `MessageId::Uint(0)` even though both are all-zero on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Caller-generated correlation ID for an application request.
    Uuid(Uuid),
    /// Small unsigned sentinel used by protocol-level frames (e.g. `HELLO`).
    Uint(u64),
}

impl MessageId {
    pub fn new_uuid() -> Self {
        MessageId::Uuid(Uuid::new_v4())
    }

    pub fn sentinel() -> Self {
        MessageId::Uint(0)
    }
}

impl Default for MessageId {
    fn default() -> Self {
        MessageId::sentinel()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Uuid(u) => write!(f, "{u}"),
            MessageId::Uint(n) => write!(f, "{n}"),
        }
    }
}
