//! Capability Protocol Core: Tagged URN routing, CBOR framing, handshake
//! negotiation, multiplexed streams, and capability dispatch, combined
//! into one connection-level API.
//!
//! Most users only need [`Connection`] and the re-exported crates below;
//! the individual `cpc-*` crates remain usable standalone for callers who
//! only need one layer (e.g. just the URN algebra for an external router).

mod connection;

pub use connection::{Connection, Event};

pub use cpc_protocol as protocol;
pub use cpc_registry as registry;
pub use cpc_transport as transport;
pub use cpc_urn as urn;
