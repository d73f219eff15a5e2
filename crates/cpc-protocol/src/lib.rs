//! Frame model and CBOR wire codec for the capability protocol.
//!
//! A [`Frame`] is a tagged record identifying one of the eleven wire frame
//! types. [`codec::encode`]/[`codec::decode`] convert a `Frame` to and from
//! its CBOR byte representation; framing (length prefixes) lives in
//! `cpc-transport`.

pub mod codec;
pub mod error;
mod frame;
mod message_id;

pub use error::{CodecError, MalformedReason, WIRE_VERSION};
pub use frame::{Frame, FrameType, UnknownFrameType, ECANCEL, ENOPROVIDER, EVERSION};
pub use message_id::MessageId;
