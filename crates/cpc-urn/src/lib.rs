//! Tagged URN addressing algebra.
//!
//! A Tagged URN is a prefix (`media:` or `cap:`) followed by a set of
//! semicolon-separated tags. Tags are either bare markers, `key=*`
//! wildcards, or `key=value`/`key="value"` assignments. Matching is
//! directional: a pattern `accepts` an instance when every non-wildcard
//! tag in the pattern has an equal counterpart in the instance.

mod cap;
mod error;
mod matcher;
mod media;
mod tag;
mod urn;

pub use cap::CapUrn;
pub use error::ParseError;
pub use matcher::{all_matches, best_match};
pub use media::MediaUrn;
pub use tag::{Prefix, Tag};
pub use urn::TaggedUrn;
