use std::fmt;

use crate::error::ParseError;
use crate::tag::Prefix;
use crate::urn::{accepts_tags, TaggedUrn};

/// A `media:` URN: a set of tagged attributes describing a payload shape
/// (e.g. `media:image;png;thumbnail`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUrn(TaggedUrn);

impl MediaUrn {
    /// The wildcard Media URN, `media:`, which accepts anything.
    pub fn wildcard() -> Self {
        MediaUrn(TaggedUrn::empty(Prefix::Media))
    }

    pub fn parse(s: &str) -> Result<Self, ParseError> {
        Ok(MediaUrn(TaggedUrn::parse(s, Prefix::Media)?))
    }

    pub fn inner(&self) -> &TaggedUrn {
        &self.0
    }

    pub fn to_canonical(&self) -> String {
        self.0.to_canonical()
    }

    /// `self` is the pattern, `instance` is the concrete value being tested.
    pub fn accepts(&self, instance: &MediaUrn) -> bool {
        accepts_tags(&self.0, &instance.0, &[])
    }

    /// `self.conforms_to(pattern) == pattern.accepts(self)`.
    pub fn conforms_to(&self, pattern: &MediaUrn) -> bool {
        pattern.accepts(self)
    }

    pub fn specificity(&self) -> usize {
        self.0.own_specificity()
    }
}

impl fmt::Display for MediaUrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl serde::Serialize for MediaUrn {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical())
    }
}

impl<'de> serde::Deserialize<'de> for MediaUrn {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        MediaUrn::parse(&s).map_err(serde::de::Error::custom)
    }
}
