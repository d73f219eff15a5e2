use std::fmt;

use crate::error::ParseError;
use crate::media::MediaUrn;
use crate::tag::{Prefix, Tag};
use crate::urn::{accepts_tags, TaggedUrn};

const NESTED_KEYS: [&str; 2] = ["in", "out"];

/// A `cap:` URN: a capability descriptor combining an input Media URN, an
/// output Media URN, and arbitrary additional tags (typically `op`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapUrn(TaggedUrn);

impl CapUrn {
    /// The identity capability: no tags at all. Accepts anything in the
    /// provider direction; is accepted by nothing specific in the request
    /// direction (see the routing-asymmetry test below).
    pub fn identity() -> Self {
        CapUrn(TaggedUrn::empty(Prefix::Cap))
    }

    pub fn parse(s: &str) -> Result<Self, ParseError> {
        Ok(CapUrn(TaggedUrn::parse(s, Prefix::Cap)?))
    }

    pub fn inner(&self) -> &TaggedUrn {
        &self.0
    }

    pub fn to_canonical(&self) -> String {
        self.0.to_canonical()
    }

    /// Missing key, an explicit `*`, and a bare marker all mean "no
    /// constraint", which is exactly what the wildcard Media URN encodes.
    fn nested(&self, key: &str) -> Result<MediaUrn, ParseError> {
        match self.0.get(key) {
            None | Some(Tag::Wildcard) | Some(Tag::Marker) => Ok(MediaUrn::wildcard()),
            Some(Tag::Value(s)) => MediaUrn::parse(s),
        }
    }

    pub fn input(&self) -> Result<MediaUrn, ParseError> {
        self.nested("in")
    }

    pub fn output(&self) -> Result<MediaUrn, ParseError> {
        self.nested("out")
    }

    /// `self` is the pattern, `instance` the concrete value being tested.
    ///
    /// Panics-free: a malformed nested Media URN in either side is treated
    /// as non-accepting rather than propagated, since both operands were
    /// already validated at parse time and this keeps the relation total.
    pub fn accepts(&self, instance: &CapUrn) -> bool {
        if !accepts_tags(&self.0, &instance.0, &NESTED_KEYS) {
            return false;
        }
        let (pat_in, inst_in) = match (self.input(), instance.input()) {
            (Ok(a), Ok(b)) => (a, b),
            _ => return false,
        };
        if !pat_in.accepts(&inst_in) {
            return false;
        }
        let (pat_out, inst_out) = match (self.output(), instance.output()) {
            (Ok(a), Ok(b)) => (a, b),
            _ => return false,
        };
        pat_out.accepts(&inst_out)
    }

    pub fn conforms_to(&self, pattern: &CapUrn) -> bool {
        pattern.accepts(self)
    }

    /// Own non-`in`/`out` tag count, plus the specificity of the nested
    /// input and output Media URNs. Malformed nested URNs contribute zero.
    pub fn specificity(&self) -> usize {
        let own = self
            .0
            .tags()
            .iter()
            .filter(|(k, t)| !NESTED_KEYS.contains(&k.as_str()) && !t.is_wildcard())
            .count();
        let in_spec = self.input().map(|u| u.specificity()).unwrap_or(0);
        let out_spec = self.output().map(|u| u.specificity()).unwrap_or(0);
        own + in_spec + out_spec
    }
}

impl fmt::Display for CapUrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl serde::Serialize for CapUrn {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical())
    }
}

impl<'de> serde::Deserialize<'de> for CapUrn {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CapUrn::parse(&s).map_err(serde::de::Error::custom)
    }
}
