use std::fmt;

/// The two URN prefixes this algebra understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
    Media,
    Cap,
}

impl Prefix {
    pub fn as_str(self) -> &'static str {
        match self {
            Prefix::Media => "media",
            Prefix::Cap => "cap",
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of one tag-list entry.
///
/// `Wildcard` is kept as its own variant rather than the literal string
/// `"*"` so a marker (bare key) and a user-supplied assignment of `*`
/// serialize differently: a marker round-trips as the bare key, an
/// explicit `key=*` round-trips as an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// A bare key with no `=value`, e.g. `textable`.
    Marker,
    /// An explicit `key=*` wildcard assignment, used in patterns.
    Wildcard,
    /// `key=value`, stored already normalized (lowercased if unquoted).
    Value(String),
}

impl Tag {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Tag::Wildcard)
    }

    /// The string this tag would compare equal to, if it has one.
    /// `Wildcard` has none; its matching semantics are handled by the caller.
    pub fn value_str(&self) -> Option<&str> {
        match self {
            Tag::Marker => None,
            Tag::Wildcard => None,
            Tag::Value(s) => Some(s),
        }
    }
}
