use std::collections::BTreeMap;
use std::fmt;

use crate::error::ParseError;
use crate::tag::{Prefix, Tag};

/// Characters allowed in an unquoted value or a key, after lowercasing.
/// `*` is additionally allowed in values (it is how a literal wildcard
/// assignment is spelled) but never in keys.
fn is_unquoted_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | ':' | '-' | '/')
}

/// A parsed, normalized Tagged URN: a prefix plus a sorted map of tags.
///
/// The map is a `BTreeMap` so canonical key ordering falls out of the
/// data structure itself rather than a separate sort at serialize time.
/// Quoting is not stored: whether a value needs quotes is a pure function
/// of its content, recomputed on demand (see [`TaggedUrn::to_canonical`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedUrn {
    prefix: Prefix,
    tags: BTreeMap<String, Tag>,
}

impl TaggedUrn {
    pub fn empty(prefix: Prefix) -> Self {
        TaggedUrn { prefix, tags: BTreeMap::new() }
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    pub fn tags(&self) -> &BTreeMap<String, Tag> {
        &self.tags
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.tags.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Tag) {
        self.tags.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Parse `s`, requiring it to start with `expected`'s prefix string.
    pub fn parse(s: &str, expected: Prefix) -> Result<Self, ParseError> {
        let urn = Self::parse_any(s)?;
        if urn.prefix != expected {
            return Err(ParseError::PrefixMismatch {
                expected: expected.as_str(),
                found: urn.prefix.as_str(),
            });
        }
        Ok(urn)
    }

    /// Parse `s`, accepting either prefix; the caller inspects `.prefix()`.
    pub fn parse_any(s: &str) -> Result<Self, ParseError> {
        let colon = s.find(':').ok_or(ParseError::MissingPrefix)?;
        let prefix = match &s[..colon] {
            "media" => Prefix::Media,
            "cap" => Prefix::Cap,
            _ => return Err(ParseError::MissingPrefix),
        };
        let rest = &s[colon + 1..];
        let tags = parse_entries(rest)?;
        Ok(TaggedUrn { prefix, tags })
    }

    /// The number of non-wildcard key bindings. Used by [`crate::specificity`]
    /// helpers; Cap URNs add the nested `in`/`out` Media URN specificity on top.
    pub fn own_specificity(&self) -> usize {
        self.tags.values().filter(|t| !t.is_wildcard()).count()
    }

    /// Canonical serialization: keys in sorted order (free, via `BTreeMap`),
    /// values quoted only when their content demands it.
    pub fn to_canonical(&self) -> String {
        let mut out = String::new();
        out.push_str(self.prefix.as_str());
        out.push(':');
        let mut first = true;
        for (key, tag) in &self.tags {
            if !first {
                out.push(';');
            }
            first = false;
            out.push_str(key);
            match tag {
                Tag::Marker => {}
                Tag::Wildcard => out.push_str("=*"),
                Tag::Value(v) => {
                    out.push('=');
                    if needs_quoting(v) {
                        out.push('"');
                        for c in v.chars() {
                            if c == '"' || c == '\\' {
                                out.push('\\');
                            }
                            out.push(c);
                        }
                        out.push('"');
                    } else {
                        out.push_str(v);
                    }
                }
            }
        }
        out
    }
}

impl fmt::Display for TaggedUrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

fn needs_quoting(v: &str) -> bool {
    v.is_empty() || v.chars().any(|c| c.is_ascii_uppercase() || !is_unquoted_char(c))
}

/// Directional, key-wise accepts check shared by Media and Cap URNs.
/// `skip` lists keys the caller handles itself (Cap URNs skip `in`/`out`
/// to recurse into Media URN matching instead of raw string comparison).
pub(crate) fn accepts_tags(pattern: &TaggedUrn, instance: &TaggedUrn, skip: &[&str]) -> bool {
    for (key, pat_tag) in &pattern.tags {
        if skip.contains(&key.as_str()) {
            continue;
        }
        if pat_tag.is_wildcard() {
            continue;
        }
        match instance.tags.get(key) {
            Some(inst_tag) if inst_tag == pat_tag => {}
            _ => return false,
        }
    }
    true
}

fn parse_entries(rest: &str) -> Result<BTreeMap<String, Tag>, ParseError> {
    let mut tags = BTreeMap::new();
    let bytes: Vec<char> = rest.chars().collect();
    let mut i = 0usize;
    let len = bytes.len();

    if len == 0 {
        return Ok(tags);
    }

    loop {
        if i >= len {
            break;
        }
        // Parse one key.
        let key_start = i;
        let mut key = String::new();
        while i < len && bytes[i] != '=' && bytes[i] != ';' {
            let c = bytes[i].to_ascii_lowercase();
            if !is_unquoted_char(c) {
                return Err(ParseError::InvalidCharacter { at: key_start, found: bytes[i] });
            }
            key.push(c);
            i += 1;
        }
        if key.is_empty() {
            return Err(ParseError::InvalidCharacter {
                at: key_start,
                found: if i < len { bytes[i] } else { ';' },
            });
        }
        if key.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::NumericKey { key });
        }

        let tag = if i < len && bytes[i] == '=' {
            i += 1; // consume '='
            if i < len && bytes[i] == '"' {
                i += 1; // consume opening quote
                let mut value = String::new();
                let mut closed = false;
                while i < len {
                    let c = bytes[i];
                    if c == '"' {
                        i += 1;
                        closed = true;
                        break;
                    } else if c == '\\' {
                        i += 1;
                        if i >= len {
                            return Err(ParseError::UnterminatedQuote);
                        }
                        match bytes[i] {
                            '"' => value.push('"'),
                            '\\' => value.push('\\'),
                            _ => return Err(ParseError::InvalidEscapeSequence { at: i - 1 }),
                        }
                        i += 1;
                    } else {
                        value.push(c);
                        i += 1;
                    }
                }
                if !closed {
                    return Err(ParseError::UnterminatedQuote);
                }
                if value.is_empty() {
                    return Err(ParseError::EmptyValue { key });
                }
                Tag::Value(value)
            } else {
                let val_start = i;
                let mut value = String::new();
                while i < len && bytes[i] != ';' {
                    let c = bytes[i].to_ascii_lowercase();
                    if !is_unquoted_char(c) && c != '*' {
                        return Err(ParseError::InvalidCharacter { at: i, found: bytes[i] });
                    }
                    value.push(c);
                    i += 1;
                }
                if value.is_empty() {
                    return Err(ParseError::EmptyValue { key });
                }
                let _ = val_start;
                if value == "*" {
                    Tag::Wildcard
                } else {
                    Tag::Value(value)
                }
            }
        } else {
            Tag::Marker
        };

        if tags.insert(key.clone(), tag).is_some() {
            return Err(ParseError::DuplicateKey { key });
        }

        if i < len && bytes[i] == ';' {
            i += 1;
            // Trailing `;` with nothing after it is an accepted equivalence.
            if i == len {
                break;
            }
            continue;
        }
        break;
    }

    Ok(tags)
}
