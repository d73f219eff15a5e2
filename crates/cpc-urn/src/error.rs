use std::fmt;

/// Error produced while parsing a Tagged URN.
///
/// Each variant names the exact normalization rule it violates (see the
/// Tagged URN grammar). Callers that only care whether parsing succeeded
/// can still match on this without losing the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No recognized `media:` or `cap:` prefix before the first `:`.
    MissingPrefix,
    /// A character outside the grammar appeared in a key or unquoted value.
    InvalidCharacter { at: usize, found: char },
    /// A key consisting entirely of ASCII digits.
    NumericKey { key: String },
    /// The same key appeared more than once in one URN.
    DuplicateKey { key: String },
    /// A quoted value's closing `"` was never found.
    UnterminatedQuote,
    /// A `\` inside a quoted value was followed by something other than `"` or `\`.
    InvalidEscapeSequence { at: usize },
    /// `key=` with nothing after the `=` (quoted or unquoted).
    EmptyValue { key: String },
    /// Caller expected one prefix (e.g. `media:`) but found the other.
    PrefixMismatch { expected: &'static str, found: &'static str },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingPrefix => write!(f, "missing or unrecognized urn prefix"),
            ParseError::InvalidCharacter { at, found } => {
                write!(f, "invalid character {found:?} at byte {at}")
            }
            ParseError::NumericKey { key } => write!(f, "key {key:?} is purely numeric"),
            ParseError::DuplicateKey { key } => write!(f, "duplicate key {key:?}"),
            ParseError::UnterminatedQuote => write!(f, "unterminated quoted value"),
            ParseError::InvalidEscapeSequence { at } => {
                write!(f, "invalid escape sequence at byte {at}")
            }
            ParseError::EmptyValue { key } => write!(f, "key {key:?} has an empty value"),
            ParseError::PrefixMismatch { expected, found } => {
                write!(f, "expected {expected}: urn, found {found}:")
            }
        }
    }
}

impl std::error::Error for ParseError {}
