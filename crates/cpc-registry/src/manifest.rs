use std::fmt;

use serde::{Deserialize, Serialize};

use cpc_urn::{CapUrn, MediaUrn};

/// Where a [`CapArg`]'s value comes from when a capability is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgSource {
    /// The `index`-th positional argument on the invoked command line.
    Positional(usize),
    /// A named CLI flag, e.g. `--format`.
    Flag(String),
    /// Standard input, carrying a payload of the given Media URN shape.
    /// At most one argument per capability may declare this source.
    Stdin(MediaUrn),
}

/// One declared argument of a [`Cap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapArg {
    pub name: String,
    pub sources: Vec<ArgSource>,
    pub required: bool,
}

impl CapArg {
    pub fn accepts_stdin(&self) -> bool {
        self.sources.iter().any(|s| matches!(s, ArgSource::Stdin(_)))
    }
}

/// Describes the shape of a capability's output payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapOutput {
    pub media_urn: MediaUrn,
    pub description: Option<String>,
}

/// One media shape a capability is documented to understand, independent
/// of whether it appears in the capability's own `in`/`out` URN tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSpecDef {
    pub urn: MediaUrn,
    pub description: Option<String>,
}

/// A single advertised capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cap {
    pub urn: CapUrn,
    pub title: String,
    pub command: String,
    pub description: Option<String>,
    pub args: Vec<CapArg>,
    pub output: Option<CapOutput>,
    pub media_specs: Vec<MediaSpecDef>,
    pub registered_by: Option<String>,
}

impl Cap {
    /// Whether any declared argument reads from stdin — derived from the
    /// arguments rather than stored redundantly, since at most one source
    /// across all arguments is ever significant.
    pub fn accepts_stdin(&self) -> bool {
        self.args.iter().any(CapArg::accepts_stdin)
    }

    /// The single stdin-carrying argument, if any.
    pub fn stdin_arg(&self) -> Option<&CapArg> {
        self.args.iter().find(|a| a.accepts_stdin())
    }
}

/// Error produced decoding a manifest payload (the opaque bytes carried
/// by `HELLO`'s `manifest` field).
#[derive(Debug)]
pub struct ManifestError(String);

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed capability manifest: {}", self.0)
    }
}

impl std::error::Error for ManifestError {}

/// Encode a provider's advertised capabilities into the opaque bytes
/// carried by `HELLO`'s `manifest` field.
pub fn encode_manifest(caps: &[Cap]) -> Vec<u8> {
    let mut bytes = Vec::new();
    // A `Vec<Cap>` always serializes; this only fails on an I/O error
    // from the `Vec<u8>` writer, which cannot happen.
    ciborium::into_writer(&caps, &mut bytes).expect("encoding a manifest into a Vec<u8> cannot fail");
    bytes
}

/// Decode a manifest payload previously produced by [`encode_manifest`].
pub fn decode_manifest(bytes: &[u8]) -> Result<Vec<Cap>, ManifestError> {
    ciborium::from_reader(bytes).map_err(|e| ManifestError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(urn: &str) -> Cap {
        Cap {
            urn: CapUrn::parse(urn).unwrap(),
            title: "Test".into(),
            command: "test".into(),
            description: None,
            args: vec![],
            output: None,
            media_specs: vec![],
            registered_by: None,
        }
    }

    #[test]
    fn accepts_stdin_reflects_declared_sources() {
        let mut c = cap("cap:op=echo");
        assert!(!c.accepts_stdin());
        c.args.push(CapArg {
            name: "input".into(),
            sources: vec![ArgSource::Stdin(MediaUrn::wildcard())],
            required: true,
        });
        assert!(c.accepts_stdin());
        assert_eq!(c.stdin_arg().unwrap().name, "input");
    }

    #[test]
    fn at_most_one_stdin_source_is_significant() {
        let mut c = cap("cap:op=echo");
        c.args.push(CapArg {
            name: "a".into(),
            sources: vec![ArgSource::Stdin(MediaUrn::wildcard())],
            required: true,
        });
        c.args.push(CapArg {
            name: "b".into(),
            sources: vec![ArgSource::Flag("--b".into())],
            required: false,
        });
        assert_eq!(c.stdin_arg().unwrap().name, "a");
    }

    #[test]
    fn manifest_round_trips_through_encode_decode() {
        let mut c = cap(r#"cap:in="media:pdf";op=generate_thumbnail;out="media:image;png""#);
        c.description = Some("Generate a PDF thumbnail".into());
        c.args.push(CapArg { name: "input".into(), sources: vec![ArgSource::Stdin(MediaUrn::wildcard())], required: true });
        c.output = Some(CapOutput { media_urn: MediaUrn::parse("media:image;png;thumbnail").unwrap(), description: None });
        c.media_specs.push(MediaSpecDef { urn: MediaUrn::parse("media:pdf").unwrap(), description: None });

        let bytes = encode_manifest(&[c.clone()]);
        let decoded = decode_manifest(&bytes).unwrap();
        assert_eq!(decoded, vec![c]);
    }

    #[test]
    fn decoding_garbage_is_a_manifest_error() {
        assert!(decode_manifest(&[0xFF, 0x00, 0x01]).is_err());
    }
}
