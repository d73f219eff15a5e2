//! Capability manifests and the provider registry that dispatches
//! requests to the most specific matching capability.

mod manifest;
mod registry;

pub use manifest::{decode_manifest, encode_manifest, ArgSource, Cap, CapArg, CapOutput, ManifestError, MediaSpecDef};
pub use registry::{CapabilityRegistry, Matched, RegistryError};
