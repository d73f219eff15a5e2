use std::fmt;

use parking_lot::RwLock;

use cpc_urn::{CapUrn, ParseError};

use crate::manifest::Cap;

/// Error produced by [`CapabilityRegistry`] lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// `req_urn` failed to parse as a Cap URN.
    InvalidUrn(ParseError),
    /// No registered provider's capability accepts the request.
    NoProvider,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidUrn(e) => write!(f, "invalid request urn: {e}"),
            RegistryError::NoProvider => write!(f, "no provider accepts this request"),
        }
    }
}

impl std::error::Error for RegistryError {}

struct ProviderEntry {
    name: String,
    caps: Vec<Cap>,
}

/// A matching capability, identified by the provider that registered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matched {
    pub provider: String,
    pub cap: Cap,
}

/// Maps provider name to its advertised capabilities and routes requests
/// to the most specific accepting capability (§4.7).
///
/// Registration order is preserved across re-registration: registering an
/// already-known provider name replaces its capability set in place,
/// rather than moving it to the end, so tie-break order stays stable for
/// providers that periodically refresh their manifest.
pub struct CapabilityRegistry {
    providers: RwLock<Vec<ProviderEntry>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        CapabilityRegistry { providers: RwLock::new(Vec::new()) }
    }

    /// Register (or replace) a provider's capability set. Idempotent on
    /// `name`.
    pub fn register(&self, name: impl Into<String>, caps: Vec<Cap>) {
        let name = name.into();
        let mut providers = self.providers.write();
        if let Some(entry) = providers.iter_mut().find(|p| p.name == name) {
            entry.caps = caps;
        } else {
            providers.push(ProviderEntry { name, caps });
        }
    }

    pub fn unregister(&self, name: &str) {
        self.providers.write().retain(|p| p.name != name);
    }

    fn matches(&self, req: &CapUrn) -> Vec<Matched> {
        let providers = self.providers.read();
        let mut matched = Vec::new();
        for entry in providers.iter() {
            for cap in &entry.caps {
                if cap.urn.accepts(req) {
                    matched.push(Matched { provider: entry.name.clone(), cap: cap.clone() });
                }
            }
        }
        // Stable sort: ties keep registration order (providers, then caps
        // within a provider, in the order they were pushed above).
        matched.sort_by_key(|m| std::cmp::Reverse(m.cap.urn.specificity()));
        matched
    }

    pub fn find_best(&self, req_urn: &str) -> Result<Matched, RegistryError> {
        let req = CapUrn::parse(req_urn).map_err(RegistryError::InvalidUrn)?;
        self.matches(&req).into_iter().next().ok_or(RegistryError::NoProvider)
    }

    pub fn find_all(&self, req_urn: &str) -> Result<Vec<Matched>, RegistryError> {
        let req = CapUrn::parse(req_urn).map_err(RegistryError::InvalidUrn)?;
        Ok(self.matches(&req))
    }

    pub fn can_handle(&self, req_urn: &str) -> Result<bool, RegistryError> {
        let req = CapUrn::parse(req_urn).map_err(RegistryError::InvalidUrn)?;
        Ok(!self.matches(&req).is_empty())
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
