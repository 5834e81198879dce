//! Node identity resolution
//!
//! A StatefulSet pod learns its ring position from the name the orchestrator
//! assigned it (`magnet-12` → ordinal 12). Resolution happens exactly once at
//! startup; the resulting [`NodeIdentity`] is immutable and shared by every
//! request handler.

use super::error::{DiscoveryError, Result};
use std::fmt;
use tracing::debug;

/// Separator between the base name and the ordinal in assigned names
pub const ORDINAL_SEPARATOR: char = '-';

/// Source of a node's ordinal
///
/// Production nodes parse their host-assigned name; tests pin an ordinal
/// directly so the relay never has to touch string parsing.
pub trait IdentityProvider: Send + Sync {
    fn ordinal(&self) -> Result<u32>;

    /// Human-readable origin of the ordinal, for startup logs
    fn describe(&self) -> String;
}

/// Parse the ordinal from a name ending in `-<ordinal>`
pub fn parse_ordinal(name: &str) -> Result<u32> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DiscoveryError::MissingName);
    }

    let (_, segment) = name
        .rsplit_once(ORDINAL_SEPARATOR)
        .ok_or_else(|| DiscoveryError::MalformedName {
            name: name.to_string(),
        })?;

    segment
        .parse::<u32>()
        .map_err(|source| DiscoveryError::InvalidOrdinal {
            name: name.to_string(),
            segment: segment.to_string(),
            source,
        })
}

/// Ordinal taken from an orchestrator-assigned name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedName {
    name: String,
}

impl AssignedName {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Use the host name, which StatefulSets set to the pod name
    pub fn from_hostname() -> Result<Self> {
        let hostname = nix::unistd::gethostname().map_err(|errno| DiscoveryError::Hostname {
            message: errno.to_string(),
        })?;
        let name = hostname
            .into_string()
            .map_err(|raw| DiscoveryError::Hostname {
                message: format!("hostname {:?} is not valid UTF-8", raw),
            })?;
        Ok(Self::new(name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl IdentityProvider for AssignedName {
    fn ordinal(&self) -> Result<u32> {
        parse_ordinal(&self.name)
    }

    fn describe(&self) -> String {
        format!("assigned name {:?}", self.name)
    }
}

/// Fixed ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedOrdinal(pub u32);

impl IdentityProvider for FixedOrdinal {
    fn ordinal(&self) -> Result<u32> {
        Ok(self.0)
    }

    fn describe(&self) -> String {
        format!("fixed ordinal {}", self.0)
    }
}

/// Position of this process in the ring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    ordinal: u32,
    ring_size: u32,
    base_name: String,
    service_domain: String,
}

impl NodeIdentity {
    /// Resolve the ordinal from `provider` and check it fits the ring
    pub fn resolve(
        provider: &dyn IdentityProvider,
        ring_size: u32,
        base_name: impl Into<String>,
        service_domain: impl Into<String>,
    ) -> Result<Self> {
        let ordinal = provider.ordinal()?;
        debug!(source = %provider.describe(), ordinal, "resolved ring ordinal");
        Self::new(ordinal, ring_size, base_name, service_domain)
    }

    pub fn new(
        ordinal: u32,
        ring_size: u32,
        base_name: impl Into<String>,
        service_domain: impl Into<String>,
    ) -> Result<Self> {
        if ring_size == 0 {
            return Err(DiscoveryError::EmptyRing);
        }
        if ordinal >= ring_size {
            return Err(DiscoveryError::OrdinalOutOfRing { ordinal, ring_size });
        }

        Ok(Self {
            ordinal,
            ring_size,
            base_name: base_name.into(),
            service_domain: service_domain.into(),
        })
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn ring_size(&self) -> u32 {
        self.ring_size
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn service_domain(&self) -> &str {
        &self.service_domain
    }

    /// Derived name, e.g. `magnet-2`
    pub fn name(&self) -> String {
        member_name(&self.base_name, self.ordinal)
    }

    /// Ordinal of the next ring member, wrapping after `ring_size - 1`
    pub fn successor(&self) -> u32 {
        // ordinal < ring_size <= u32::MAX, so the increment cannot overflow
        (self.ordinal + 1) % self.ring_size
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.name(), self.ordinal, self.ring_size)
    }
}

/// `<base_name>-<ordinal>`
pub fn member_name(base_name: &str, ordinal: u32) -> String {
    format!("{}{}{}", base_name, ORDINAL_SEPARATOR, ordinal)
}
