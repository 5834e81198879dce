//! Ring member addressing
//!
//! Members of a StatefulSet behind a headless Service are reachable at
//! `<base>-<ordinal>.<service>`, so the address of any ordinal can be computed
//! without a lookup. The [`RingDirectory`] seam also allows a static table,
//! used when members listen on distinct loopback ports.

use super::error::{DiscoveryError, Result};
use super::identity::{member_name, NodeIdentity};
use std::fmt;

/// Path of the hop operation on every member
pub const HOP_PATH: &str = "/hop";

/// `http://<base_name>-<ordinal>.<service_domain>:<port>/hop`
pub fn member_address(base_name: &str, ordinal: u32, service_domain: &str, port: u16) -> String {
    format!(
        "http://{}.{}:{}{}",
        member_name(base_name, ordinal),
        service_domain,
        port,
        HOP_PATH
    )
}

/// Maps a ring ordinal to the hop endpoint of that member
///
/// Callers reduce the ordinal modulo ring size first.
pub trait RingDirectory: Send + Sync + fmt::Debug {
    fn hop_address(&self, ordinal: u32) -> String;
}

/// Headless-service naming template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessServiceDirectory {
    base_name: String,
    service_domain: String,
    port: u16,
}

impl HeadlessServiceDirectory {
    pub fn new(base_name: impl Into<String>, service_domain: impl Into<String>, port: u16) -> Self {
        Self {
            base_name: base_name.into(),
            service_domain: service_domain.into(),
            port,
        }
    }

    /// Directory of the ring `identity` belongs to
    pub fn for_identity(identity: &NodeIdentity, port: u16) -> Self {
        Self::new(identity.base_name(), identity.service_domain(), port)
    }
}

impl RingDirectory for HeadlessServiceDirectory {
    fn hop_address(&self, ordinal: u32) -> String {
        member_address(&self.base_name, ordinal, &self.service_domain, self.port)
    }
}

/// Explicit ordinal → address table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticDirectory {
    members: Vec<String>,
}

impl StaticDirectory {
    pub fn new(members: Vec<String>) -> Result<Self> {
        if members.is_empty() {
            return Err(DiscoveryError::EmptyDirectory);
        }
        Ok(Self { members })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl RingDirectory for StaticDirectory {
    fn hop_address(&self, ordinal: u32) -> String {
        self.members[ordinal as usize % self.members.len()].clone()
    }
}
