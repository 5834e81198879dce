//! Ring Discovery
//!
//! Resolves where this node sits in the ring and where its peers live.
//! Everything here is computed once at startup or is a pure function of the
//! ring parameters; no DNS lookups happen in this module.

pub mod directory;
pub mod error;
pub mod identity;

pub use directory::{
    member_address, HeadlessServiceDirectory, RingDirectory, StaticDirectory, HOP_PATH,
};
pub use error::{DiscoveryError, Result};
pub use identity::{
    member_name, parse_ordinal, AssignedName, FixedOrdinal, IdentityProvider, NodeIdentity,
};
