//! Magnet Network Infrastructure
//!
//! Ring discovery (who am I, where is my successor) and the outbound hop
//! transport shared by every relay node.

pub mod discovery;
pub mod error;
pub mod transports;

// Re-export commonly used types
pub use discovery::{
    member_address, AssignedName, DiscoveryError, FixedOrdinal, HeadlessServiceDirectory,
    IdentityProvider, NodeIdentity, RingDirectory, StaticDirectory, HOP_PATH,
};
pub use error::{Result, TransportError};
pub use transports::{HopTransport, DEFAULT_HOP_TIMEOUT};
