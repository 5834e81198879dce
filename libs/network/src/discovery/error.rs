//! Error types for identity resolution and ring addressing

use std::num::ParseIntError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("node name is empty")]
    MissingName,

    #[error("cannot parse ordinal from name {name:?}: expected <base>-<ordinal>")]
    MalformedName { name: String },

    #[error("cannot parse ordinal from name {name:?} (last part {segment:?}): {source}")]
    InvalidOrdinal {
        name: String,
        segment: String,
        source: ParseIntError,
    },

    #[error("cannot get hostname: {message}")]
    Hostname { message: String },

    #[error("ring size must be positive")]
    EmptyRing,

    #[error("ordinal {ordinal} is outside a ring of size {ring_size}")]
    OrdinalOutOfRing { ordinal: u32, ring_size: u32 },

    #[error("static directory needs at least one member")]
    EmptyDirectory,
}
