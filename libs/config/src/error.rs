//! Configuration error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Startup configuration failure; the node must not start serving
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("missing required setting ring_size (RING_SIZE)")]
    MissingRingSize,

    #[error("ring_size must be a positive integer, got {value}")]
    InvalidRingSize { value: i64 },

    #[error("invalid listen address {value:?}: {source}")]
    InvalidListen {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("invalid experiment URL {value:?}: {reason}")]
    InvalidCollectorUrl { value: String, reason: String },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
