//! Transport Error Types

use thiserror::Error;

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Failure of a single outbound hop call
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Setup(#[source] reqwest::Error),

    /// Target address is not a valid absolute URL
    #[error("invalid address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        source: url::ParseError,
    },

    /// Payload could not be serialized
    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    /// Connection, timeout or protocol failure talking to the target
    #[error("{source}")]
    Request {
        address: String,
        source: reqwest::Error,
    },
}

impl TransportError {
    /// True when the call was abandoned because the hop timeout elapsed
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request { source, .. } if source.is_timeout())
    }
}
