//! # Relay Error Types
//!
//! Every per-request failure ends the hop: it is logged once and returned to
//! whoever is waiting, which may be another relay mid-chain. The HTTP mapping
//! lives here and nowhere else.

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Response, StatusCode};
use magnet_network::TransportError;
use std::fmt;
use thiserror::Error;

/// Downstream party of a hop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopTarget {
    /// Successor in the ring
    NextNode { ordinal: u32 },
    /// Experiment collector
    Collector,
}

impl fmt::Display for HopTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HopTarget::NextNode { .. } => write!(f, "next magnet"),
            HopTarget::Collector => write!(f, "experiment"),
        }
    }
}

/// Per-request relay failures
#[derive(Error, Debug)]
pub enum RelayError {
    /// Body is not a decodable hop message
    #[error("invalid JSON body")]
    InvalidBody { reason: String },

    #[error("'end' must be >= 0")]
    NegativeEnd { end: i64 },

    /// Traversal would build a call chain longer than the configured limit
    #[error("traversal needs {remaining} hops but at most {limit} are allowed")]
    ChainTooDeep { remaining: u64, limit: u64 },

    #[error("experiment URL not configured")]
    CollectorUnconfigured,

    #[error("failed to marshal {target} payload: {source}")]
    Encoding {
        target: HopTarget,
        source: serde_json::Error,
    },

    #[error("invalid {target} address {address:?}: {source}")]
    InvalidAddress {
        target: HopTarget,
        address: String,
        source: url::ParseError,
    },

    /// Network failure or timeout reaching the downstream party
    #[error("{target} request failed: {source}")]
    Downstream {
        target: HopTarget,
        source: reqwest::Error,
    },
}

/// Result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    pub fn from_transport(target: HopTarget, err: TransportError) -> Self {
        match err {
            TransportError::InvalidAddress { address, source } => RelayError::InvalidAddress {
                target,
                address,
                source,
            },
            TransportError::Encode(source) => RelayError::Encoding { target, source },
            TransportError::Request { source, .. } | TransportError::Setup(source) => {
                RelayError::Downstream { target, source }
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidBody { .. }
            | RelayError::NegativeEnd { .. }
            | RelayError::ChainTooDeep { .. } => StatusCode::BAD_REQUEST,
            RelayError::CollectorUnconfigured
            | RelayError::Encoding { .. }
            | RelayError::InvalidAddress { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Downstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Client-side errors are the caller's problem, not this node's
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    pub fn into_response(self) -> Response<Body> {
        error_response(self.status_code(), &self.to_string())
    }
}

/// Plain-text error reply: one line, newline-terminated
pub fn error_response(status: StatusCode, message: &str) -> Response<Body> {
    let mut response = Response::new(Body::from(format!("{}\n", message)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    response
}
