//! Response proxy
//!
//! Reproduces a downstream response as this node's own: status, end-to-end
//! headers and the body, streamed chunk by chunk so memory stays bounded no
//! matter how large the body is. Once the status is committed a body error can
//! only be logged; the connection is then aborted rather than truncated
//! silently.

use crate::error::HopTarget;
use futures_util::TryStreamExt;
use hyper::header::HeaderName;
use hyper::{Body, HeaderMap, Response};
use tracing::error;

/// Connection-scoped headers the local HTTP stack re-derives
const HOP_BY_HOP_HEADERS: [&str; 7] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// Copy every end-to-end header, keeping repeated values in order
pub fn copy_headers(source: &HeaderMap, target: &mut HeaderMap) {
    for (name, value) in source.iter() {
        if !is_hop_by_hop(name) {
            target.append(name.clone(), value.clone());
        }
    }
}

/// Turn `upstream` into a response streamed back to our caller
pub fn proxy_response(upstream: reqwest::Response, target: HopTarget) -> Response<Body> {
    let status = upstream.status();
    let mut headers = HeaderMap::with_capacity(upstream.headers().len());
    copy_headers(upstream.headers(), &mut headers);

    let body = upstream.bytes_stream().map_err(move |err| {
        error!(downstream = %target, error = %err, "failed to copy {} response body", target);
        err
    });

    let mut response = Response::new(Body::wrap_stream(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
