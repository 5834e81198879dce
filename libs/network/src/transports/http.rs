//! HTTP hop transport
//!
//! One `POST` per hop: JSON body, bounded timeout, no retry. The timeout runs
//! from connect until the response body is fully read, so a downstream that
//! stalls mid-body is abandoned too. Dropping the returned future cancels the
//! call, which is how cancellation of an inbound request reaches downstream.
//!
//! `reqwest::Client` is an `Arc` around a shared connection pool, so clones
//! are cheap and the transport is used concurrently without locking.

use crate::error::{Result, TransportError};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default bound on a single hop call
pub const DEFAULT_HOP_TIMEOUT: Duration = Duration::from_secs(5);

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct HopTransport {
    client: Client,
    timeout: Duration,
}

impl HopTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().build().map_err(TransportError::Setup)?;
        Ok(Self::with_client(client, timeout))
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `payload` as JSON to `address` and return the raw response
    ///
    /// Non-2xx statuses are returned as responses, not errors; only failing
    /// to obtain a response at all is an error.
    pub async fn post_json<T>(&self, address: &str, payload: &T) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        let url = Url::parse(address).map_err(|source| TransportError::InvalidAddress {
            address: address.to_string(),
            source,
        })?;
        let body = serde_json::to_vec(payload).map_err(TransportError::Encode)?;

        debug!(%url, bytes = body.len(), "sending hop request");

        self.client
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .timeout(self.timeout)
            .body(body)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                address: address.to_string(),
                source,
            })
    }
}
