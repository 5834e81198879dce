//! Relay HTTP server
//!
//! One tokio task per connection (hyper's default); each request is handled
//! independently against the shared, immutable [`RelayContext`]. If the
//! caller disconnects, hyper drops the handler future, which cancels the
//! outstanding downstream call.

use crate::context::RelayContext;
use crate::engine::relay_hop;
use crate::error::{error_response, RelayError};
use anyhow::{Context as _, Result};
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use magnet_network::HOP_PATH;
use std::convert::Infallible;
use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Liveness probe path
pub const HEALTH_PATH: &str = "/health";

/// Time a client gets to deliver the request head
pub const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RelayServer {
    context: Arc<RelayContext>,
    header_read_timeout: Duration,
}

impl RelayServer {
    pub fn new(context: RelayContext) -> Self {
        Self {
            context: Arc::new(context),
            header_read_timeout: HEADER_READ_TIMEOUT,
        }
    }

    /// Close connections that have not sent a full request head within `timeout`
    pub fn with_header_read_timeout(mut self, timeout: Duration) -> Self {
        self.header_read_timeout = timeout;
        self
    }

    /// Bind `addr` and serve until `shutdown` resolves
    pub async fn run<F>(self, addr: SocketAddr, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener =
            TcpListener::bind(addr).with_context(|| format!("failed to bind {}", addr))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        listener
            .set_nonblocking(true)
            .context("failed to make listener non-blocking")?;
        let local_addr = listener.local_addr().context("listener has no address")?;

        let context = self.context;
        let make_svc = make_service_fn(move |_conn| {
            let context = Arc::clone(&context);
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let context = Arc::clone(&context);
                    handle_request(req, context)
                }))
            }
        });

        let server = Server::from_tcp(listener)
            .context("failed to start HTTP server")?
            .http1_header_read_timeout(self.header_read_timeout)
            .serve(make_svc)
            .with_graceful_shutdown(shutdown);

        info!("Relay listening on http://{}", local_addr);
        info!("Endpoints: POST {}, GET {}", HOP_PATH, HEALTH_PATH);

        if let Err(e) = server.await {
            error!("Relay server error: {}", e);
            return Err(e.into());
        }

        info!("Relay server stopped");
        Ok(())
    }
}

/// Route a single request
async fn handle_request(
    req: Request<Body>,
    context: Arc<RelayContext>,
) -> Result<Response<Body>, Infallible> {
    debug!("Relay request: {} {}", req.method(), req.uri().path());

    let response = match (req.method(), req.uri().path()) {
        (&Method::POST, HOP_PATH) => handle_hop(req, &context).await,
        (_, HOP_PATH) => {
            let mut response =
                error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("POST"));
            response
        }
        (&Method::GET, HEALTH_PATH) => handle_health(&context),
        _ => error_response(StatusCode::NOT_FOUND, "404 page not found"),
    };

    Ok(response)
}

async fn handle_hop(req: Request<Body>, context: &RelayContext) -> Response<Body> {
    let body = match hyper::body::to_bytes(req.into_body()).await {
        Ok(body) => body,
        Err(e) => {
            let err = RelayError::InvalidBody {
                reason: e.to_string(),
            };
            warn!(node = %context.identity(), error = %e, "failed to read hop body");
            return err.into_response();
        }
    };

    match relay_hop(context, &body).await {
        Ok(response) => response,
        Err(err) => {
            match &err {
                RelayError::InvalidBody { reason } => {
                    warn!(node = %context.identity(), %reason, "rejected hop: {}", err)
                }
                _ if err.is_client_error() => {
                    warn!(node = %context.identity(), "rejected hop: {}", err)
                }
                _ => error!(node = %context.identity(), "hop failed: {}", err),
            }
            err.into_response()
        }
    }
}

/// GET /health
fn handle_health(context: &RelayContext) -> Response<Body> {
    let identity = context.identity();
    let body = serde_json::json!({
        "status": "healthy",
        "service": "magnet",
        "node": identity.name(),
        "ordinal": identity.ordinal(),
        "ring_size": identity.ring_size(),
    });

    let mut response = Response::new(Body::from(body.to_string()));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
