//! Collector HTTP server

use crate::observe::{acknowledge, decode_report, ObserveError};
use anyhow::{Context as _, Result};
use chrono::Utc;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const OBSERVE_PATH: &str = "/observe";
pub const HEALTH_PATH: &str = "/health";

/// Default experiment label
pub const DEFAULT_EXPERIMENT: &str = "CAKE";

pub struct CollectorServer {
    experiment: Arc<str>,
}

impl CollectorServer {
    pub fn new(experiment: impl Into<String>) -> Self {
        Self {
            experiment: Arc::from(experiment.into()),
        }
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

        let experiment = self.experiment;
        let make_svc = make_service_fn(move |_conn| {
            let experiment = Arc::clone(&experiment);
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    handle_request(req, Arc::clone(&experiment))
                }))
            }
        });

        let server = Server::from_tcp(listener)
            .context("failed to start HTTP server")?
            .serve(make_svc)
            .with_graceful_shutdown(shutdown);

        info!("Collector listening on http://{}", local_addr);

        if let Err(e) = server.await {
            error!("Collector server error: {}", e);
            return Err(e.into());
        }

        info!("Collector stopped");
        Ok(())
    }
}

async fn handle_request(
    req: Request<Body>,
    experiment: Arc<str>,
) -> Result<Response<Body>, Infallible> {
    debug!("Collector request: {} {}", req.method(), req.uri().path());

    let response = match (req.method(), req.uri().path()) {
        (&Method::POST, OBSERVE_PATH) => handle_observe(req, &experiment).await,
        (&Method::GET, HEALTH_PATH) => json_response(
            StatusCode::OK,
            serde_json::json!({
                "status": "healthy",
                "service": "experiment",
                "experiment": &*experiment,
            })
            .to_string()
            .into_bytes(),
        ),
        (_, OBSERVE_PATH) => {
            let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("POST"));
            response
        }
        _ => text_response(StatusCode::NOT_FOUND, "404 page not found"),
    };

    Ok(response)
}

async fn handle_observe(req: Request<Body>, experiment: &str) -> Response<Body> {
    let report = match hyper::body::to_bytes(req.into_body()).await {
        Ok(body) => decode_report(&body),
        Err(e) => Err(ObserveError::InvalidBody {
            reason: e.to_string(),
        }),
    };

    let report = match report {
        Ok(report) => report,
        Err(err) => {
            let ObserveError::InvalidBody { reason } = &err;
            warn!(%experiment, %reason, "rejected observation");
            return text_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };

    info!(
        "[{}] detected event from {} (id={:?}) end={:?} current={}",
        experiment, report.origin_name, report.origin_ordinal, report.end, report.current
    );

    let ack = acknowledge(experiment, report, Utc::now());
    match serde_json::to_vec(&ack) {
        Ok(mut body) => {
            body.push(b'\n');
            json_response(StatusCode::OK, body)
        }
        Err(e) => {
            error!(%experiment, error = %e, "failed to encode acknowledgment");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to encode result")
        }
    }
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn text_response(status: StatusCode, message: &str) -> Response<Body> {
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
