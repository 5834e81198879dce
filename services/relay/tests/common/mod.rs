//! Shared fixtures for relay integration tests
//!
//! Every downstream is a real HTTP server on an ephemeral loopback port.

#![allow(dead_code)]

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use magnet_network::{FixedOrdinal, HopTransport, NodeIdentity, StaticDirectory};
use magnet_relay::{RelayContext, RelayServer};
use std::convert::Infallible;
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// What a mock downstream answers with
#[derive(Clone, Debug)]
pub enum MockReply {
    Canned {
        status: StatusCode,
        headers: Vec<(&'static str, &'static str)>,
        body: Bytes,
    },
    /// Hold the request open for the given time, then answer 200
    Hang(Duration),
    /// Like `Hang`, but raise `dropped` if the handler is abandoned first
    Stall {
        delay: Duration,
        dropped: Arc<AtomicBool>,
    },
    /// Answer 200, flush `first_chunk`, then fail the body after `delay`
    BrokenBody { first_chunk: Bytes, delay: Duration },
}

/// Raises its flag when dropped
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl MockReply {
    pub fn json(status: StatusCode, body: &str) -> Self {
        MockReply::Canned {
            status,
            headers: vec![("content-type", "application/json")],
            body: Bytes::from(body.to_string()),
        }
    }
}

/// A running mock downstream and the request bodies it has seen
pub struct MockDownstream {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<Bytes>>>,
}

impl MockDownstream {
    pub async fn spawn(reply: MockReply) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();

        let make_svc = make_service_fn(move |_conn| {
            let sink = sink.clone();
            let reply = reply.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                    let sink = sink.clone();
                    let reply = reply.clone();
                    async move {
                        let body = hyper::body::to_bytes(req.into_body()).await.unwrap();
                        sink.lock().unwrap().push(body);

                        let response = match reply {
                            MockReply::Canned {
                                status,
                                headers,
                                body,
                            } => {
                                let mut builder = Response::builder().status(status);
                                for (name, value) in headers {
                                    builder = builder.header(name, value);
                                }
                                builder.body(Body::from(body)).unwrap()
                            }
                            MockReply::Hang(delay) => {
                                tokio::time::sleep(delay).await;
                                Response::new(Body::empty())
                            }
                            MockReply::Stall { delay, dropped } => {
                                let _flag = DropFlag(dropped);
                                tokio::time::sleep(delay).await;
                                Response::new(Body::empty())
                            }
                            MockReply::BrokenBody { first_chunk, delay } => {
                                let failure = stream::once(async move {
                                    tokio::time::sleep(delay).await;
                                    Err::<Bytes, _>(io::Error::new(
                                        io::ErrorKind::BrokenPipe,
                                        "downstream broke",
                                    ))
                                });
                                let chunks =
                                    stream::iter([Ok::<_, io::Error>(first_chunk)]).chain(failure);
                                Response::new(Body::wrap_stream(chunks))
                            }
                        };
                        Ok::<_, Infallible>(response)
                    }
                }))
            }
        });

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::from_tcp(listener).unwrap().serve(make_svc);
        tokio::spawn(server);

        Self { addr, received }
    }

    pub fn hop_address(&self) -> String {
        format!("http://{}/hop", self.addr)
    }

    pub fn observe_url(&self) -> Url {
        Url::parse(&format!("http://{}/observe", self.addr)).unwrap()
    }

    pub fn received(&self) -> Vec<Bytes> {
        self.received.lock().unwrap().clone()
    }

    pub fn received_json(&self) -> Vec<serde_json::Value> {
        self.received()
            .iter()
            .map(|body| serde_json::from_slice(body).unwrap())
            .collect()
    }
}

/// Address nothing listens on
pub fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/hop", addr)
}

/// Relay node under test: `ordinal` in a ring whose members live at `members`
pub struct TestNode {
    pub ordinal: u32,
    pub members: Vec<String>,
    pub collector: Option<Url>,
    pub timeout: Duration,
    pub max_laps: u32,
    pub header_read_timeout: Option<Duration>,
}

impl TestNode {
    pub fn new(ordinal: u32, members: Vec<String>) -> Self {
        Self {
            ordinal,
            members,
            collector: None,
            timeout: Duration::from_secs(5),
            max_laps: 8,
            header_read_timeout: None,
        }
    }

    pub fn collector(mut self, url: Url) -> Self {
        self.collector = Some(url);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_laps(mut self, laps: u32) -> Self {
        self.max_laps = laps;
        self
    }

    pub fn header_read_timeout(mut self, timeout: Duration) -> Self {
        self.header_read_timeout = Some(timeout);
        self
    }

    /// Start serving; returns the node's base URL
    pub async fn spawn(self) -> String {
        let ring_size = self.members.len() as u32;
        let identity =
            NodeIdentity::resolve(&FixedOrdinal(self.ordinal), ring_size, "magnet", "magnets")
                .unwrap();
        let directory = StaticDirectory::new(self.members).unwrap();
        let transport = HopTransport::new(self.timeout).unwrap();
        let context = RelayContext::new(identity, Arc::new(directory), transport)
            .with_collector(self.collector)
            .with_max_laps(self.max_laps);

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut server = RelayServer::new(context);
        if let Some(timeout) = self.header_read_timeout {
            server = server.with_header_read_timeout(timeout);
        }
        tokio::spawn(server.serve(listener, std::future::pending()));

        format!("http://{}", addr)
    }
}

pub async fn post_hop(base: &str, body: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/hop", base))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap()
}
