//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{Response, StatusCode};
use axum::{Json, Router};
use edge_gateway::config::schema::{ANALYSIS_SERVICE, AUTH_SERVICE, CONVERTER_SERVICE};
use edge_gateway::config::{GatewayConfig, ServiceConfig};
use edge_gateway::http::{Forward, ForwardError};
use edge_gateway::security::token::{issue_token, sign, unix_now};
use edge_gateway::security::Claims;
use edge_gateway::{HttpServer, Shutdown};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const SECRET: &str = "integration-secret";
pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Serve `router` on an ephemeral local port.
pub async fn spawn_backend(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Backend answering every request with a JSON description of what it received.
pub async fn echo_backend(name: &'static str) -> SocketAddr {
    let router = Router::new().fallback(move |request: Request| async move { Json(describe(name, &request)) });
    spawn_backend(router).await
}

/// Backend that waits `delay` before answering.
pub async fn slow_backend(delay: Duration) -> SocketAddr {
    let router = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        "late"
    });
    spawn_backend(router).await
}

/// Backend answering with a fixed status and body, whatever the request.
pub async fn status_backend(status: StatusCode, body: &'static str) -> SocketAddr {
    let router = Router::new().fallback(move || async move { (status, body) });
    spawn_backend(router).await
}

/// Backend that reads the whole body and answers with its length.
pub async fn draining_backend() -> SocketAddr {
    let router = Router::new().fallback(|body: Bytes| async move { body.len().to_string() });
    spawn_backend(router).await
}

/// What happened to the requests of a `tracked_backend`.
#[derive(Debug, Default)]
pub struct CallTracker {
    pub started: AtomicBool,
    pub finished: AtomicBool,
    pub cancelled: AtomicBool,
}

/// Marks the call cancelled if the handler future is dropped before finishing.
struct CancelGuard {
    tracker: Arc<CallTracker>,
    done: bool,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if !self.done {
            self.tracker.cancelled.store(true, Ordering::SeqCst);
        }
    }
}

/// Backend that takes `delay` to answer and records whether it got there.
pub async fn tracked_backend(delay: Duration) -> (SocketAddr, Arc<CallTracker>) {
    let tracker = Arc::new(CallTracker::default());
    let shared = tracker.clone();
    let router = Router::new().fallback(move || {
        let tracker = shared.clone();
        async move {
            let mut guard = CancelGuard {
                tracker: tracker.clone(),
                done: false,
            };
            tracker.started.store(true, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            tracker.finished.store(true, Ordering::SeqCst);
            guard.done = true;
            "done"
        }
    });
    (spawn_backend(router).await, tracker)
}

/// Write `request` verbatim and return the status code of the reply.
pub async fn raw_status(addr: SocketAddr, request: &[u8]) -> u16 {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut reply = Vec::new();
    let _ = stream.read_to_end(&mut reply).await;
    let reply = String::from_utf8_lossy(&reply);
    reply
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or_else(|| panic!("no status line in {reply:?}"))
}

/// An address nobody listens on.
pub fn dead_address() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

fn describe(name: &str, request: &Request) -> Value {
    let header = |key: &str| {
        request
            .headers()
            .get(key)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    json!({
        "backend": name,
        "method": request.method().as_str(),
        "path": request.uri().path(),
        "query": request.uri().query(),
        "host": header("host"),
        "authorization": header("authorization"),
        "x_forwarded_for": header("x-forwarded-for"),
        "x_request_id": header("x-request-id"),
    })
}

/// Gateway config pointing the three services at the given addresses.
pub fn test_config(auth: SocketAddr, analysis: SocketAddr, converter: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.auth.jwt_secret = SECRET.into();
    config.cors.allowed_origins = vec![ALLOWED_ORIGIN.into()];
    config.services.insert(AUTH_SERVICE.into(), ServiceConfig::new(format!("http://{auth}")));
    config
        .services
        .insert(ANALYSIS_SERVICE.into(), ServiceConfig::new(format!("http://{analysis}")));
    config
        .services
        .insert(CONVERTER_SERVICE.into(), ServiceConfig::new(format!("http://{converter}")));
    config
}

/// Start a gateway on an ephemeral port. Trigger the returned handle to stop it.
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Valid token for `roles`, signed with the test secret.
pub fn token(roles: &[&str]) -> String {
    let roles = roles.iter().map(|r| r.to_string()).collect();
    issue_token(SECRET.as_bytes(), "ana", roles, Duration::from_secs(3600)).unwrap()
}

pub fn expired_token(roles: &[&str]) -> String {
    let roles = roles.iter().map(|r| r.to_string()).collect();
    sign(SECRET.as_bytes(), &Claims::new("ana", roles, unix_now() - 60)).unwrap()
}

/// Forwarder that records what it was asked to send and answers 200 itself.
#[derive(Default)]
pub struct SpyForwarder {
    calls: AtomicUsize,
    uris: Mutex<Vec<String>>,
}

impl SpyForwarder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn uris(&self) -> Vec<String> {
        self.uris.lock().unwrap().clone()
    }
}

#[async_trait]
impl Forward for SpyForwarder {
    async fn forward(&self, request: axum::http::Request<Body>) -> Result<Response<Body>, ForwardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.uris.lock().unwrap().push(request.uri().to_string());
        Ok(Response::new(Body::from("forwarded")))
    }
}

/// In-process gateway router backed by a spy.
pub fn spy_router(config: GatewayConfig) -> (Router, Arc<SpyForwarder>) {
    let spy = Arc::new(SpyForwarder::default());
    let server = HttpServer::with_forwarder(config, spy.clone()).unwrap();
    (server.router(), spy)
}
