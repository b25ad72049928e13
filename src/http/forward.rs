//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the upstream request (rewritten URI, sanitized headers, streamed body)
//! - Send it over a pooled HTTP client with a bounded wait for the response head
//! - Relay the backend response back without touching status or body
//!
//! # Design Decisions
//! - `Forward` is the seam between pipeline and transport
//! - Timeouts map to 504, every other transport failure to 502
//! - Dropping the returned future (client went away) drops the upstream call

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::{LengthLimitError, Limited};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::config::schema::TimeoutConfig;
use crate::error::GatewayError;
use crate::pipeline::PipelineContext;
use crate::routing::{upstream_uri, RouteRule};
use crate::security::headers::{strip_hop_by_hop, upstream_headers};

/// Transport failure while talking to a backend.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    #[error("no upstream response within {0:?}")]
    Timeout(Duration),

    #[error("request body exceeded the size limit while streaming")]
    BodyTooLarge,
}

impl From<ForwardError> for GatewayError {
    fn from(err: ForwardError) -> Self {
        match err {
            ForwardError::Unreachable(_) => GatewayError::UpstreamUnreachable,
            ForwardError::Timeout(_) => GatewayError::UpstreamTimeout,
            ForwardError::BodyTooLarge => GatewayError::PayloadTooLarge,
        }
    }
}

/// Sends a fully built request to its backend.
#[async_trait]
pub trait Forward: Send + Sync {
    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError>;
}

/// Pooled hyper client.
#[derive(Clone)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HttpForwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
            .pool_max_idle_per_host(timeouts.max_idle_per_backend)
            .build(connector);

        Self {
            client,
            timeout: Duration::from_secs(timeouts.upstream_secs),
        }
    }
}

#[async_trait]
impl Forward for HttpForwarder {
    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Err(_) => Err(ForwardError::Timeout(self.timeout)),
            Ok(Err(e)) if body_limit_exceeded(&e) => Err(ForwardError::BodyTooLarge),
            Ok(Err(e)) => Err(ForwardError::Unreachable(e.to_string())),
            Ok(Ok(response)) => {
                let (parts, body) = response.into_parts();
                Ok(Response::from_parts(parts, Body::new(body)))
            }
        }
    }
}

/// True when the body cap set by `upstream_request` aborted the exchange.
fn body_limit_exceeded(err: &(dyn StdError + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(e) = source {
        if e.downcast_ref::<LengthLimitError>().is_some() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Assemble the upstream request for `rule` from the client request.
///
/// The body is streamed, capped at `max_body_size` bytes.
pub fn upstream_request(
    ctx: &PipelineContext,
    rule: &RouteRule,
    body: Body,
    max_body_size: usize,
) -> Result<Request<Body>, GatewayError> {
    let uri = upstream_uri(rule, &ctx.parts.uri)?;

    let mut request = Request::builder()
        .method(ctx.parts.method.clone())
        .uri(uri)
        .body(Body::new(Limited::new(body, max_body_size)))
        .map_err(|e| GatewayError::Internal(format!("upstream request: {e}")))?;

    *request.headers_mut() = upstream_headers(&ctx.parts.headers, &rule.upstream, ctx.client);
    Ok(request)
}

/// Backend response as sent to the client: only connection-scoped headers change.
pub fn relay(mut response: Response<Body>) -> Response<Body> {
    strip_hop_by_hop(response.headers_mut());
    response
}
