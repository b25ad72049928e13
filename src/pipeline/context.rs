//! Per-request pipeline state.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use axum::http::HeaderValue;

use crate::http::request::X_REQUEST_ID;
use crate::routing::RouteRule;
use crate::security::Claims;

/// Scratch state carried through the stages of one request.
///
/// `claims` is only ever set by the authentication stage, and only for
/// routes that require a permission.
#[derive(Debug)]
pub struct PipelineContext {
    /// Original request head. The body travels separately.
    pub parts: Parts,
    pub request_id: String,
    pub client: Option<SocketAddr>,
    /// Origin accepted by the CORS check, reflected on the response.
    pub cors_origin: Option<HeaderValue>,
    pub route: Option<Arc<RouteRule>>,
    pub claims: Option<Claims>,
}

impl PipelineContext {
    pub fn new(parts: Parts) -> Self {
        let request_id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let client = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            parts,
            request_id,
            client,
            cors_origin: None,
            route: None,
            claims: None,
        }
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Service label for logs and metrics.
    pub fn service(&self) -> &str {
        self.route
            .as_ref()
            .map(|r| r.upstream.service.as_str())
            .unwrap_or("none")
    }
}
