//! Request pipeline.
//!
//! # Data Flow
//! ```text
//! Request
//!     → origin      (reject disallowed Origin, remember accepted one)
//!     → preflight   (answer OPTIONS locally)
//!     → health      (answer the health path locally)
//!     → route       (first matching prefix, or 404)
//!     → authenticate (Bearer token → Claims, protected routes only)
//!     → authorize   (required role ∈ Claims.roles)
//!     → body_limit  (declared Content-Length within bounds)
//!     → rewrite + forward
//!     → CORS headers on whatever response came out
//! ```
//!
//! # Design Decisions
//! - Stages are a fixed, ordered list; each returns a tagged `Step` or an error
//! - All state shared across requests is immutable; no locks on the hot path
//! - A rejected request never reaches the forwarder

pub mod context;
pub mod stages;

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::response::IntoResponse;

use crate::config::loader::ConfigError;
use crate::config::schema::GatewayConfig;
use crate::error::GatewayError;
use crate::http::forward::{self, Forward, ForwardError};
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::security::{OriginPolicy, TokenVerifier};

pub use context::PipelineContext;
pub use stages::{Stage, STAGES};

/// Outcome of a stage that did not fail.
pub enum Step {
    /// Hand the request to the next stage.
    Continue,
    /// Stop here and answer with this response.
    Respond(Response<Body>),
}

/// The compiled gateway: policy, routes and the transport to backends.
pub struct Gateway {
    origins: OriginPolicy,
    verifier: TokenVerifier,
    routes: RouteTable,
    health_path: String,
    max_body_size: usize,
    forwarder: Arc<dyn Forward>,
}

impl Gateway {
    /// Compile a validated configuration.
    pub fn from_config(config: &GatewayConfig, forwarder: Arc<dyn Forward>) -> Result<Self, ConfigError> {
        let routes = RouteTable::from_config(&config.effective_routes(), &config.services)?;

        Ok(Self {
            origins: OriginPolicy::from_config(&config.cors)?,
            verifier: TokenVerifier::new(config.auth.jwt_secret.as_bytes()),
            routes,
            health_path: config.health.path.clone(),
            max_body_size: config.security.max_body_size,
            forwarder,
        })
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Run one request through the pipeline. Never fails: errors become responses.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let (parts, body) = request.into_parts();
        let mut ctx = PipelineContext::new(parts);

        let mut response = match self.run(&mut ctx, body).await {
            Ok(response) => response,
            Err(err) => {
                log_rejection(&ctx, &err);
                metrics::record_rejection(err.kind());
                err.into_response()
            }
        };

        if let Some(origin) = &ctx.cors_origin {
            self.origins.decorate(&mut response, origin);
        }

        metrics::record_request(
            ctx.parts.method.as_str(),
            response.status().as_u16(),
            ctx.service(),
            start,
        );
        response
    }

    async fn run(&self, ctx: &mut PipelineContext, body: Body) -> Result<Response<Body>, GatewayError> {
        for (name, stage) in STAGES {
            if let Step::Respond(response) = stage(self, ctx)? {
                tracing::debug!(request_id = %ctx.request_id, stage = name, "Answered locally");
                return Ok(response);
            }
        }

        let rule = ctx.route.clone().ok_or(GatewayError::NoRouteMatch)?;
        let request = forward::upstream_request(ctx, &rule, body, self.max_body_size)?;

        tracing::info!(
            request_id = %ctx.request_id,
            method = %ctx.parts.method,
            path = %ctx.path(),
            service = %rule.upstream.service,
            "Forwarding request"
        );
        metrics::record_forward(&rule.upstream.service);

        let response = self.forwarder.forward(request).await.map_err(|e| {
            if !matches!(e, ForwardError::BodyTooLarge) {
                tracing::error!(
                    request_id = %ctx.request_id,
                    service = %rule.upstream.service,
                    error = %e,
                    "Upstream error"
                );
            }
            GatewayError::from(e)
        })?;

        Ok(forward::relay(response))
    }
}

fn log_rejection(ctx: &PipelineContext, err: &GatewayError) {
    if err.status().is_server_error() {
        tracing::error!(
            request_id = %ctx.request_id,
            method = %ctx.parts.method,
            path = %ctx.path(),
            kind = err.kind(),
            error = ?err,
            "Request failed"
        );
    } else {
        tracing::warn!(
            request_id = %ctx.request_id,
            method = %ctx.parts.method,
            path = %ctx.path(),
            kind = err.kind(),
            "Request rejected"
        );
    }
}
