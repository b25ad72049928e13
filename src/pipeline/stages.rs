//! Guard stages, in the order they run.

use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH, ORIGIN};
use axum::http::Method;

use crate::error::GatewayError;
use crate::http::response::health_response;
use crate::pipeline::{Gateway, PipelineContext, Step};
use crate::security::{authorize, OriginPolicy};

/// A guard either lets the request continue, answers it, or rejects it.
pub type Stage = fn(&Gateway, &mut PipelineContext) -> Result<Step, GatewayError>;

/// Stages run for every request before forwarding. Origin always comes first.
pub const STAGES: [(&str, Stage); 7] = [
    ("origin", check_origin),
    ("preflight", answer_preflight),
    ("health", answer_health),
    ("route", resolve_route),
    ("authenticate", authenticate),
    ("authorize", check_permission),
    ("body_limit", check_body_size),
];

fn check_origin(gateway: &Gateway, ctx: &mut PipelineContext) -> Result<Step, GatewayError> {
    ctx.cors_origin = gateway.origins.check(ctx.parts.headers.get(ORIGIN))?;
    Ok(Step::Continue)
}

fn answer_preflight(gateway: &Gateway, ctx: &mut PipelineContext) -> Result<Step, GatewayError> {
    if OriginPolicy::is_preflight(&ctx.parts.method, &ctx.parts.headers) {
        return Ok(Step::Respond(gateway.origins.preflight(&ctx.parts.headers)));
    }
    Ok(Step::Continue)
}

fn answer_health(gateway: &Gateway, ctx: &mut PipelineContext) -> Result<Step, GatewayError> {
    let method = &ctx.parts.method;
    if (*method == Method::GET || *method == Method::HEAD) && is_health_path(ctx.path(), &gateway.health_path) {
        return Ok(Step::Respond(health_response()));
    }
    Ok(Step::Continue)
}

/// Case-insensitive, with at most one trailing slash.
fn is_health_path(path: &str, health_path: &str) -> bool {
    let path = match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    };
    path.eq_ignore_ascii_case(health_path)
}

fn resolve_route(gateway: &Gateway, ctx: &mut PipelineContext) -> Result<Step, GatewayError> {
    let rule = gateway
        .routes
        .match_path(ctx.path())
        .ok_or(GatewayError::NoRouteMatch)?;
    ctx.route = Some(rule.clone());
    Ok(Step::Continue)
}

fn authenticate(gateway: &Gateway, ctx: &mut PipelineContext) -> Result<Step, GatewayError> {
    let requires_auth = ctx.route.as_ref().is_some_and(|r| r.requires_auth());
    if requires_auth {
        let claims = gateway
            .verifier
            .verify_now(ctx.parts.headers.get(AUTHORIZATION))?;
        ctx.claims = Some(claims);
    }
    Ok(Step::Continue)
}

fn check_permission(_gateway: &Gateway, ctx: &mut PipelineContext) -> Result<Step, GatewayError> {
    if let Some(permission) = ctx.route.as_ref().and_then(|r| r.permission.as_deref()) {
        authorize(ctx.claims.as_ref(), permission)?;
    }
    Ok(Step::Continue)
}

/// Declared bodies over the limit are refused up front. Chunked bodies are
/// capped while streaming to the backend.
fn check_body_size(gateway: &Gateway, ctx: &mut PipelineContext) -> Result<Step, GatewayError> {
    let declared = ctx
        .parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    match declared {
        Some(len) if len > gateway.max_body_size => Err(GatewayError::PayloadTooLarge),
        _ => Ok(Step::Continue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_path_variants() {
        let health = "/api/v1/health";
        assert!(is_health_path("/api/v1/health", health));
        assert!(is_health_path("/api/v1/health/", health));
        assert!(is_health_path("/API/V1/Health", health));

        assert!(!is_health_path("/api/v1/health//", health));
        assert!(!is_health_path("/api/v1/healthz", health));
        assert!(!is_health_path("/api/v1/health/deep", health));
    }
}
