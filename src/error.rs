//! Request pipeline errors.
//!
//! Every guard failure is terminal for its request and maps to one status
//! code and a `{"error": "..."}` body. Upstream failures only ever expose a
//! generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Terminal failure of the request pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Not allowed by CORS")]
    DisallowedOrigin,

    #[error("Authorization token not provided")]
    MissingCredential,

    #[error("Invalid token format")]
    MalformedCredential,

    #[error("Invalid or expired token")]
    InvalidCredential,

    #[error("User claims not found")]
    ClaimsMissing,

    #[error("Access denied: required permission missing")]
    PermissionDenied,

    #[error("No matching route found")]
    NoRouteMatch,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Upstream service unavailable")]
    UpstreamUnreachable,

    #[error("Upstream service timed out")]
    UpstreamTimeout,

    /// Request could not be assembled for the upstream. Detail is logged only.
    #[error("Internal gateway error")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::DisallowedOrigin => StatusCode::FORBIDDEN,
            GatewayError::MissingCredential
            | GatewayError::MalformedCredential
            | GatewayError::InvalidCredential => StatusCode::UNAUTHORIZED,
            GatewayError::ClaimsMissing | GatewayError::PermissionDenied => StatusCode::FORBIDDEN,
            GatewayError::NoRouteMatch => StatusCode::NOT_FOUND,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::UpstreamUnreachable => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::DisallowedOrigin => "disallowed_origin",
            GatewayError::MissingCredential => "missing_credential",
            GatewayError::MalformedCredential => "malformed_credential",
            GatewayError::InvalidCredential => "invalid_credential",
            GatewayError::ClaimsMissing => "claims_missing",
            GatewayError::PermissionDenied => "permission_denied",
            GatewayError::NoRouteMatch => "no_route_match",
            GatewayError::PayloadTooLarge => "payload_too_large",
            GatewayError::UpstreamUnreachable => "upstream_unreachable",
            GatewayError::UpstreamTimeout => "upstream_timeout",
            GatewayError::Internal(_) => "internal",
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayError::MissingCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(GatewayError::MalformedCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(GatewayError::InvalidCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(GatewayError::ClaimsMissing.status(), StatusCode::FORBIDDEN);
        assert_eq!(GatewayError::PermissionDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(GatewayError::NoRouteMatch.status(), StatusCode::NOT_FOUND);
        assert_eq!(GatewayError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(GatewayError::UpstreamUnreachable.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(GatewayError::UpstreamTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = GatewayError::PermissionDenied.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Access denied: required permission missing" }));
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let err = GatewayError::Internal("bad authority".into());
        assert_eq!(err.to_string(), "Internal gateway error");
    }
}
