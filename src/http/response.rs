//! Locally generated responses.

use axum::body::Body;
use axum::http::Response;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

/// Liveness payload of the health endpoint.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
}

pub fn health_response() -> Response<Body> {
    Json(HealthStatus {
        status: "UP",
        message: "Gateway is running!",
    })
    .into_response()
}
