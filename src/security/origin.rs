//! Cross-origin policy.
//!
//! # Responsibilities
//! - Accept or reject the request `Origin` against a static allowlist
//! - Answer CORS preflight requests locally
//! - Attach CORS headers to every response of an accepted origin
//!
//! # Design Decisions
//! - A request without `Origin` is accepted and gets no CORS headers
//! - Accepted origins are reflected, never answered with a literal `*`
//! - Rejection happens before any other stage looks at the request

use std::collections::HashSet;

use axum::body::Body;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS,
    ACCESS_CONTROL_REQUEST_METHOD, VARY,
};
use axum::http::{HeaderMap, HeaderValue, Method, Response, StatusCode};

use crate::config::loader::ConfigError;
use crate::config::schema::CorsConfig;
use crate::error::GatewayError;

/// Allowlist entry accepting any origin.
pub const WILDCARD: &str = "*";

/// Compiled CORS policy.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allow_any: bool,
    allowed: HashSet<String>,
    allow_methods: HeaderValue,
    allow_headers: Option<HeaderValue>,
    allow_credentials: bool,
    max_age: HeaderValue,
}

impl OriginPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, ConfigError> {
        let header = |values: &[String]| {
            HeaderValue::from_str(&values.join(","))
                .map_err(|e| ConfigError::InvalidCors(e.to_string()))
        };

        let allow_headers = if config.allowed_headers.is_empty() {
            None
        } else {
            Some(header(&config.allowed_headers)?)
        };

        Ok(Self {
            allow_any: config.allowed_origins.iter().any(|o| o == WILDCARD),
            allowed: config.allowed_origins.iter().cloned().collect(),
            allow_methods: header(&config.allowed_methods)?,
            allow_headers,
            allow_credentials: config.allow_credentials,
            max_age: HeaderValue::from(config.max_age_secs),
        })
    }

    /// Decide on the request origin.
    ///
    /// Returns the origin to reflect in CORS headers, `None` when the request
    /// carried no origin.
    pub fn check(&self, origin: Option<&HeaderValue>) -> Result<Option<HeaderValue>, GatewayError> {
        let Some(origin) = origin else {
            return Ok(None);
        };

        if self.allow_any {
            return Ok(Some(origin.clone()));
        }

        match origin.to_str() {
            Ok(value) if self.allowed.contains(value) => Ok(Some(origin.clone())),
            _ => Err(GatewayError::DisallowedOrigin),
        }
    }

    /// Browser preflight: `OPTIONS` carrying `Access-Control-Request-Method`.
    pub fn is_preflight(method: &Method, headers: &HeaderMap) -> bool {
        *method == Method::OPTIONS && headers.contains_key(ACCESS_CONTROL_REQUEST_METHOD)
    }

    /// Local answer to a preflight request.
    pub fn preflight(&self, request_headers: &HeaderMap) -> Response<Body> {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;

        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_MAX_AGE, self.max_age.clone());

        match &self.allow_headers {
            Some(allowed) => {
                headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allowed.clone());
            }
            None => {
                if let Some(requested) = request_headers.get(ACCESS_CONTROL_REQUEST_HEADERS) {
                    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
                    headers.append(VARY, HeaderValue::from_static("Access-Control-Request-Headers"));
                }
            }
        }

        response
    }

    /// Attach CORS headers for an accepted origin.
    pub fn decorate(&self, response: &mut Response<Body>, origin: &HeaderValue) {
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        headers.append(VARY, HeaderValue::from_static("Origin"));
        if self.allow_credentials {
            headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }
    }
}
