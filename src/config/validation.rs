//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing services)
//! - Validate value ranges (timeouts > 0, bind address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address `{0}`")]
    BindAddress(String),

    #[error("token signing secret is empty")]
    EmptySecret,

    #[error("service `{name}` has invalid url `{url}`: {reason}")]
    ServiceUrl {
        name: String,
        url: String,
        reason: String,
    },

    #[error("route `{route}` references unknown service `{service}`")]
    UnknownService { route: String, service: String },

    #[error("route `{route}`: {field} `{value}` must start with '/'")]
    RelativePath {
        route: String,
        field: &'static str,
        value: String,
    },

    #[error("route `{route}` has an empty permission")]
    EmptyPermission { route: String },

    #[error("health path `{0}` must start with '/'")]
    HealthPath(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    }

    for (name, service) in &config.services {
        if let Err(reason) = check_service_url(&service.url) {
            errors.push(ValidationError::ServiceUrl {
                name: name.clone(),
                url: service.url.clone(),
                reason,
            });
        }
    }

    for route in config.effective_routes() {
        let route_name = route.name().to_string();

        if !config.services.contains_key(&route.service) {
            errors.push(ValidationError::UnknownService {
                route: route_name.clone(),
                service: route.service.clone(),
            });
        }

        for (field, value) in [
            ("path_prefix", route.path_prefix.as_str()),
            ("rewrite", route.rewrite_target()),
        ] {
            if !value.starts_with('/') {
                errors.push(ValidationError::RelativePath {
                    route: route_name.clone(),
                    field,
                    value: value.to_string(),
                });
            }
        }

        if route.permission.as_deref() == Some("") {
            errors.push(ValidationError::EmptyPermission { route: route_name });
        }
    }

    if !config.health.path.starts_with('/') {
        errors.push(ValidationError::HealthPath(config.health.path.clone()));
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.upstream_secs"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.connect_secs"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue("security.max_body_size"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Upstreams are plain HTTP base URLs with a host.
pub(crate) fn check_service_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(url)
}
