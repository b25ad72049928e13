//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the service that issues tokens.
pub const AUTH_SERVICE: &str = "auth";
/// Name of the fiscal analysis service.
pub const ANALYSIS_SERVICE: &str = "analysis";
/// Name of the statement converter service.
pub const CONVERTER_SERVICE: &str = "converter";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Bearer token verification settings.
    pub auth: AuthConfig,

    /// Backend services keyed by name.
    pub services: ServicesConfig,

    /// Ordered route definitions. Empty means the built-in table.
    pub routes: Vec<RouteConfig>,

    /// Locally answered health endpoint.
    pub health: HealthConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            cors: CorsConfig::default(),
            auth: AuthConfig::default(),
            services: default_services(),
            routes: Vec::new(),
            health: HealthConfig::default(),
            timeouts: TimeoutConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// The configured routes, or the built-in table when none are declared.
    pub fn effective_routes(&self) -> Vec<RouteConfig> {
        if self.routes.is_empty() {
            default_routes()
        } else {
            self.routes.clone()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Cross-origin resource sharing policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. `*` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Methods advertised in preflight responses.
    pub allowed_methods: Vec<String>,

    /// Headers advertised in preflight responses.
    /// Empty reflects `Access-Control-Request-Headers`.
    pub allowed_headers: Vec<String>,

    /// Emit `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_methods: ["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: Vec::new(),
            allow_credentials: false,
            max_age_secs: 600,
        }
    }
}

/// Bearer token settings.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret shared with the auth service.
    #[serde(skip_serializing)]
    pub jwt_secret: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

/// Backend services keyed by name.
pub type ServicesConfig = BTreeMap<String, ServiceConfig>;

/// A single upstream service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Base URL (e.g., "http://analysis:8082").
    pub url: String,
}

impl ServiceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Route configuration mapping a path prefix to a service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics. Defaults to the prefix.
    #[serde(default)]
    pub name: Option<String>,

    /// Path prefix to match.
    pub path_prefix: String,

    /// Service name to forward to.
    pub service: String,

    /// Role required to use the route. Absent means no authentication.
    #[serde(default)]
    pub permission: Option<String>,

    /// Literal upstream path. Defaults to the prefix.
    #[serde(default)]
    pub rewrite: Option<String>,
}

impl RouteConfig {
    pub fn new(path_prefix: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            name: None,
            path_prefix: path_prefix.into(),
            service: service.into(),
            permission: None,
            rewrite: None,
        }
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn with_rewrite(mut self, rewrite: impl Into<String>) -> Self {
        self.rewrite = Some(rewrite.into());
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.path_prefix)
    }

    pub fn rewrite_target(&self) -> &str {
        self.rewrite.as_deref().unwrap_or(&self.path_prefix)
    }
}

/// The route table served when the configuration declares none.
pub fn default_routes() -> Vec<RouteConfig> {
    let mut routes = vec![
        RouteConfig::new("/api/v1/login", AUTH_SERVICE),
        RouteConfig::new("/api/v1/analyze/icms", ANALYSIS_SERVICE).with_permission("analise-icms"),
        RouteConfig::new("/api/v1/analyze/ipi-st", ANALYSIS_SERVICE)
            .with_permission("analise-ipi-st"),
    ];

    for name in [
        "francesinha",
        "receitas-acisa",
        "atolini-pagamentos",
        "atolini-recebimentos",
    ] {
        routes.push(
            RouteConfig::new(format!("/api/v1/convert/{name}"), CONVERTER_SERVICE)
                .with_permission(format!("converter-{name}")),
        );
    }

    routes
}

fn default_services() -> ServicesConfig {
    let mut services = BTreeMap::new();
    services.insert(AUTH_SERVICE.to_string(), ServiceConfig::new("http://localhost:8081"));
    services.insert(ANALYSIS_SERVICE.to_string(), ServiceConfig::new("http://localhost:8082"));
    services.insert(CONVERTER_SERVICE.to_string(), ServiceConfig::new("http://localhost:8083"));
    services
}

/// Health endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Path answered locally.
    pub path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            path: "/api/v1/health".to_string(),
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream response head, in seconds.
    pub upstream_secs: u64,

    /// Idle pooled connection timeout in seconds.
    pub idle_secs: u64,

    /// Maximum idle pooled connections per backend.
    pub max_idle_per_backend: usize,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            idle_secs: 60,
            max_idle_per_backend: 32,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 20 * 1024 * 1024, // statements can be large
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
