//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in declaration order
//! - Look up the matching route for a request path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (acceptable for typical route counts)
//! - First declared match wins, never longest match
//! - Explicit NoMatch rather than silent default

use std::str::FromStr;
use std::sync::Arc;

use axum::http::uri::{Authority, Scheme};

use crate::config::loader::ConfigError;
use crate::config::schema::{RouteConfig, ServicesConfig};
use crate::config::validation::check_service_url;
use crate::routing::matcher::PathPrefixMatcher;

/// A resolved backend base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    /// Service name, used in logs and metrics.
    pub service: String,
    pub scheme: Scheme,
    pub authority: Authority,
    /// Path of the base URL without trailing slash; empty for the root.
    pub base_path: String,
}

impl Upstream {
    /// Parse a service base URL such as `http://analysis:8082`.
    pub fn parse(service: &str, raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidService {
            name: service.to_string(),
            reason,
        };

        let url = check_service_url(raw).map_err(invalid)?;
        let host = url.host_str().ok_or_else(|| invalid("missing host".into()))?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self {
            service: service.to_string(),
            scheme: Scheme::HTTP,
            authority: Authority::from_str(&authority).map_err(|e| invalid(e.to_string()))?,
            base_path: url.path().trim_end_matches('/').to_string(),
        })
    }
}

/// One compiled routing rule.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub name: String,
    pub matcher: PathPrefixMatcher,
    pub upstream: Upstream,
    /// Role required to pass; `None` means the route is public.
    pub permission: Option<String>,
    /// Literal path sent upstream in place of the request path.
    pub rewrite: String,
}

impl RouteRule {
    pub fn requires_auth(&self) -> bool {
        self.permission.is_some()
    }
}

/// Ordered, immutable route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<Arc<RouteRule>>,
}

impl RouteTable {
    /// Compile route definitions, resolving each service reference.
    pub fn from_config(routes: &[RouteConfig], services: &ServicesConfig) -> Result<Self, ConfigError> {
        let mut rules: Vec<Arc<RouteRule>> = Vec::with_capacity(routes.len());

        for route in routes {
            let service = services
                .get(&route.service)
                .ok_or_else(|| ConfigError::InvalidService {
                    name: route.service.clone(),
                    reason: format!("referenced by route `{}` but not configured", route.name()),
                })?;

            let rule = RouteRule {
                name: route.name().to_string(),
                matcher: PathPrefixMatcher::new(route.path_prefix.clone()),
                upstream: Upstream::parse(&route.service, &service.url)?,
                permission: route.permission.clone(),
                rewrite: route.rewrite_target().to_string(),
            };

            if let Some(earlier) = rules.iter().find(|r| rule.matcher.is_shadowed_by(&r.matcher)) {
                tracing::warn!(
                    route = %rule.name,
                    shadowed_by = %earlier.name,
                    "Route is unreachable: an earlier prefix matches first"
                );
            }

            rules.push(Arc::new(rule));
        }

        Ok(Self { rules })
    }

    /// First rule, in declaration order, whose prefix matches `path`.
    pub fn match_path(&self, path: &str) -> Option<&Arc<RouteRule>> {
        self.rules.iter().find(|rule| rule.matcher.matches(path))
    }

    pub fn rules(&self) -> &[Arc<RouteRule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{default_routes, GatewayConfig, ServiceConfig};

    fn services() -> ServicesConfig {
        GatewayConfig::default().services
    }

    #[test]
    fn test_first_declared_match_wins() {
        let routes = vec![
            RouteConfig::new("/api/v1/analyze", "analysis").with_permission("analise"),
            RouteConfig::new("/api/v1/analyze/icms", "analysis").with_permission("analise-icms"),
        ];
        let table = RouteTable::from_config(&routes, &services()).unwrap();

        let rule = table.match_path("/api/v1/analyze/icms").unwrap();
        assert_eq!(rule.name, "/api/v1/analyze");
        assert_eq!(rule.permission.as_deref(), Some("analise"));
    }

    #[test]
    fn test_no_match() {
        let table = RouteTable::from_config(&default_routes(), &services()).unwrap();
        assert!(table.match_path("/api/v2/login").is_none());
        assert!(table.match_path("/").is_none());
    }

    #[test]
    fn test_default_table() {
        let table = RouteTable::from_config(&default_routes(), &services()).unwrap();
        assert_eq!(table.len(), 7);

        let login = table.match_path("/api/v1/login").unwrap();
        assert!(!login.requires_auth());
        assert_eq!(login.upstream.service, "auth");

        let convert = table.match_path("/api/v1/convert/atolini-pagamentos").unwrap();
        assert_eq!(convert.permission.as_deref(), Some("converter-atolini-pagamentos"));
        assert_eq!(convert.upstream.service, "converter");
        assert_eq!(convert.rewrite, "/api/v1/convert/atolini-pagamentos");
    }

    #[test]
    fn test_unknown_service_rejected() {
        let routes = vec![RouteConfig::new("/api/v1/reports", "reports")];
        let err = RouteTable::from_config(&routes, &services()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidService { name, .. } if name == "reports"));
    }

    #[test]
    fn test_upstream_parse() {
        let upstream = Upstream::parse("analysis", "http://analysis:8082/").unwrap();
        assert_eq!(upstream.authority.as_str(), "analysis:8082");
        assert_eq!(upstream.base_path, "");

        let upstream = Upstream::parse("converter", "http://10.1.2.3/converter/").unwrap();
        assert_eq!(upstream.authority.as_str(), "10.1.2.3");
        assert_eq!(upstream.base_path, "/converter");

        let mut services = services();
        services.insert("auth".into(), ServiceConfig::new("https://auth"));
        let routes = vec![RouteConfig::new("/api/v1/login", "auth")];
        assert!(RouteTable::from_config(&routes, &services).is_err());
    }
}
