//! Header manipulation for proxied requests and responses.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Rewrite `Host` to the backend authority
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host
//!
//! # Design Decisions
//! - Preserve original client IP in X-Forwarded-For (appended to any existing chain)
//! - End-to-end headers, `Authorization` included, pass through untouched

use std::net::SocketAddr;

use axum::http::header::{CONNECTION, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::routing::Upstream;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_FORWARDED_HOST: &str = "x-forwarded-host";
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Connection-scoped headers (RFC 9110 §7.6.1).
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Headers for the upstream request derived from the client's.
pub fn upstream_headers(original: &HeaderMap, upstream: &Upstream, client: Option<SocketAddr>) -> HeaderMap {
    let mut headers = original.clone();
    strip_hop_by_hop(&mut headers);

    if let Some(host) = original.get(HOST) {
        headers.insert(X_FORWARDED_HOST, host.clone());
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));

    if let Some(client) = client {
        let ip = client.ip().to_string();
        let chain = match original.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(existing) => format!("{existing}, {ip}"),
            None => ip,
        };
        if let Ok(value) = HeaderValue::from_str(&chain) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    if let Ok(host) = HeaderValue::from_str(upstream.authority.as_str()) {
        headers.insert(HOST, host);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, TRANSFER_ENCODING};

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive, x-session-hint"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-session-hint", HeaderValue::from_static("abc"));
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_upstream_headers() {
        let upstream = Upstream::parse("analysis", "http://analysis:8082").unwrap();
        let mut original = HeaderMap::new();
        original.insert(HOST, HeaderValue::from_static("gateway.example.com"));
        original.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        original.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.7"));

        let client: SocketAddr = "10.0.0.9:55000".parse().unwrap();
        let headers = upstream_headers(&original, &upstream, Some(client));

        assert_eq!(headers[HOST], "analysis:8082");
        assert_eq!(headers[X_FORWARDED_HOST], "gateway.example.com");
        assert_eq!(headers[X_FORWARDED_FOR], "203.0.113.7, 10.0.0.9");
        assert_eq!(headers[X_FORWARDED_PROTO], "http");
        assert_eq!(headers[AUTHORIZATION], "Bearer abc");
    }
}
