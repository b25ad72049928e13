//! Upstream URI construction.
//!
//! The request path is replaced wholesale by the rule's rewrite target. Any
//! suffix after the matched prefix is dropped; the query string is kept.

use axum::http::uri::PathAndQuery;
use axum::http::Uri;

use crate::error::GatewayError;
use crate::routing::router::RouteRule;

/// Absolute URI of the upstream request for `rule`.
pub fn upstream_uri(rule: &RouteRule, original: &Uri) -> Result<Uri, GatewayError> {
    let path = format!("{}{}", rule.upstream.base_path, rule.rewrite);
    let path_and_query = match original.query() {
        Some(query) => format!("{path}?{query}"),
        None => path,
    };

    let path_and_query = PathAndQuery::try_from(path_and_query)
        .map_err(|e| GatewayError::Internal(format!("rewritten path: {e}")))?;

    Uri::builder()
        .scheme(rule.upstream.scheme.clone())
        .authority(rule.upstream.authority.clone())
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| GatewayError::Internal(format!("upstream uri: {e}")))
}
