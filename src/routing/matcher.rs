//! Route matching logic.
//!
//! # Design Decisions
//! - Path matching is a case-sensitive byte prefix test
//! - No segment awareness: `/api/v1/login` also matches `/api/v1/loginx`
//! - No regex to guarantee O(n) matching

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns true if `path` starts with this prefix.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// True if every path this matcher accepts is also accepted by `other`.
    pub fn is_shadowed_by(&self, other: &PathPrefixMatcher) -> bool {
        other.matches(&self.prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
