//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (ordered route lookup)
//!     → matcher.rs (prefix test)
//!     → Return: matched RouteRule or NoMatch
//!     → rewrite.rs (absolute upstream URI for the rule)
//!
//! Route Compilation (at startup):
//!     RouteConfig[] + services
//!     → Resolve service base URLs
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

pub mod matcher;
pub mod rewrite;
pub mod router;

pub use rewrite::upstream_uri;
pub use router::{RouteRule, RouteTable, Upstream};
