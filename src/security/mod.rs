//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (CORS allowlist, preflight, response headers)
//!     → token.rs (Bearer credential → Claims)
//!     → permission.rs (Claims × required role)
//!     → headers.rs (sanitize, add X-Forwarded-*)
//!     → Pass to forwarder
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input
//! - Nothing here performs I/O

pub mod headers;
pub mod origin;
pub mod permission;
pub mod token;

pub use origin::OriginPolicy;
pub use permission::authorize;
pub use token::{Claims, TokenVerifier};
