//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID and trace layers)
//!     → pipeline (origin, auth, permission, route)
//!     → forward.rs (rewrite, pooled client, relay)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{Forward, ForwardError, HttpForwarder};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
