//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline and server produce:
//!     → logging.rs (structured log events, request_id on every line)
//!     → metrics.rs (counters and latency histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;

pub use logging::init_tracing;
pub use metrics::init_metrics;
