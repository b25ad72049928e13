//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → .env + process environment (PORT, ALLOWED_ORIGINS, JWT_SECRET, *_SERVICE_URL)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled once into the request pipeline
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no runtime reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_dotenv, ConfigError, CONFIG_PATH_VAR};
pub use schema::{
    AuthConfig, CorsConfig, GatewayConfig, HealthConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, RouteConfig, SecurityConfig, ServiceConfig, ServicesConfig,
    TimeoutConfig,
};
