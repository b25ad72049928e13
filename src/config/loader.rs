//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{
    GatewayConfig, LogFormat, ServiceConfig, ANALYSIS_SERVICE, AUTH_SERVICE, CONVERTER_SERVICE,
};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_VAR: &str = "GATEWAY_CONFIG";

/// Base URL variables, one per backend service.
const SERVICE_URL_VARS: [(&str, &str); 3] = [
    ("AUTH_SERVICE_URL", AUTH_SERVICE),
    ("ANALYSIS_SERVICE_URL", ANALYSIS_SERVICE),
    ("CONVERTER_SERVICE_URL", CONVERTER_SERVICE),
];

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment variable {key}: {reason}")]
    Env { key: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Invalid service `{name}`: {reason}")]
    InvalidService { name: String, reason: String },

    #[error("Invalid CORS settings: {0}")]
    InvalidCors(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Merge a `.env` file into the process environment, if one is found.
///
/// Returns its path. A missing `.env` is the normal case in containers.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Load configuration: optional TOML file, then the process environment.
///
/// Call `load_dotenv` first for `.env` values to take part.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let env_path = std::env::var(CONFIG_PATH_VAR).ok();
    let path = path.or(env_path.as_deref().map(Path::new));

    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => GatewayConfig::default(),
    };

    apply_env(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file without applying the environment or validating.
pub fn parse_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

/// Overlay environment values onto `config`.
///
/// `lookup` abstracts `std::env::var` so overrides can be exercised without
/// touching the process environment.
pub fn apply_env<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT") {
        let port: u16 = port.trim().parse().map_err(|e| ConfigError::Env {
            key: "PORT",
            reason: format!("{e}"),
        })?;
        config.listener.bind_address = format!("0.0.0.0:{port}");
    }

    if let Some(origins) = lookup("ALLOWED_ORIGINS") {
        config.cors.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }

    if let Some(secret) = lookup("JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }

    for (key, service) in SERVICE_URL_VARS {
        if let Some(url) = lookup(key) {
            config
                .services
                .insert(service.to_string(), ServiceConfig::new(url.trim()));
        }
    }

    if let Some(secs) = lookup("UPSTREAM_TIMEOUT_SECS") {
        config.timeouts.upstream_secs = secs.trim().parse().map_err(|e| ConfigError::Env {
            key: "UPSTREAM_TIMEOUT_SECS",
            reason: format!("{e}"),
        })?;
    }

    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }

    if let Some(format) = lookup("LOG_FORMAT") {
        config.observability.log_format = match format.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            other => {
                return Err(ConfigError::Env {
                    key: "LOG_FORMAT",
                    reason: format!("unknown format `{other}`"),
                })
            }
        };
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GatewayConfig::default();
        apply_env(
            &mut config,
            env(&[
                ("PORT", "9000"),
                ("ALLOWED_ORIGINS", "https://app.example.com, http://localhost:3000,"),
                ("JWT_SECRET", "s3cr3t"),
                ("ANALYSIS_SERVICE_URL", "http://analysis:8082"),
                ("UPSTREAM_TIMEOUT_SECS", "12"),
                ("LOG_FORMAT", "json"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://app.example.com", "http://localhost:3000"]
        );
        assert_eq!(config.auth.jwt_secret, "s3cr3t");
        assert_eq!(config.services[ANALYSIS_SERVICE].url, "http://analysis:8082");
        assert_eq!(config.services[AUTH_SERVICE].url, "http://localhost:8081");
        assert_eq!(config.timeouts.upstream_secs, 12);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_empty_origin_list_allows_nothing() {
        let mut config = GatewayConfig::default();
        config.cors.allowed_origins = vec!["*".into()];
        apply_env(&mut config, env(&[("ALLOWED_ORIGINS", "")])).unwrap();
        assert!(config.cors.allowed_origins.is_empty());
    }

    #[test]
    fn test_bad_port_is_reported() {
        let mut config = GatewayConfig::default();
        let err = apply_env(&mut config, env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "PORT", .. }));
    }

    #[test]
    fn test_parse_toml_routes() {
        let toml = r#"
            [listener]
            bind_address = "127.0.0.1:8080"

            [cors]
            allowed_origins = ["*"]

            [services.reports]
            url = "http://reports:9000"

            [[routes]]
            path_prefix = "/api/v1/reports"
            service = "reports"
            permission = "reports-read"
            rewrite = "/internal/reports"
        "#;

        let config: GatewayConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.cors.allowed_origins, vec!["*"]);
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].permission.as_deref(), Some("reports-read"));
        assert_eq!(config.routes[0].rewrite_target(), "/internal/reports");
        assert_eq!(config.health.path, "/api/v1/health");
    }

    #[test]
    fn test_secret_is_redacted() {
        let mut config = GatewayConfig::default();
        config.auth.jwt_secret = "do-not-print".into();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("do-not-print"));
        let serialized = toml::to_string(&config).unwrap();
        assert!(!serialized.contains("do-not-print"));
    }
}
