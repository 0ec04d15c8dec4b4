//! TOML-based configuration for Liftlog
//!
//! Configuration comes from a TOML file (`liftlog.toml`) when one is given,
//! otherwise from environment variables. Every field has a default.
//!
//! Token lifetime and scope are fixed and deliberately absent here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure loaded from liftlog.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiftlogConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::ValidationError(format!(
                "Unknown log format '{}', expected 'pretty' or 'json'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Default tracing filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local database path, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Environment variable for Turso URL (optional cloud config)
    pub turso_url_env: Option<String>,

    /// Environment variable for Turso auth token
    pub turso_token_env: Option<String>,
}

fn default_database_url() -> String {
    "./data/liftlog.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            turso_url_env: None,
            turso_token_env: None,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl LiftlogConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: LiftlogConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Build configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from a variable lookup.
    ///
    /// Reads `HOST`, `PORT`, `DATABASE_URL`, `LOG_LEVEL` and `LOG_FORMAT`.
    /// When `TURSO_DATABASE_URL` is set, the Turso variable names are recorded
    /// in the database section.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LiftlogConfig::default();

        if let Some(host) = lookup("HOST") {
            config.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::ValidationError(format!("Invalid PORT '{}'", port)))?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            config.server.log_level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.server.log_format = format.parse()?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            config.database.url = url;
        }
        if lookup("TURSO_DATABASE_URL").is_some() {
            config.database.turso_url_env = Some("TURSO_DATABASE_URL".to_string());
            config.database.turso_token_env = Some("TURSO_AUTH_TOKEN".to_string());
        }

        config.validate_with(&lookup)?;
        Ok(config)
    }

    /// Validate the configuration and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_with(&|name: &str| std::env::var(name).ok())
    }

    fn validate_with<F>(&self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host must not be empty".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must not be 0".to_string(),
            ));
        }

        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url must not be empty".to_string(),
            ));
        }

        for env in [&self.database.turso_url_env, &self.database.turso_token_env]
            .into_iter()
            .flatten()
        {
            if lookup(env.as_str()).is_none() {
                return Err(ConfigError::MissingEnvVar(env.clone()));
            }
        }

        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_parse_config() {
        let content = r#"
[server]
host = "0.0.0.0"
port = 4000
log_level = "debug"
log_format = "json"

[database]
url = ":memory:"
"#;

        let config: LiftlogConfig = toml::from_str(content).expect("Failed to parse config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.database.url, ":memory:");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: LiftlogConfig = toml::from_str("").unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.server.log_format, LogFormat::Pretty);
        assert_eq!(config.database.url, "./data/liftlog.db");
        assert!(config.database.turso_url_env.is_none());
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_unknown_log_format_fails_to_parse() {
        let result: Result<LiftlogConfig, _> = toml::from_str("[server]\nlog_format = \"xml\"");
        assert!(result.is_err());
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
    }

    #[test]
    fn test_zero_port_is_invalid() {
        let config: LiftlogConfig = toml::from_str("[server]\nport = 0").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_missing_turso_env_var() {
        let config: LiftlogConfig = toml::from_str(
            r#"
[database]
turso_url_env = "LIFTLOG_TEST_UNSET_TURSO_URL"
turso_token_env = "LIFTLOG_TEST_UNSET_TURSO_TOKEN"
"#,
        )
        .unwrap();

        match config.validate() {
            Err(ConfigError::MissingEnvVar(name)) => {
                assert_eq!(name, "LIFTLOG_TEST_UNSET_TURSO_URL")
            }
            other => panic!("expected MissingEnvVar, got {:?}", other),
        }
    }

    #[test]
    fn test_from_lookup() {
        let config = LiftlogConfig::from_lookup(lookup_from(&[
            ("PORT", "9090"),
            ("DATABASE_URL", ":memory:"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.database.url, ":memory:");
        assert_eq!(config.server.log_format, LogFormat::Json);
    }

    #[test]
    fn test_from_lookup_rejects_bad_port() {
        let result = LiftlogConfig::from_lookup(lookup_from(&[("PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_from_lookup_turso_needs_token() {
        let result =
            LiftlogConfig::from_lookup(lookup_from(&[("TURSO_DATABASE_URL", "libsql://x.turso.io")]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(name)) if name == "TURSO_AUTH_TOKEN"));

        let config = LiftlogConfig::from_lookup(lookup_from(&[
            ("TURSO_DATABASE_URL", "libsql://x.turso.io"),
            ("TURSO_AUTH_TOKEN", "token"),
        ]))
        .unwrap();
        assert_eq!(
            config.database.turso_url_env.as_deref(),
            Some("TURSO_DATABASE_URL")
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 3100\n[database]\nurl = \":memory:\"").unwrap();

        let config = LiftlogConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, 3100);
    }

    #[test]
    fn test_load_missing_file() {
        let result = LiftlogConfig::load("/nonexistent/liftlog.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
