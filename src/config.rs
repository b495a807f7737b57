//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `FINANCE_*` environment variable
//! overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::backend::RestConfig;
use crate::session::Session;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which backend to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted REST store
    Rest,
    /// In-process store persisted to a local snapshot file
    #[default]
    Local,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rest" => Ok(BackendKind::Rest),
            "local" => Ok(BackendKind::Local),
            other => Err(format!("Invalid backend kind: {}. Use rest or local", other)),
        }
    }
}

/// Backend connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Project URL of the hosted backend
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Public anonymous API key
    #[serde(default)]
    pub anon_key: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Snapshot file for the local backend
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

fn default_backend_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10000
}

fn default_snapshot_path() -> String {
    dirs::data_local_dir()
        .map(|p| {
            p.join("finance-tracker")
                .join("finance.json")
                .to_string_lossy()
                .to_string()
        })
        .unwrap_or_else(|| "./finance_data/finance.json".to_string())
}

impl BackendConfig {
    /// Snapshot path with a leading `~` expanded
    pub fn snapshot_path(&self) -> PathBuf {
        match self.snapshot_path.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.snapshot_path)),
            None => PathBuf::from(&self.snapshot_path),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            url: default_backend_url(),
            anon_key: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

/// Signed-in user, as issued by the auth service
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub access_token: Option<String>,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum concurrent WebSocket connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8085
}

fn default_max_connections() -> usize {
    100
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Display preferences
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "PHP".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file locations, in search order
    pub fn search_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("finance-tracker").join("config.toml")),
            Some(PathBuf::from("/etc/finance-tracker/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in Self::search_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Backend overrides
        if let Some(kind) = var("FINANCE_BACKEND").and_then(|k| k.parse().ok()) {
            self.backend.kind = kind;
        }
        if let Some(url) = var("FINANCE_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Some(key) = var("FINANCE_ANON_KEY") {
            self.backend.anon_key = key;
        }
        if let Some(path) = var("FINANCE_SNAPSHOT_PATH") {
            self.backend.snapshot_path = path;
        }

        // Session overrides
        if let Some(user_id) = var("FINANCE_USER_ID") {
            self.session.user_id = Some(user_id);
        }
        if let Some(email) = var("FINANCE_EMAIL") {
            self.session.email = Some(email);
        }
        if let Some(token) = var("FINANCE_ACCESS_TOKEN") {
            self.session.access_token = Some(token);
        }

        // API overrides
        if let Some(host) = var("FINANCE_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("FINANCE_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }

        // Display overrides
        if let Some(currency) = var("FINANCE_CURRENCY") {
            self.display.currency = currency;
        }

        // Logging overrides
        if let Some(level) = var("FINANCE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("FINANCE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// The configured session, if a user id is set
    pub fn session(&self) -> Result<Option<Session>, ConfigError> {
        let Some(raw) = self.session.user_id.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };

        let user_id = Uuid::parse_str(raw.trim()).map_err(|e| ConfigError::Invalid {
            field: "session.user_id".to_string(),
            error: e.to_string(),
        })?;

        let mut session = Session::new(user_id);
        if let Some(email) = &self.session.email {
            session = session.email(email);
        }
        if let Some(token) = &self.session.access_token {
            session = session.access_token(token);
        }
        Ok(Some(session))
    }

    /// Settings for the REST backend client
    pub fn rest_config(&self) -> RestConfig {
        RestConfig {
            url: self.backend.url.clone(),
            anon_key: self.backend.anon_key.clone(),
            access_token: self.session.access_token.clone(),
            request_timeout_ms: self.backend.request_timeout_ms,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid value for {field}: {error}")]
    Invalid { field: String, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Finance Tracker Configuration
#
# Environment variables override these settings:
# - FINANCE_BACKEND (rest | local)
# - FINANCE_BACKEND_URL
# - FINANCE_ANON_KEY
# - FINANCE_SNAPSHOT_PATH
# - FINANCE_USER_ID
# - FINANCE_EMAIL
# - FINANCE_ACCESS_TOKEN
# - FINANCE_API_HOST
# - FINANCE_API_PORT
# - FINANCE_CURRENCY
# - FINANCE_LOG_LEVEL
# - FINANCE_LOG_FORMAT

[backend]
# rest: hosted backend; local: in-process store saved to snapshot_path
kind = "local"

# Hosted backend project URL
url = "http://localhost:54321"

# Public anonymous key
anon_key = ""

# Request timeout (ms)
request_timeout_ms = 10000

# Snapshot file for the local backend
snapshot_path = "~/.local/share/finance-tracker/finance.json"

[session]
# Signed-in user (issued by the auth service)
# user_id = "00000000-0000-0000-0000-000000000000"
# email = "you@example.com"
# access_token = ""

[api]
# API server host
host = "127.0.0.1"

# API server port
port = 8085

# Maximum concurrent WebSocket connections
max_connections = 100

[display]
# Currency used for formatting amounts
currency = "PHP"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend.kind, BackendKind::Local);
        assert_eq!(config.api.port, 8085);
        assert_eq!(config.display.currency, "PHP");
        assert!(config.session().unwrap().is_none());
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.backend.request_timeout_ms, 10000);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[backend]
kind = "rest"
url = "https://demo.example.co"
anon_key = "anon"

[session]
user_id = "0b4a3e4c-2f55-4d3b-8c4e-3a1f1e2d5c6b"
access_token = "token"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Rest);

        let session = config.session().unwrap().unwrap();
        assert_eq!(session.access_token.as_deref(), Some("token"));

        let rest = config.rest_config();
        assert_eq!(rest.url, "https://demo.example.co");
        assert_eq!(rest.access_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FINANCE_BACKEND", "rest"),
            ("FINANCE_API_PORT", "9000"),
            ("FINANCE_API_HOST", "0.0.0.0"),
            ("FINANCE_CURRENCY", "USD"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend.kind, BackendKind::Rest);
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.display.currency, "USD");
    }

    #[test]
    fn test_invalid_user_id() {
        let mut config = Config::default();
        config.session.user_id = Some("not-a-uuid".to_string());
        assert!(matches!(
            config.session(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load(Path::new("/nonexistent/finance.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
