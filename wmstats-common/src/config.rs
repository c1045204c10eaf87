//! Configuration loading and config file resolution
//!
//! Bootstrap settings come from a TOML file. Every field has a built-in
//! default, so a missing file is not an error: the service starts with
//! defaults and logs a warning.
//!
//! Config file priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Platform config directory (`<config_dir>/wmstats/config.toml`)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "WMSTATS_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// CouchDB server URL (scheme, host, port)
    pub couch_url: String,

    /// Database holding the WMStats documents
    pub database: String,

    /// Design document containing the views
    pub design: String,

    /// View listing request-registry documents
    pub campaign_view: String,

    /// View listing execution-agent documents (map + reduce)
    pub latest_view: String,

    /// HTTP bind address
    pub bind: String,

    /// HTTP server port
    pub port: u16,

    /// Per-request timeout for view queries, in seconds
    pub request_timeout_secs: u64,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            couch_url: "http://127.0.0.1:5984".to_string(),
            database: "wmstats".to_string(),
            design: "WMStats".to_string(),
            campaign_view: "campaign-request".to_string(),
            latest_view: "latest-request".to_string(),
            bind: "127.0.0.1".to_string(),
            port: 5730,
            request_timeout_secs: 30,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration, falling back to defaults when no file exists
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("No config file location available, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Check field values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if !(self.couch_url.starts_with("http://") || self.couch_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "couch_url must be an http(s) URL, got '{}'",
                self.couch_url
            )));
        }
        for (name, value) in [
            ("database", &self.database),
            ("design", &self.design),
            ("campaign_view", &self.campaign_view),
            ("latest_view", &self.latest_view),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", name)));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Timeout applied to each view query
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `host:port` string for the HTTP listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Resolve the config file location
///
/// Returns `None` only when no argument or environment override is given
/// and the platform has no config directory.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path()
}

/// `<config_dir>/wmstats/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wmstats").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = TomlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_addr(), "127.0.0.1:5730");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            couch_url = "https://couch.example.org:6984"
            port = 8080

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.couch_url, "https://couch.example.org:6984");
        assert_eq!(config.port, 8080);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.database, "wmstats");
        assert_eq!(config.latest_view, "latest-request");
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = TomlConfig::from_toml_str(r#"couch_url = "ftp://nope""#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_empty_view_name() {
        let err = TomlConfig::from_toml_str(r#"latest_view = " ""#).unwrap_err();
        assert!(err.to_string().contains("latest_view"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(TomlConfig::from_toml_str("request_timeout_secs = 0").is_err());
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let err = TomlConfig::from_toml_str("port = \"not a number\"").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_cli_argument_wins() {
        let path = resolve_config_path(Some(Path::new("/tmp/explicit.toml")), "WMSTATS_TEST_UNSET_VAR");
        assert_eq!(path, Some(PathBuf::from("/tmp/explicit.toml")));
    }
}
