//! Configuration management for the home lab daemon.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/homelab/config.toml`.
//! Environment variables override file values, and the result is frozen into
//! an [`AccessConfig`] before the server starts.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use protocol::MAX_SEARCH_RESULTS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AccessConfig;

/// Placeholder system pass shipped in the defaults. Must be overridden.
pub const DEFAULT_SYSTEM_PASS: &str = "password";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("port must be greater than 0")]
    InvalidPort,

    #[error("bind address must not be empty")]
    EmptyBindAddress,

    #[error("search_limit must be between 1 and {max}, got {got}")]
    InvalidSearchLimit { got: usize, max: usize },

    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the home lab daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// System pass and elevation settings.
    pub access: AccessSettings,

    /// File browser configuration.
    pub files: FileConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind: String,

    /// Port to listen on.
    pub port: u16,

    /// Directory holding the dashboard frontend, served at `/`.
    pub static_dir: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

/// System pass and elevation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AccessSettings {
    /// Shared secret that elevates a request to the whole filesystem.
    /// An empty value disables elevation by secret.
    pub system_pass: String,

    /// Grant whole-filesystem access to every request without a secret.
    pub allow_full_system_access: bool,
}

/// File browser configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Root visible to unauthenticated requests. Relative paths are resolved
    /// against the working directory at startup.
    pub storage_dir: PathBuf,

    /// Maximum number of search results per request.
    pub search_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            static_dir: Some(PathBuf::from("frontend")),
            log_level: "info".to_string(),
        }
    }
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            system_pass: DEFAULT_SYSTEM_PASS.to_string(),
            allow_full_system_access: false,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("storage"),
            search_limit: MAX_SEARCH_RESULTS,
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("homelab")
        .join("config.toml")
}

/// Interpret an `ALLOW_FULL_SYSTEM_ACCESS` style flag.
///
/// Only a case-insensitive `true` enables the flag.
/// A configuration value taken from, or rejected from, the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvOverride {
    /// The variable replaced a config value. `value` is `None` for secrets.
    Applied {
        variable: &'static str,
        value: Option<String>,
    },
    /// The variable was set but could not be parsed.
    Ignored {
        variable: &'static str,
        value: String,
    },
}

impl EnvOverride {
    fn applied(variable: &'static str, value: Option<String>) -> Self {
        Self::Applied { variable, value }
    }

    /// Emit the override through `tracing`.
    pub fn log(&self) {
        match self {
            Self::Applied {
                variable,
                value: Some(value),
            } => tracing::info!("Overriding config from {}: {}", variable, value),
            Self::Applied {
                variable,
                value: None,
            } => tracing::info!("Overriding config from {}", variable),
            Self::Ignored { variable, value } => {
                tracing::warn!("Ignoring unparsable {} value: {:?}", variable, value)
            }
        }
    }
}

/// A set, non-empty environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Returns the top of the filesystem tree for this platform.
pub fn system_root() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("C:\\")
    } else {
        PathBuf::from("/")
    }
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Empty values are ignored. Supported variables:
    /// - SYSTEM_PASS: Override the system pass
    /// - ALLOW_FULL_SYSTEM_ACCESS: `true` grants whole-filesystem access
    /// - STORAGE_DIR: Override the storage root
    /// - PORT: Override the listening port
    /// - HOMELAB_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    ///
    /// This usually runs before tracing is installed, so nothing is logged
    /// here. Callers log the returned overrides with [`EnvOverride::log`].
    pub fn apply_env_overrides(&mut self) -> Vec<EnvOverride> {
        let mut applied = Vec::new();

        if let Some(pass) = env_value("SYSTEM_PASS") {
            self.access.system_pass = pass;
            applied.push(EnvOverride::applied("SYSTEM_PASS", None));
        }

        if let Some(flag) = env_value("ALLOW_FULL_SYSTEM_ACCESS") {
            let allow = parse_flag(&flag);
            self.access.allow_full_system_access = allow;
            applied.push(EnvOverride::applied(
                "ALLOW_FULL_SYSTEM_ACCESS",
                Some(allow.to_string()),
            ));
        }

        if let Some(dir) = env_value("STORAGE_DIR") {
            self.files.storage_dir = PathBuf::from(&dir);
            applied.push(EnvOverride::applied("STORAGE_DIR", Some(dir)));
        }

        if let Some(port) = env_value("PORT") {
            match port.parse::<u16>() {
                Ok(parsed) => {
                    self.server.port = parsed;
                    applied.push(EnvOverride::applied("PORT", Some(port)));
                }
                Err(_) => applied.push(EnvOverride::Ignored {
                    variable: "PORT",
                    value: port,
                }),
            }
        }

        if let Some(level) = env_value("HOMELAB_LOG_LEVEL") {
            self.server.log_level = level.clone();
            applied.push(EnvOverride::applied("HOMELAB_LOG_LEVEL", Some(level)));
        }

        applied
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::EmptyBindAddress);
        }

        if self.files.search_limit == 0 || self.files.search_limit > MAX_SEARCH_RESULTS {
            return Err(ConfigError::InvalidSearchLimit {
                got: self.files.search_limit,
                max: MAX_SEARCH_RESULTS,
            });
        }

        let level = self.server.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.server.log_level.clone()));
        }

        Ok(())
    }

    /// Whether the shipped placeholder secret is still in effect.
    pub fn uses_default_system_pass(&self) -> bool {
        self.access.system_pass == DEFAULT_SYSTEM_PASS
    }

    /// Freeze the access-related settings into an immutable [`AccessConfig`].
    ///
    /// The storage directory is created if missing and canonicalized so that
    /// containment checks compare against its real location.
    pub fn access_config(&self) -> Result<AccessConfig> {
        let storage_dir = if self.files.storage_dir.is_absolute() {
            self.files.storage_dir.clone()
        } else {
            std::env::current_dir()
                .context("Failed to determine working directory")?
                .join(&self.files.storage_dir)
        };

        fs::create_dir_all(&storage_dir).with_context(|| {
            format!("Failed to create storage directory: {}", storage_dir.display())
        })?;

        let storage_root = fs::canonicalize(&storage_dir).with_context(|| {
            format!("Failed to resolve storage directory: {}", storage_dir.display())
        })?;

        Ok(AccessConfig::new(
            self.access.system_pass.clone(),
            self.access.allow_full_system_access,
            storage_root,
            system_root(),
        ))
    }

    /// Copy of this configuration with the system pass masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.access.system_pass.is_empty() {
            copy.access.system_pass = "********".to_string();
        }
        copy
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    /// If the file exists but is invalid TOML, returns an error with
    /// a helpful message.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "SYSTEM_PASS",
        "ALLOW_FULL_SYSTEM_ACCESS",
        "STORAGE_DIR",
        "PORT",
        "HOMELAB_LOG_LEVEL",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.access.system_pass, "password");
        assert!(!config.access.allow_full_system_access);
        assert_eq!(config.files.storage_dir, PathBuf::from("storage"));
        assert_eq!(config.files.search_limit, MAX_SEARCH_RESULTS);
        assert!(config.uses_default_system_pass());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn test_from_toml_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
[access]
system_pass = "hunter2"

[files]
search_limit = 50
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.access.system_pass, "hunter2");
        assert_eq!(config.files.search_limit, 50);
        assert!(!config.access.allow_full_system_access);
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn test_from_toml_full() {
        let toml = r#"
[server]
bind = "127.0.0.1"
port = 8080
static_dir = "/srv/homelab/frontend"
log_level = "debug"

[access]
system_pass = "s3cret"
allow_full_system_access = true

[files]
storage_dir = "/srv/storage"
search_limit = 100
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.server.static_dir,
            Some(PathBuf::from("/srv/homelab/frontend"))
        );
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.access.system_pass, "s3cret");
        assert!(config.access.allow_full_system_access);
        assert_eq!(config.files.storage_dir, PathBuf::from("/srv/storage"));
        assert_eq!(config.files.search_limit, 100);
        assert!(!config.uses_default_system_pass());
    }

    #[test]
    fn test_from_toml_invalid_syntax() {
        let result = Config::from_toml("[server\nport = 1");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_from_toml_wrong_type() {
        let toml = r#"
[server]
port = "not a number"
"#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPort));
    }

    #[test]
    fn test_validate_rejects_empty_bind() {
        let mut config = Config::default();
        config.server.bind = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyBindAddress));
    }

    #[test]
    fn test_validate_search_limit_bounds() {
        let mut config = Config::default();
        config.files.search_limit = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSearchLimit { got: 0, .. })
        ));

        config.files.search_limit = MAX_SEARCH_RESULTS + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSearchLimit { .. })
        ));

        config.files.search_limit = 1;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = Config::default();
        config.server.log_level = "verbose".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel("verbose".to_string()))
        );

        config.server.log_level = "WARN".to_string();
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" True "));
        assert!(!parse_flag("1"));
        assert!(!parse_flag("yes"));
        assert!(!parse_flag("false"));
    }

    #[test]
    fn test_redacted_masks_secret() {
        let mut config = Config::default();
        config.access.system_pass = "hunter2".to_string();

        let redacted = config.redacted();
        assert_eq!(redacted.access.system_pass, "********");
        assert!(!redacted.to_toml().unwrap().contains("hunter2"));
        assert_eq!(config.access.system_pass, "hunter2");
    }

    #[test]
    fn test_redacted_keeps_empty_secret_empty() {
        let mut config = Config::default();
        config.access.system_pass = String::new();
        assert_eq!(config.redacted().access.system_pass, "");
    }

    #[test]
    fn test_access_config_creates_and_canonicalizes_storage() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.files.storage_dir = temp_dir.path().join("nested").join("storage");
        config.access.system_pass = "abc".to_string();

        let access = config.access_config().unwrap();

        assert!(access.storage_root().is_dir());
        assert!(access.storage_root().is_absolute());
        assert_eq!(
            access.storage_root(),
            fs::canonicalize(temp_dir.path().join("nested/storage")).unwrap()
        );
        assert_eq!(access.system_root(), system_root().as_path());
        assert!(!access.always_allow_full_access());
    }

    #[test]
    fn test_roundtrip() {
        let original = Config::default();
        let toml = original.to_toml().unwrap();
        let loaded = Config::from_toml(&toml).unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = Config::default();
        original.server.port = 8081;
        original.access.allow_full_system_access = true;

        original.save(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "invalid [ toml").unwrap();

        let err = Config::load(&config_path).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("homelab"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("SYSTEM_PASS", "from-env");
        std::env::set_var("ALLOW_FULL_SYSTEM_ACCESS", "True");
        std::env::set_var("STORAGE_DIR", "/data/storage");
        std::env::set_var("PORT", "4000");
        std::env::set_var("HOMELAB_LOG_LEVEL", "debug");

        let mut config = Config::default();
        let overrides = config.apply_env_overrides();

        assert_eq!(config.access.system_pass, "from-env");
        assert!(config.access.allow_full_system_access);
        assert_eq!(config.files.storage_dir, PathBuf::from("/data/storage"));
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.log_level, "debug");

        let variables: Vec<_> = overrides
            .iter()
            .map(|o| match o {
                EnvOverride::Applied { variable, .. } => *variable,
                EnvOverride::Ignored { variable, .. } => *variable,
            })
            .collect();
        assert_eq!(
            variables,
            [
                "SYSTEM_PASS",
                "ALLOW_FULL_SYSTEM_ACCESS",
                "STORAGE_DIR",
                "PORT",
                "HOMELAB_LOG_LEVEL"
            ]
        );
        assert_eq!(
            overrides[0],
            EnvOverride::Applied {
                variable: "SYSTEM_PASS",
                value: None
            }
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_override_empty_does_not_override() {
        clear_env();
        std::env::set_var("SYSTEM_PASS", "");
        std::env::set_var("ALLOW_FULL_SYSTEM_ACCESS", "");

        let mut config = Config::default();
        config.access.allow_full_system_access = true;
        config.apply_env_overrides();

        assert_eq!(config.access.system_pass, DEFAULT_SYSTEM_PASS);
        assert!(config.access.allow_full_system_access);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_override_non_true_flag_disables() {
        clear_env();
        std::env::set_var("ALLOW_FULL_SYSTEM_ACCESS", "yes");

        let mut config = Config::default();
        config.access.allow_full_system_access = true;
        config.apply_env_overrides();

        assert!(!config.access.allow_full_system_access);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_override_bad_port_ignored() {
        clear_env();
        std::env::set_var("PORT", "eighty");

        let mut config = Config::default();
        let overrides = config.apply_env_overrides();

        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(
            overrides,
            [EnvOverride::Ignored {
                variable: "PORT",
                value: "eighty".to_string()
            }]
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_unset_does_not_override() {
        clear_env();

        let mut config = Config::default();
        let overrides = config.apply_env_overrides();

        assert_eq!(config, Config::default());
        assert!(overrides.is_empty());
    }
}
