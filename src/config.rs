//! Configuration management module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing (first run).
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Proxy gateway connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub base_url: String,
    /// Where the navigation bar sends users on logout.
    #[serde(default)]
    pub logout_url: String,
    /// Overrides the header name used for bearer credentials.
    #[serde(default)]
    pub auth_header_name: Option<String>,
    /// HTTP timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Session cookie source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Document cookie string, `name=value; name2=value2`.
    #[serde(default)]
    pub cookie: Option<String>,
    /// File holding the document cookie string.
    #[serde(default)]
    pub cookie_file: Option<PathBuf>,
}

fn default_cookie_name() -> String {
    "token".to_string()
}

/// UI preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub dark_mode: bool,
    pub show_activity_log: bool,
}

impl AppConfig {
    /// Get the per-user config file path.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "gateway-console")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(config) => match config.validate() {
                    Ok(()) => ConfigLoadResult::Loaded(config),
                    Err(e) => ConfigLoadResult::Invalid(e),
                },
                Err(e) => ConfigLoadResult::Invalid(ConfigError::Parse(e)),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Read the file without validating it, e.g. to pre-fill the setup wizard.
    pub fn read_unvalidated(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        toml::from_str(&content).ok()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.proxy.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Validation("Proxy URL cannot be empty".to_string()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "Proxy URL must start with http:// or https://".to_string(),
            ));
        }
        if url::Url::parse(base_url).is_err() {
            return Err(ConfigError::Validation(format!("Proxy URL is not a valid URL: {base_url}")));
        }
        if !self.proxy.logout_url.is_empty() && !self.proxy.logout_url.starts_with("http") {
            return Err(ConfigError::Validation(
                "Logout URL must start with http:// or https://".to_string(),
            ));
        }
        if let Some(name) = &self.proxy.auth_header_name
            && name.trim().is_empty()
        {
            return Err(ConfigError::Validation("Auth header name cannot be blank".to_string()));
        }
        if self.proxy.timeout_secs < 1 {
            return Err(ConfigError::Validation("Timeout must be at least 1 second".to_string()));
        }
        if self.proxy.timeout_secs > 300 {
            return Err(ConfigError::Validation("Timeout cannot exceed 300 seconds".to_string()));
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::Validation("Cookie name cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Save configuration to file, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl ProxyConfig {
    /// Default location of the console: `<base_url>/ui/`.
    pub fn ui_url(&self) -> String {
        format!("{}/ui/", self.base_url.trim_end_matches('/'))
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            logout_url: String::new(),
            auth_header_name: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie: None,
            cookie_file: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            dark_mode: true,
            show_activity_log: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ui_url() {
        let proxy = ProxyConfig {
            base_url: "https://gateway.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(proxy.ui_url(), "https://gateway.example.com/ui/");
    }

    #[test]
    fn test_validation_empty_base_url() {
        let mut config = AppConfig::default();
        config.proxy.base_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_scheme() {
        let mut config = AppConfig::default();
        config.proxy.base_url = "ftp://invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_blank_header_name() {
        let mut config = AppConfig::default();
        config.proxy.auth_header_name = Some("  ".to_string());
        assert!(config.validate().is_err());

        config.proxy.auth_header_name = Some("x-gateway-key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_timeout_bounds() {
        let mut config = AppConfig::default();

        config.proxy.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.proxy.timeout_secs = 301;
        assert!(config.validate().is_err());

        config.proxy.timeout_secs = 30;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_empty_cookie_name() {
        let mut config = AppConfig::default();
        config.session.cookie_name = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.proxy.base_url = "https://gateway.example.com".to_string();
        config.session.cookie = Some("token=abc".to_string());
        config.save(&path).unwrap();

        match AppConfig::try_load(&path) {
            ConfigLoadResult::Loaded(loaded) => {
                assert_eq!(loaded.proxy.base_url, "https://gateway.example.com");
                assert_eq!(loaded.session.cookie.as_deref(), Some("token=abc"));
                assert_eq!(loaded.session.cookie_name, "token");
            }
            other => panic!("expected Loaded, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(matches!(AppConfig::try_load(&path), ConfigLoadResult::Missing));

        std::fs::write(&path, "this is = = not toml").unwrap();
        assert!(matches!(
            AppConfig::try_load(&path),
            ConfigLoadResult::Invalid(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_read_unvalidated_keeps_failing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(AppConfig::read_unvalidated(&path).is_none());

        std::fs::write(&path, "[proxy]\nbase_url = \"ftp://gw\"\ntimeout_secs = 5\n").unwrap();
        assert!(matches!(
            AppConfig::try_load(&path),
            ConfigLoadResult::Invalid(ConfigError::Validation(_))
        ));

        let config = AppConfig::read_unvalidated(&path).unwrap();
        assert_eq!(config.proxy.base_url, "ftp://gw");
        assert_eq!(config.proxy.timeout_secs, 5);
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config: AppConfig = toml::from_str("[proxy]\nbase_url = \"http://gw:4000\"\n").unwrap();
        assert_eq!(config.proxy.timeout_secs, 30);
        assert_eq!(config.session.cookie_name, "token");
        assert!(config.ui.show_activity_log);
        assert!(config.validate().is_ok());
    }
}
