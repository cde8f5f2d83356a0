//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/chatpulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/chatpulse/` (~/.config/chatpulse/)
//! - State/Logs: `$XDG_STATE_HOME/chatpulse/` (~/.local/state/chatpulse/)
//!
//! Live store credentials can also come from the environment, which takes
//! precedence over the file:
//! `CHATPULSE_DEMO_URL`, `CHATPULSE_DEMO_SERVICE_KEY`,
//! `CHATPULSE_PRODUCTION_URL`, `CHATPULSE_PRODUCTION_SERVICE_KEY`.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Fixture dataset location
    #[serde(default)]
    pub fixtures: FixturesConfig,

    /// Demo tenant classification
    #[serde(default)]
    pub tenants: TenantsConfig,

    /// Live store connections
    #[serde(default)]
    pub live: LiveConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the fixture dataset comes from
#[derive(Debug, Deserialize, Default, Clone)]
pub struct FixturesConfig {
    /// Directory holding `sessions.json`, `session_analyses.json` and
    /// `messages.json`. The embedded dataset is used when unset.
    pub dir: Option<PathBuf>,
}

/// Which tenants are demo tenants
#[derive(Debug, Deserialize, Clone)]
pub struct TenantsConfig {
    /// Tenant ids that are always demo tenants
    #[serde(default)]
    pub demo_tenants: Vec<String>,

    /// Tenant ids starting with this prefix are demo tenants
    #[serde(default = "default_demo_prefix")]
    pub demo_prefix: Option<String>,
}

impl Default for TenantsConfig {
    fn default() -> Self {
        Self {
            demo_tenants: vec![],
            demo_prefix: default_demo_prefix(),
        }
    }
}

fn default_demo_prefix() -> Option<String> {
    Some("demo-".to_string())
}

/// Scope a live store serves
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StoreScope {
    /// Store holding demo tenants' data
    Demo,
    /// Store holding real tenants' data
    Production,
}

impl StoreScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreScope::Demo => "demo",
            StoreScope::Production => "production",
        }
    }

    /// Prefix of the environment variables overriding this scope
    fn env_prefix(&self) -> &'static str {
        match self {
            StoreScope::Demo => "CHATPULSE_DEMO",
            StoreScope::Production => "CHATPULSE_PRODUCTION",
        }
    }
}

impl std::fmt::Display for StoreScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Both live store connections
#[derive(Debug, Deserialize, Clone)]
pub struct LiveConfig {
    #[serde(default = "LiveStoreConfig::demo")]
    pub demo: LiveStoreConfig,

    #[serde(default = "LiveStoreConfig::production")]
    pub production: LiveStoreConfig,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            demo: LiveStoreConfig::demo(),
            production: LiveStoreConfig::production(),
        }
    }
}

impl LiveConfig {
    /// Connection settings for a scope
    pub fn scope(&self, scope: StoreScope) -> &LiveStoreConfig {
        match scope {
            StoreScope::Demo => &self.demo,
            StoreScope::Production => &self.production,
        }
    }
}

/// Connection settings for one live store.
///
/// A store without URL or service key is a valid, detectable state: it is
/// only an error once an operation is invoked against it.
#[derive(Debug, Deserialize, Clone)]
pub struct LiveStoreConfig {
    /// Which tenants this store serves (set from the table it appears in)
    #[serde(skip, default = "default_scope")]
    pub scope: StoreScope,

    /// Base URL of the REST endpoint (e.g. `https://db.example.com/rest/v1`)
    pub url: Option<String>,

    /// Service credential sent with every request
    pub service_key: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_scope() -> StoreScope {
    StoreScope::Production
}

fn default_timeout() -> u64 {
    30
}

impl LiveStoreConfig {
    /// Unconfigured demo store
    pub fn demo() -> Self {
        Self::unconfigured(StoreScope::Demo)
    }

    /// Unconfigured production store
    pub fn production() -> Self {
        Self::unconfigured(StoreScope::Production)
    }

    pub fn unconfigured(scope: StoreScope) -> Self {
        Self {
            scope,
            url: None,
            service_key: None,
            timeout_secs: default_timeout(),
        }
    }

    /// Store with both credentials set
    pub fn new(scope: StoreScope, url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            service_key: Some(service_key.into()),
            ..Self::unconfigured(scope)
        }
    }

    /// Check whether both URL and service key are present
    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
            && self
                .service_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty())
    }

    /// Validate configuration, returning which credential is missing
    pub fn validate(&self) -> Result<()> {
        if self.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
            return Err(Error::Config(format!(
                "live.{}.url is required to query the {} live store",
                self.scope, self.scope
            )));
        }
        if self
            .service_key
            .as_deref()
            .map_or(true, |k| k.trim().is_empty())
        {
            return Err(Error::Config(format!(
                "live.{}.service_key is required to query the {} live store",
                self.scope, self.scope
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(format!(
                "live.{}.timeout_secs must be greater than 0",
                self.scope
            )));
        }
        Ok(())
    }

    /// Overlay credentials from the environment
    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        let prefix = self.scope.env_prefix();
        if let Some(url) = lookup(&format!("{}_URL", prefix)) {
            self.url = Some(url);
        }
        if let Some(key) = lookup(&format!("{}_SERVICE_KEY", prefix)) {
            self.service_key = Some(key);
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path, then apply env overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        // Scope is implied by the table a store appears under
        config.live.demo.scope = StoreScope::Demo;
        config.live.production.scope = StoreScope::Production;
        Ok(config)
    }

    /// Overlay live store credentials using `lookup` for variable values
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.live.demo.apply_env(&lookup);
        self.live.production.apply_env(&lookup);
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/chatpulse/config.toml` (~/.config/chatpulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("chatpulse").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/chatpulse/` (~/.local/state/chatpulse/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("chatpulse")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/chatpulse/chatpulse.log` (~/.local/state/chatpulse/chatpulse.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("chatpulse.log")
    }
}
