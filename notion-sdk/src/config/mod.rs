//! Configuration management for service clients
//!
//! This module provides utilities for loading and validating configuration
//! for the Notion client, with support for environment variables.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::util::parse_duration;

/// Result type for configuration lookups
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value.parse::<i64>().map_err(|e| ConfigError::invalid(key, e))
    }

    /// Get a duration configuration value ("30s", "500ms", "2m", or bare seconds)
    fn get_duration(&self, key: &str) -> Result<Duration> {
        let value = self.get_string(key)?;
        parse_duration(&value)
            .ok_or_else(|| ConfigError::invalid(key, format!("not a duration: {}", value)))
    }

    /// Get a string configuration value with a default.
    ///
    /// Only a missing key falls back to the default; an unreadable value is an error.
    fn get_string_or(&self, key: &str, default: &str) -> Result<String> {
        match self.get_string(key) {
            Err(ConfigError::Missing(_)) => Ok(default.to_string()),
            other => other,
        }
    }

    /// Get a duration configuration value with a default.
    ///
    /// Only a missing key falls back to the default; a malformed value is an error.
    fn get_duration_or(&self, key: &str, default: Duration) -> Result<Duration> {
        match self.get_duration(key) {
            Err(ConfigError::Missing(_)) => Ok(default),
            other => other,
        }
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,

    /// Optional namespace for variables
    namespace: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set a namespace for environment variables
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        if let Some(ref namespace) = self.namespace {
            env_key.push_str(namespace);
            env_key.push('_');
        }

        // Uppercase, non-alphanumerics become underscores
        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => ConfigError::missing(env_key),
            env::VarError::NotUnicode(_) => ConfigError::invalid(env_key, "not valid unicode"),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::missing(key))
    }
}

/// Global default configuration provider: unprefixed environment variables
/// (`NOTION_API_TOKEN`, `NOTION_BASE_URL`, ...)
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new()));

/// Trait for service-specific configuration
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;

    /// Service name
    fn service_name(&self) -> &str;
}

/// Default Notion API root
pub const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com/v1";

/// Notion API version sent with every request
pub const DEFAULT_NOTION_VERSION: &str = "2021-05-13";

/// Configuration for the Notion API
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotionConfig {
    /// Integration token
    pub api_token: String,

    /// Root URL the request paths are appended to
    pub base_url: String,

    /// Value of the `Notion-Version` header
    pub notion_version: String,

    /// Per-request timeout applied by the HTTP client
    pub timeout: Duration,
}

impl Debug for NotionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionConfig")
            .field("api_token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("notion_version", &self.notion_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            base_url: DEFAULT_NOTION_BASE_URL.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl NotionConfig {
    /// Configuration with the given token and default settings
    pub fn with_token(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let api_token = provider.get_string("notion_api_token")?;
        let base_url = provider.get_string_or("notion_base_url", DEFAULT_NOTION_BASE_URL)?;
        let notion_version = provider.get_string_or("notion_version", DEFAULT_NOTION_VERSION)?;
        let timeout = provider.get_duration_or("notion_timeout", Duration::from_secs(30))?;

        let config = Self {
            api_token,
            base_url,
            notion_version,
            timeout,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from [`DEFAULT_PROVIDER`]
    pub fn from_env() -> Result<Self> {
        Self::from_provider(&**DEFAULT_PROVIDER)
    }
}

impl ServiceConfig for NotionConfig {
    fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            return Err(ConfigError::missing("notion_api_token"));
        }

        if self.base_url.is_empty() {
            return Err(ConfigError::invalid("notion_base_url", "must not be empty"));
        }

        if self.notion_version.is_empty() {
            return Err(ConfigError::invalid("notion_version", "must not be empty"));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "notion"
    }
}
