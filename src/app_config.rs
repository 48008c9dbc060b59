use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite database file, defaults to the user's data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Remote model providers
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Defaults applied to requests that leave a field out
    #[serde(default)]
    pub defaults: TranslationDefaults,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// HTTP server settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Connection parameters of one named provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    // @field: Logical provider name used by clients ("deepseek", "qwen", ...)
    pub name: String,

    // @field: Base URL of the OpenAI-compatible API
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,

    // @field: Environment variable overriding the endpoint
    #[serde(default)]
    pub endpoint_env: Option<String>,
}

impl ProviderConfig {
    // @returns: The built-in DeepSeek entry
    pub fn deepseek() -> Self {
        Self {
            name: "deepseek".to_string(),
            endpoint: "https://api.deepseek.com/v1".to_string(),
            api_key: String::new(),
            model: "deepseek-chat".to_string(),
            api_key_env: Some("DEEPSEEK_API_KEY".to_string()),
            endpoint_env: Some("DEEPSEEK_API_BASE".to_string()),
        }
    }

    // @returns: The built-in Qwen (DashScope compatible mode) entry
    pub fn qwen() -> Self {
        Self {
            name: "qwen".to_string(),
            endpoint: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            api_key: String::new(),
            model: "qwen-max-latest".to_string(),
            api_key_env: Some("QWEN_API_KEY".to_string()),
            endpoint_env: Some("QWEN_API_BASE".to_string()),
        }
    }

    /// Overlay values from the environment variables named by this entry.
    /// Unset or empty variables leave the file values untouched.
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = read_env(self.api_key_env.as_deref()) {
            self.api_key = value;
        }
        if let Some(value) = read_env(self.endpoint_env.as_deref()) {
            self.endpoint = value;
        }
    }
}

fn read_env(name: Option<&str>) -> Option<String> {
    let name = name?;
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Provider table plus request limits
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProvidersConfig {
    /// Name used when a request names an unknown provider
    #[serde(default = "default_provider_name")]
    pub default_provider: String,

    /// Available providers
    #[serde(default = "default_available_providers")]
    pub available_providers: Vec<ProviderConfig>,

    /// Upper bound on a single completion call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Overrides the per-provider concurrency profile when set
    #[serde(default)]
    pub max_concurrent_requests: Option<usize>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider_name(),
            available_providers: default_available_providers(),
            request_timeout_secs: default_request_timeout_secs(),
            max_concurrent_requests: None,
        }
    }
}

impl ProvidersConfig {
    /// Get a provider entry by name (case-insensitive)
    pub fn get_provider_config(&self, name: &str) -> Option<&ProviderConfig> {
        let name = name.trim();
        self.available_providers
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Timeout applied to every remote call
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Request defaults
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationDefaults {
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Target language label
    #[serde(default = "default_target_language")]
    pub target_language: String,
}

impl Default for TranslationDefaults {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            target_language: default_target_language(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

pub(crate) fn default_provider_name() -> String {
    "deepseek".to_string()
}

fn default_available_providers() -> Vec<ProviderConfig> {
    vec![ProviderConfig::deepseek(), ProviderConfig::qwen()]
}

fn default_request_timeout_secs() -> u64 {
    60
}

pub(crate) fn default_temperature() -> f32 {
    0.5
}

pub(crate) fn default_target_language() -> String {
    "中文".to_string()
}

impl Config {
    /// Load a configuration file, or write the defaults there when it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            serde_json::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            log::warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            let config_json = serde_json::to_string_pretty(&config)
                .context("Failed to serialize default config to JSON")?;
            std::fs::write(path, config_json)
                .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Overlay environment credentials onto every provider entry
    pub fn apply_env_overrides(&mut self) {
        for provider in &mut self.providers.available_providers {
            provider.apply_env_overrides();
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.providers.available_providers.is_empty() {
            return Err(anyhow!("At least one provider must be configured"));
        }

        if self
            .providers
            .get_provider_config(&self.providers.default_provider)
            .is_none()
        {
            return Err(anyhow!(
                "Default provider '{}' is not in the provider table",
                self.providers.default_provider
            ));
        }

        for provider in &self.providers.available_providers {
            if provider.endpoint.trim().is_empty() {
                return Err(anyhow!("Provider '{}' has no endpoint", provider.name));
            }
            url::Url::parse(&provider.endpoint)
                .with_context(|| format!("Provider '{}' has an invalid endpoint", provider.name))?;
        }

        if self.server.port == 0 {
            return Err(anyhow!("Server port must be non-zero"));
        }

        if !(0.0..=2.0).contains(&self.defaults.temperature) {
            return Err(anyhow!(
                "Temperature must be between 0 and 2, got {}",
                self.defaults.temperature
            ));
        }

        if self.providers.request_timeout_secs == 0 {
            return Err(anyhow!("Request timeout must be at least one second"));
        }

        if self.providers.max_concurrent_requests == Some(0) {
            return Err(anyhow!("max_concurrent_requests must be at least 1"));
        }

        Ok(())
    }

    /// Database location, falling back to the user's data directory
    pub fn resolved_database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => crate::database::DatabaseConnection::default_database_path(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            database_path: None,
            providers: ProvidersConfig::default(),
            defaults: TranslationDefaults::default(),
            log_level: LogLevel::default(),
        }
    }
}
