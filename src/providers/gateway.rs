/*!
 * Provider gateway.
 *
 * Maps the provider names a client sends ("deepseek", "qwen") to the
 * endpoint, credential and model of a configured provider. Unknown names
 * fall back to the configured default provider instead of failing.
 */

use log::debug;

use crate::app_config::{ProviderConfig, ProvidersConfig};

/// Connection parameters for one remote chat-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProvider {
    /// Name of the provider that was actually selected
    pub name: String,
    /// Base URL of the API
    pub endpoint: String,
    /// Bearer credential
    pub api_key: String,
    /// Model identifier
    pub model: String,
}

impl From<&ProviderConfig> for ResolvedProvider {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            name: config.name.clone(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

/// Stateless lookup over the provider table
#[derive(Debug, Clone)]
pub struct ProviderGateway {
    providers: Vec<ProviderConfig>,
    default_provider: String,
}

impl ProviderGateway {
    /// Build a gateway from the providers section of the configuration
    pub fn new(config: &ProvidersConfig) -> Self {
        Self {
            providers: config.available_providers.clone(),
            default_provider: config.default_provider.clone(),
        }
    }

    /// Resolve a provider name, falling back to the default provider
    pub fn resolve(&self, name: &str) -> ResolvedProvider {
        if let Some(config) = self.find(name) {
            return config.into();
        }

        debug!(
            "Unknown provider '{}', falling back to '{}'",
            name, self.default_provider
        );
        match self.find(&self.default_provider).or_else(|| self.providers.first()) {
            Some(config) => config.into(),
            // Only reachable with an empty table, which validation rejects
            None => (&ProviderConfig::deepseek()).into(),
        }
    }

    /// Name of the fallback provider
    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    /// Names of all configured providers
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name.as_str()).collect()
    }

    fn find(&self, name: &str) -> Option<&ProviderConfig> {
        let name = name.trim();
        self.providers
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}
