/*!
 * Provider-specific concurrency tuning.
 *
 * Sizes the worker pool of a batch from the provider's known rate limits.
 */

/// Provider-specific concurrency profile with tuned defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Maximum concurrent requests
    pub max_concurrent_requests: usize,
}

impl ProviderProfile {
    /// Get the profile for a provider name; unknown names get a conservative default
    pub fn for_provider(provider: &str) -> Self {
        let max_concurrent_requests = match provider.trim().to_lowercase().as_str() {
            // DeepSeek tolerates a fairly wide fan-out
            "deepseek" => 8,
            // DashScope throttles harder per key
            "qwen" => 5,
            _ => 4,
        };
        Self {
            max_concurrent_requests,
        }
    }

    /// Get effective concurrent requests, respecting any user override.
    /// Never less than one.
    pub fn effective_concurrent_requests(&self, user_override: Option<usize>) -> usize {
        user_override
            .unwrap_or(self.max_concurrent_requests)
            .max(1)
    }
}
