/*!
 * Mock completion client for testing.
 *
 * This module provides a client that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with a tagged echo of the input
 * - `MockProvider::failing()` - Always fails with an API error
 * - `MockProvider::fail_when_contains(..)` - Fails only for matching user content
 *
 * Delays can be fixed, random, or computed per request, which lets tests
 * force out-of-order completion.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{CompletionClient, CompletionRequest, ResolvedProvider};
use crate::errors::ProviderError;

/// Prefix the working mock puts in front of every reply
pub const MOCK_REPLY_PREFIX: &str = "[TRANSLATED]";

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always fails with an error
    Failing,
    /// Fails when the user content contains the needle
    FailWhenContains(&'static str),
    /// Fails when the system prompt contains the needle
    FailWhenSystemContains(&'static str),
    /// Returns an empty reply
    Empty,
}

/// How long each call waits before answering
#[derive(Debug, Clone, Copy)]
pub enum MockDelay {
    /// Answer immediately
    None,
    /// Same delay for every call
    Fixed(u64),
    /// Uniformly random delay in `0..=max_ms`
    Jitter { max_ms: u64 },
    /// Delay computed from the request
    PerRequest(fn(&CompletionRequest) -> u64),
}

/// A recorded call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Provider name the call was routed to
    pub provider: String,
    /// The request
    pub request: CompletionRequest,
}

/// Mock client for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    delay: MockDelay,
    request_count: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    custom_response: Option<fn(&CompletionRequest) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: MockDelay::None,
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Fail only requests whose user content contains `needle`
    pub fn fail_when_contains(needle: &'static str) -> Self {
        Self::new(MockBehavior::FailWhenContains(needle))
    }

    /// Fail only requests whose system prompt contains `needle`
    pub fn fail_when_system_contains(needle: &'static str) -> Self {
        Self::new(MockBehavior::FailWhenSystemContains(needle))
    }

    /// Create a mock that returns empty replies
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Set the delay policy
    pub fn with_delay(mut self, delay: MockDelay) -> Self {
        self.delay = delay;
        self
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&CompletionRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of calls received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Snapshot of the recorded calls
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    fn delay_for(&self, request: &CompletionRequest) -> u64 {
        match self.delay {
            MockDelay::None => 0,
            MockDelay::Fixed(ms) => ms,
            MockDelay::Jitter { max_ms } => rand::rng().random_range(0..=max_ms),
            MockDelay::PerRequest(f) => f(request),
        }
    }

    fn reply(&self, request: &CompletionRequest) -> String {
        match self.custom_response {
            Some(generator) => generator(request),
            None => format!("{} {}", MOCK_REPLY_PREFIX, request.user_content),
        }
    }

    fn simulated_error() -> ProviderError {
        ProviderError::ApiError {
            status_code: 500,
            message: "Simulated API error".to_string(),
        }
    }
}

#[async_trait]
impl CompletionClient for MockProvider {
    async fn complete(
        &self,
        provider: &ResolvedProvider,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(RecordedCall {
            provider: provider.name.clone(),
            request: request.clone(),
        });

        let delay_ms = self.delay_for(request);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        match self.behavior {
            MockBehavior::Working => Ok(self.reply(request)),
            MockBehavior::Failing => Err(Self::simulated_error()),
            MockBehavior::FailWhenContains(needle) => {
                if request.user_content.contains(needle) {
                    Err(Self::simulated_error())
                } else {
                    Ok(self.reply(request))
                }
            }
            MockBehavior::FailWhenSystemContains(needle) => {
                if request.system_prompt.contains(needle) {
                    Err(Self::simulated_error())
                } else {
                    Ok(self.reply(request))
                }
            }
            MockBehavior::Empty => Ok(String::new()),
        }
    }
}
