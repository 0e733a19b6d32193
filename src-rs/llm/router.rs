use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::types::{CompletionRequest, LLMResponse, ProviderAdapter, ProviderError};

/// Routes completions to the provider selected at startup, applying the
/// per-query timeout and the retry budget.
pub struct LLMRouter {
    adapter: Arc<dyn ProviderAdapter>,
    retries: u32,
    timeout: Duration,
    backoff: Duration,
}

impl LLMRouter {
    pub fn new(adapter: Arc<dyn ProviderAdapter>) -> Self {
        Self {
            adapter,
            retries: 2,
            timeout: Duration::from_secs(60),
            backoff: Duration::from_millis(500),
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Worst case for one `complete` call: every attempt times out and
    /// every backoff is slept.
    pub fn budget(&self) -> Duration {
        let attempts = self.retries + 1;
        let backoff_steps = self.retries * attempts / 2;
        self.timeout * attempts + self.backoff * backoff_steps
    }

    pub fn provider_name(&self) -> &'static str {
        self.adapter.name()
    }

    pub fn accepts_image_urls(&self) -> bool {
        self.adapter.accepts_image_urls()
    }

    pub async fn complete(&self, request: CompletionRequest) -> Result<LLMResponse, ProviderError> {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.timeout, self.adapter.complete(request.clone())).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::timeout(self.timeout)),
            };
            match result {
                Ok(resp) => return Ok(resp),
                Err(err) if err.retryable && attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        provider = self.adapter.name(),
                        attempt,
                        retries = self.retries,
                        "model query failed, retrying: {}",
                        err
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
