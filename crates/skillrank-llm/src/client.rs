use std::sync::Arc;
use std::time::Duration;

use crate::any::AnyProvider;
use crate::clock::{Clock, SystemClock};
use crate::config::AiConfig;
use crate::error::LlmError;
use crate::provider::{GenerateRequest, LlmProvider};
use crate::rate_limit::RateLimiter;
use crate::retry::{FailureKind, RetryAction, next_action};

const CONNECTION_TEST_PROMPT: &str = "Say 'Hello!' in one word.";

/// Rate-limited client that walks the candidate model list with per-model retries.
///
/// Attempts are strictly sequential: every retry for model *i* completes before
/// model *i + 1* is contacted, and the rate limiter gates each attempt.
#[derive(Debug)]
pub struct AiClient {
    provider: AnyProvider,
    models: Vec<String>,
    max_retries: u32,
    retry_delay: Duration,
    limiter: RateLimiter,
    clock: Arc<dyn Clock>,
}

impl AiClient {
    /// Build a client for the configured provider on the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's HTTP client cannot be constructed.
    pub fn new(config: &AiConfig) -> Result<Self, LlmError> {
        let provider = AnyProvider::from_config(config)?;
        Ok(Self::with_provider(provider, config, Arc::new(SystemClock)))
    }

    #[must_use]
    pub fn with_provider(provider: AnyProvider, config: &AiConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            models: config.candidate_models(),
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay(),
            limiter: RateLimiter::new(config.rate_limit_rpm, config.min_delay(), clock.clone()),
            clock,
        }
    }

    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Candidate models in the order they are tried.
    #[must_use]
    pub fn models(&self) -> &[String] {
        &self.models
    }

    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Generate text, retrying and falling back across models.
    ///
    /// # Errors
    ///
    /// Returns the configuration error unchanged when credentials are missing,
    /// otherwise `LlmError::AllModelsFailed` carrying the last failure once
    /// every model is exhausted.
    pub fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, LlmError> {
        let mut last_error = None;

        'models: for (index, model) in self.models.iter().enumerate() {
            if index > 0 {
                tracing::info!(model = %model, "switching to fallback model");
            }

            for attempt in 0..self.max_retries {
                self.limiter.wait_if_needed();

                let request = GenerateRequest::new(model, prompt, system);
                let err = match self.provider.generate(&request) {
                    Ok(text) => {
                        tracing::debug!(model = %model, attempt = attempt + 1, "generation succeeded");
                        return Ok(text);
                    }
                    Err(err) => err,
                };

                let kind = FailureKind::classify(&err);
                tracing::warn!(
                    model = %model,
                    attempt = attempt + 1,
                    max_retries = self.max_retries,
                    ?kind,
                    "generation failed: {err}"
                );

                match next_action(kind, attempt, self.max_retries, self.retry_delay) {
                    RetryAction::RetrySame(delay) => {
                        last_error = Some(err);
                        self.clock.sleep(delay);
                    }
                    RetryAction::AdvanceModel => {
                        last_error = Some(err);
                        continue 'models;
                    }
                    RetryAction::Fail => return Err(err),
                }
            }
        }

        Err(LlmError::AllModelsFailed {
            last: Box::new(
                last_error.unwrap_or_else(|| LlmError::Other("no models configured".into())),
            ),
        })
    }

    /// Send a trivial prompt to confirm the provider answers.
    ///
    /// # Errors
    ///
    /// Propagates the failure from [`AiClient::generate`].
    pub fn test_connection(&self) -> Result<String, LlmError> {
        self.generate(CONNECTION_TEST_PROMPT, None)
    }
}
