//! Test doubles: a scripted provider and a manually advanced clock.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::error::LlmError;
use crate::provider::{GenerateRequest, LlmProvider};

#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Behaves like an HTTP error response.
    Status(u16, String),
    Fail(String),
}

impl MockReply {
    fn into_result(self) -> Result<String, LlmError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Status(status, body) => Err(LlmError::Status { status, body }),
            Self::Fail(msg) => Err(LlmError::Other(msg)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub model: String,
    pub prompt: String,
    pub system: Option<String>,
}

/// Replies come from a per-model override first, then the script queue, then
/// `default_reply`. Clones share state, so a test can keep a handle after
/// moving the provider into a client.
#[derive(Debug, Clone)]
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<MockReply>>>,
    by_model: Arc<Mutex<HashMap<String, MockReply>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    pub default_reply: MockReply,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            script: Arc::default(),
            by_model: Arc::default(),
            calls: Arc::default(),
            default_reply: MockReply::Text("mock response".into()),
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            script: Arc::new(Mutex::new(replies.into())),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_model_reply(self, model: &str, reply: MockReply) -> Self {
        self.by_model
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(model.to_owned(), reply);
        self
    }

    #[must_use]
    pub fn with_default(mut self, reply: MockReply) -> Self {
        self.default_reply = reply;
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn models_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.model).collect()
    }
}

impl LlmProvider for MockProvider {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MockCall {
                model: request.model.to_owned(),
                prompt: request.prompt.to_owned(),
                system: request.system.map(str::to_owned),
            });

        let fixed = self
            .by_model
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(request.model)
            .cloned();
        let reply = fixed
            .or_else(|| {
                self.script
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front()
            })
            .unwrap_or_else(|| self.default_reply.clone());
        reply.into_result()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Clock whose time only moves on `sleep` or `advance`. Every sleep is recorded.
#[derive(Debug)]
pub struct MockClock {
    start: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Non-zero sleeps in call order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        self.advance(duration);
    }
}
