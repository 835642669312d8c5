//! AI provider abstraction with rate limiting, retry, and model fallback.
//!
//! Every call is blocking and sequential: the only suspension points are the
//! [`RateLimiter`] gate and the outbound request itself.

pub mod any;
pub mod claude;
pub mod cli;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod rate_limit;
pub mod retry;

pub use any::AnyProvider;
pub use client::AiClient;
pub use clock::{Clock, SystemClock};
pub use config::{AiConfig, ProviderKind};
pub use error::LlmError;
pub use provider::{GenerateRequest, LlmProvider};
pub use rate_limit::RateLimiter;
pub use retry::{FailureKind, RetryAction};
