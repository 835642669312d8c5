//! Failure classification and the pure retry/fallback policy.

use std::time::Duration;

use crate::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    NotFound,
    ServerError,
    /// Missing credentials: retrying cannot help.
    Configuration,
    Other,
}

impl FailureKind {
    /// Classify from the typed error first, then from text signals in the message.
    #[must_use]
    pub fn classify(err: &LlmError) -> Self {
        match err {
            LlmError::MissingApiKey { .. } => Self::Configuration,
            LlmError::Status { status: 429, .. } => Self::RateLimited,
            LlmError::Status { status: 404, .. } => Self::NotFound,
            LlmError::Status {
                status: 500 | 502 | 503 | 504,
                ..
            } => Self::ServerError,
            LlmError::Http(e) if e.status().is_some_and(|s| s.as_u16() == 429) => {
                Self::RateLimited
            }
            other => Self::from_message(&other.to_string()),
        }
    }

    #[must_use]
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("429") || lower.contains("rate") {
            Self::RateLimited
        } else if lower.contains("404") || lower.contains("not found") {
            Self::NotFound
        } else if ["500", "502", "503", "504"]
            .iter()
            .any(|code| lower.contains(code))
        {
            Self::ServerError
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Sleep for the delay, then try the same model again.
    RetrySame(Duration),
    AdvanceModel,
    Fail,
}

/// Decide what follows a failed attempt.
///
/// `attempt` is zero-based; `max_retries` is the number of tries each model
/// gets. When a model has no tries left the policy advances instead of
/// sleeping for a retry that will never happen.
#[must_use]
pub fn next_action(
    kind: FailureKind,
    attempt: u32,
    max_retries: u32,
    retry_delay: Duration,
) -> RetryAction {
    let tries_left = attempt.saturating_add(1) < max_retries;
    let step = attempt.saturating_add(1);
    match kind {
        FailureKind::Configuration => RetryAction::Fail,
        FailureKind::NotFound => RetryAction::AdvanceModel,
        FailureKind::RateLimited if tries_left => {
            RetryAction::RetrySame(retry_delay.saturating_mul(step).saturating_mul(2))
        }
        FailureKind::ServerError if tries_left => {
            RetryAction::RetrySame(retry_delay.saturating_mul(step))
        }
        FailureKind::Other if tries_left => RetryAction::RetrySame(retry_delay),
        _ => RetryAction::AdvanceModel,
    }
}
