#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("{provider} requires an API key")]
    MissingApiKey { provider: &'static str },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("process failed: {0}")]
    Process(String),

    #[error("All models failed. Last error: {last}")]
    AllModelsFailed { last: Box<LlmError> },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
