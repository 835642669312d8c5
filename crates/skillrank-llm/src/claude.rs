use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::LlmError;
use crate::http::send_json;
use crate::provider::{GenerateRequest, LlmProvider};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API.
#[derive(Clone)]
pub struct ClaudeProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl fmt::Debug for ClaudeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaudeProvider")
            .field("client", &"<reqwest::blocking::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl ClaudeProvider {
    #[must_use]
    pub fn new(config: &AiConfig, client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout(),
        }
    }
}

impl LlmProvider for ClaudeProvider {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::MissingApiKey {
                provider: "anthropic",
            });
        }

        let messages = [ApiMessage {
            role: "user",
            content: request.prompt,
        }];
        let body = RequestBody {
            model: request.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: request.system,
            messages: &messages,
        };

        let builder = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let resp: ApiResponse = send_json(builder, self.timeout)?;
        resp.content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or(LlmError::EmptyResponse {
                provider: "anthropic",
            })
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

#[derive(Serialize)]
struct RequestBody<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [ApiMessage<'a>],
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}
