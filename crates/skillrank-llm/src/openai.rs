use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{AiConfig, ProviderKind};
use crate::error::LlmError;
use crate::http::send_json;
use crate::provider::{GenerateRequest, LlmProvider, Message};

const OPENROUTER_REFERER: &str = "https://crates.io/crates/skillrank";
const OPENROUTER_TITLE: &str = "skillrank index generator";

/// OpenAI chat-completions wire format; also serves OpenRouter and custom
/// compatible endpoints.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::blocking::Client,
    kind: ProviderKind,
    api_key: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("client", &"<reqwest::blocking::Client>")
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(config: &AiConfig, client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            kind: config.provider,
            api_key: config.api_key.clone(),
            base_url: config.base_url(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout(),
        }
    }
}

impl LlmProvider for OpenAiProvider {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, LlmError> {
        if self.api_key.is_empty() && self.kind.requires_api_key() {
            return Err(LlmError::MissingApiKey {
                provider: self.kind.as_str(),
            });
        }

        let messages = request.messages();
        let body = ChatRequest {
            model: request.model,
            messages: &messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);
        if !self.api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        }
        if self.kind == ProviderKind::OpenRouter {
            builder = builder
                .header("HTTP-Referer", OPENROUTER_REFERER)
                .header("X-Title", OPENROUTER_TITLE);
        }

        let resp: ChatResponse = send_json(builder, self.timeout)?;
        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse {
                provider: self.kind.as_str(),
            })
    }

    fn name(&self) -> &'static str {
        self.kind.as_str()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message<'a>],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{default_client, test_server};

    fn provider(kind: ProviderKind, base_url: &str, api_key: &str) -> OpenAiProvider {
        let config = AiConfig {
            provider: kind,
            api_key: api_key.into(),
            base_url: Some(base_url.into()),
            ..AiConfig::default()
        };
        OpenAiProvider::new(&config, default_client(Duration::from_secs(5)).unwrap())
    }

    #[test]
    fn sends_chat_completion_and_reads_first_choice() {
        let (url, rx, handle) = test_server::spawn(vec![test_server::json_response(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#,
        )]);
        let p = provider(ProviderKind::OpenAi, &url, "sk-test");

        let text = p
            .generate(&GenerateRequest::new("gpt-4o-mini", "hi", Some("be brief")))
            .unwrap();
        handle.join().unwrap();
        assert_eq!(text, "hello");

        let captured = rx.recv().unwrap();
        assert_eq!(captured.request_line, "POST /chat/completions HTTP/1.1");
        assert_eq!(captured.header("authorization"), Some("Bearer sk-test"));
        let body: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[test]
    fn openrouter_adds_attribution_headers() {
        let (url, rx, handle) = test_server::spawn(vec![test_server::json_response(
            "200 OK",
            r#"{"choices":[{"message":{"content":"ok"}}]}"#,
        )]);
        let p = provider(ProviderKind::OpenRouter, &url, "key");
        p.generate(&GenerateRequest::new("m", "p", None)).unwrap();
        handle.join().unwrap();

        let captured = rx.recv().unwrap();
        assert_eq!(captured.header("x-title"), Some(OPENROUTER_TITLE));
        assert!(captured.header("http-referer").is_some());
    }

    #[test]
    fn custom_endpoint_works_without_key() {
        let (url, rx, handle) = test_server::spawn(vec![test_server::json_response(
            "200 OK",
            r#"{"choices":[{"message":{"content":"local"}}]}"#,
        )]);
        let p = provider(ProviderKind::Custom, &url, "");
        assert_eq!(p.generate(&GenerateRequest::new("m", "p", None)).unwrap(), "local");
        handle.join().unwrap();
        assert!(rx.recv().unwrap().header("authorization").is_none());
    }

    #[test]
    fn missing_key_fails_before_network() {
        let p = provider(ProviderKind::OpenAi, "http://127.0.0.1:9", "");
        let err = p.generate(&GenerateRequest::new("m", "p", None)).unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey { provider: "openai" }));
    }

    #[test]
    fn not_found_status_is_reported() {
        let (url, _rx, handle) = test_server::spawn(vec![test_server::json_response(
            "404 Not Found",
            r#"{"error":{"message":"model not found"}}"#,
        )]);
        let p = provider(ProviderKind::OpenAi, &url, "k");
        let err = p.generate(&GenerateRequest::new("m", "p", None)).unwrap_err();
        handle.join().unwrap();
        assert!(matches!(err, LlmError::Status { status: 404, .. }));
    }

    #[test]
    fn empty_choices_is_empty_response() {
        let (url, _rx, handle) =
            test_server::spawn(vec![test_server::json_response("200 OK", r#"{"choices":[]}"#)]);
        let p = provider(ProviderKind::OpenAi, &url, "k");
        let err = p.generate(&GenerateRequest::new("m", "p", None)).unwrap_err();
        handle.join().unwrap();
        assert!(matches!(err, LlmError::EmptyResponse { .. }));
    }

    #[test]
    fn debug_redacts_api_key() {
        let p = provider(ProviderKind::OpenAi, "http://x", "sk-secret");
        assert!(!format!("{p:?}").contains("sk-secret"));
    }
}
