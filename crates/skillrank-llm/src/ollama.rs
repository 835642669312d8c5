use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::error::LlmError;
use crate::http::send_json;
use crate::provider::{GenerateRequest, LlmProvider, Message};

/// Local Ollama daemon, non-streaming `/api/chat`.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl OllamaProvider {
    #[must_use]
    pub fn new(config: &AiConfig, client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            base_url: config.base_url(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout(),
        }
    }
}

impl LlmProvider for OllamaProvider {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, LlmError> {
        let messages = request.messages();
        let body = ChatRequest {
            model: request.model,
            messages: &messages,
            stream: false,
            options: Options {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let builder = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body);
        let resp: ChatResponse = send_json(builder, self.timeout)?;
        resp.message
            .map(|m| m.content)
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyResponse { provider: "ollama" })
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message<'a>],
    stream: bool,
    options: Options,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use crate::http::{default_client, test_server};

    #[test]
    fn posts_non_streaming_chat() {
        let (url, rx, handle) = test_server::spawn(vec![test_server::json_response(
            "200 OK",
            r#"{"model":"llama3","message":{"role":"assistant","content":"done"},"done":true}"#,
        )]);
        let config = AiConfig {
            provider: ProviderKind::Ollama,
            base_url: Some(url),
            max_tokens: 512,
            ..AiConfig::default()
        };
        let p = OllamaProvider::new(&config, default_client(Duration::from_secs(5)).unwrap());
        let text = p
            .generate(&GenerateRequest::new("llama3", "hi", Some("sys")))
            .unwrap();
        handle.join().unwrap();
        assert_eq!(text, "done");

        let captured = rx.recv().unwrap();
        assert_eq!(captured.request_line, "POST /api/chat HTTP/1.1");
        let body: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 512);
        assert_eq!(body["messages"][0]["content"], "sys");
    }

    #[test]
    fn never_requires_api_key() {
        let (url, _rx, handle) = test_server::spawn(vec![test_server::json_response(
            "200 OK",
            r#"{"message":{"content":"ok"}}"#,
        )]);
        let config = AiConfig {
            provider: ProviderKind::Ollama,
            base_url: Some(url),
            ..AiConfig::default()
        };
        let p = OllamaProvider::new(&config, default_client(Duration::from_secs(5)).unwrap());
        assert_eq!(p.generate(&GenerateRequest::new("m", "p", None)).unwrap(), "ok");
        handle.join().unwrap();
    }
}
