use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    OpenRouter,
    /// Any OpenAI-compatible endpoint; the API key is optional.
    Custom,
    Anthropic,
    Ollama,
    /// Delegates generation to the locally installed `claude` command.
    #[serde(rename = "claude")]
    ClaudeCli,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::OpenRouter => "openrouter",
            Self::Custom => "custom",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
            Self::ClaudeCli => "claude",
        }
    }

    #[must_use]
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi | Self::Custom => "https://api.openai.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::Anthropic => "https://api.anthropic.com",
            Self::Ollama => "http://localhost:11434",
            Self::ClaudeCli => "",
        }
    }

    #[must_use]
    pub fn default_model(self) -> &'static str {
        match self {
            Self::ClaudeCli => "haiku",
            _ => "gpt-4o-mini",
        }
    }

    /// Hosted providers refuse anonymous requests.
    #[must_use]
    pub fn requires_api_key(self) -> bool {
        matches!(self, Self::OpenAi | Self::OpenRouter | Self::Anthropic)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "openrouter" => Ok(Self::OpenRouter),
            "custom" => Ok(Self::Custom),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            "claude" => Ok(Self::ClaudeCli),
            other => Err(format!("unknown AI provider: {other}")),
        }
    }
}

/// Immutable snapshot of everything the AI client needs for one run.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AiConfig {
    pub provider: ProviderKind,
    #[serde(skip_serializing)]
    pub api_key: String,
    /// `None` selects the provider's default model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub fallback_models: Vec<String>,
    pub rate_limit_rpm: u32,
    pub rate_limit_delay_secs: f64,
    pub max_retries: u32,
    pub retry_delay_secs: f64,
    pub languages: Vec<String>,
    /// Program invoked by the `claude` provider.
    pub cli_program: String,
}

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("fallback_models", &self.fallback_models)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field("rate_limit_delay_secs", &self.rate_limit_delay_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("languages", &self.languages)
            .field("cli_program", &self.cli_program)
            .finish()
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: String::new(),
            model: None,
            base_url: None,
            max_tokens: 2000,
            temperature: 0.3,
            timeout_secs: 60,
            fallback_models: Vec::new(),
            rate_limit_rpm: 20,
            rate_limit_delay_secs: 0.5,
            max_retries: 3,
            retry_delay_secs: 2.0,
            languages: vec!["english".into()],
            cli_program: "claude".into(),
        }
    }
}

impl AiConfig {
    #[must_use]
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Configured base URL without trailing slashes, or the provider default.
    #[must_use]
    pub fn base_url(&self) -> String {
        let url = self
            .base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.provider.default_base_url());
        url.trim_end_matches('/').to_owned()
    }

    /// Primary model followed by the fallbacks, in the order they are tried.
    #[must_use]
    pub fn candidate_models(&self) -> Vec<String> {
        std::iter::once(self.model().to_owned())
            .chain(
                self.fallback_models
                    .iter()
                    .filter(|m| !m.is_empty())
                    .cloned(),
            )
            .collect()
    }

    /// Languages requested from the extractor; never empty.
    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        let langs: Vec<String> = self
            .languages
            .iter()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();
        if langs.is_empty() {
            vec!["english".into()]
        } else {
            langs
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    #[must_use]
    pub fn min_delay(&self) -> Duration {
        secs_f64(self.rate_limit_delay_secs)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        secs_f64(self.retry_delay_secs)
    }
}

/// Negative and non-finite values collapse to zero.
pub(crate) fn secs_f64(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or_default()
}
