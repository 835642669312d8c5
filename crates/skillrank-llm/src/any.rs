use crate::claude::ClaudeProvider;
use crate::cli::CliProvider;
use crate::config::{AiConfig, ProviderKind};
use crate::error::LlmError;
#[cfg(any(test, feature = "mock"))]
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;
use crate::provider::{GenerateRequest, LlmProvider};

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given expression for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::OpenAi($p) => $expr,
            AnyProvider::Claude($p) => $expr,
            AnyProvider::Ollama($p) => $expr,
            AnyProvider::Cli($p) => $expr,
            #[cfg(any(test, feature = "mock"))]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

#[derive(Debug, Clone)]
pub enum AnyProvider {
    OpenAi(OpenAiProvider),
    Claude(ClaudeProvider),
    Ollama(OllamaProvider),
    Cli(CliProvider),
    #[cfg(any(test, feature = "mock"))]
    Mock(MockProvider),
}

impl AnyProvider {
    /// Select the provider variant named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &AiConfig) -> Result<Self, LlmError> {
        if config.provider == ProviderKind::ClaudeCli {
            return Ok(Self::Cli(CliProvider::from_config(config)));
        }

        let client = crate::http::default_client(config.timeout())?;
        Ok(match config.provider {
            ProviderKind::Anthropic => Self::Claude(ClaudeProvider::new(config, client)),
            ProviderKind::Ollama => Self::Ollama(OllamaProvider::new(config, client)),
            ProviderKind::OpenAi
            | ProviderKind::OpenRouter
            | ProviderKind::Custom
            | ProviderKind::ClaudeCli => Self::OpenAi(OpenAiProvider::new(config, client)),
        })
    }
}

impl LlmProvider for AnyProvider {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, LlmError> {
        delegate_provider!(self, |p| p.generate(request))
    }

    fn name(&self) -> &'static str {
        delegate_provider!(self, |p| p.name())
    }
}
