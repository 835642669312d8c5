use serde::Serialize;

use crate::error::LlmError;

/// One generation call against one model.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub system: Option<&'a str>,
}

impl<'a> GenerateRequest<'a> {
    #[must_use]
    pub fn new(model: &'a str, prompt: &'a str, system: Option<&'a str>) -> Self {
        Self {
            model,
            prompt,
            system,
        }
    }

    /// System message (when present) followed by the user prompt.
    pub(crate) fn messages(&self) -> Vec<Message<'a>> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system {
            messages.push(Message {
                role: Role::System,
                content: system,
            });
        }
        messages.push(Message {
            role: Role::User,
            content: self.prompt,
        });
        messages
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    System,
    User,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct Message<'a> {
    pub role: Role,
    pub content: &'a str,
}

/// Uniform text generation over wire-incompatible backends.
pub trait LlmProvider {
    /// Run one attempt. Retries and fallback live in [`crate::AiClient`].
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached, rejects the request,
    /// or replies with an unusable body.
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, LlmError>;

    fn name(&self) -> &'static str;
}
