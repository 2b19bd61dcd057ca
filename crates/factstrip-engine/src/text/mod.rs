//! Text generation adapters used for analysis, mood and explanations.

mod openai;

use anyhow::{bail, Result};

pub use openai::{OpenAiChatProvider, DEFAULT_OPENAI_MODEL};

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.7,
            max_tokens: 600,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

pub trait TextProvider: Send + Sync {
    fn name(&self) -> &str;
    fn complete(&self, request: &ChatRequest) -> Result<String>;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Never reaches a service; every caller takes its fallback path.
pub struct OfflineTextProvider;

impl TextProvider for OfflineTextProvider {
    fn name(&self) -> &str {
        "offline"
    }

    fn complete(&self, _request: &ChatRequest) -> Result<String> {
        bail!("text generation is disabled (offline provider)")
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatRequest, OfflineTextProvider, TextProvider};

    #[test]
    fn builder_overrides_sampling() {
        let request = ChatRequest::new("sys", "user")
            .with_temperature(0.1)
            .with_max_tokens(80);
        assert_eq!(request.temperature, 0.1);
        assert_eq!(request.max_tokens, 80);
        assert_eq!(request.system, "sys");
    }

    #[test]
    fn offline_provider_always_errors() {
        let provider = OfflineTextProvider;
        assert!(provider.complete(&ChatRequest::new("a", "b")).is_err());
        assert!(!provider.is_configured());
    }
}
