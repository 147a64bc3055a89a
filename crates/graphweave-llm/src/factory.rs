//! Factory for creating LLM providers.

use std::sync::Arc;

use graphweave_core::config::{LlmProvider, LlmProviderConfig};
use graphweave_core::error::WeaveResult;
use graphweave_core::traits::{Llm, LlmConfig};

use crate::gemini::GeminiLlm;
use crate::openai::OpenAiLlm;

/// Factory for creating LLM providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create an LLM provider from the given configuration.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> WeaveResult<Arc<dyn Llm>> {
        match provider {
            LlmProvider::Gemini => {
                let llm = GeminiLlm::new(config)?;
                Ok(Arc::new(llm))
            }
            LlmProvider::OpenAI => {
                let llm = OpenAiLlm::new(config)?;
                Ok(Arc::new(llm))
            }
        }
    }

    /// Create an LLM provider from a provider configuration block.
    pub fn from_config(config: &LlmProviderConfig) -> WeaveResult<Arc<dyn Llm>> {
        Self::create(config.provider, config.config.clone())
    }

    /// Create a Gemini LLM provider with default configuration.
    pub fn gemini() -> WeaveResult<Arc<dyn Llm>> {
        Self::create(LlmProvider::Gemini, LlmConfig::default())
    }

    /// Create a Gemini LLM provider with a specific model.
    pub fn gemini_with_model(model: impl Into<String>) -> WeaveResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::Gemini, config)
    }

    /// Create an OpenAI LLM provider with default configuration.
    pub fn openai() -> WeaveResult<Arc<dyn Llm>> {
        Self::create(LlmProvider::OpenAI, LlmConfig::default())
    }

    /// Create an OpenAI LLM provider with a specific model.
    pub fn openai_with_model(model: impl Into<String>) -> WeaveResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::OpenAI, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_with_explicit_key() {
        let config = LlmConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        let gemini = LlmFactory::create(LlmProvider::Gemini, config.clone()).unwrap();
        assert_eq!(gemini.model_name(), "gemini-1.5-flash");
        assert!(gemini.supports_json_mode());

        let openai = LlmFactory::create(LlmProvider::OpenAI, config).unwrap();
        assert_eq!(openai.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_from_config_keeps_model() {
        let mut config = LlmProviderConfig::default();
        config.config.model = "gemini-2.0-flash".to_string();
        config.config.api_key = Some("k".to_string());
        let llm = LlmFactory::from_config(&config).unwrap();
        assert_eq!(llm.model_name(), "gemini-2.0-flash");
    }
}
