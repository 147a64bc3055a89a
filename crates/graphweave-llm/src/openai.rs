//! OpenAI chat completions provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use graphweave_core::config::LlmProvider;
use graphweave_core::error::{WeaveError, WeaveResult};
use graphweave_core::traits::{
    GenerationOptions, Llm, LlmConfig, LlmResponse, ResponseFormat, TokenUsage,
};
use graphweave_core::types::Message;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// OpenAI LLM provider.
pub struct OpenAiLlm {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ChatResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

impl OpenAiLlm {
    /// Create a new OpenAI LLM provider.
    pub fn new(config: LlmConfig) -> WeaveResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(LlmProvider::OpenAI.api_key_var()).ok())
            .ok_or_else(|| {
                WeaveError::Configuration("OpenAI API key not found. Set OPENAI_API_KEY environment variable or provide api_key in config.".to_string())
            })?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse()
                .map_err(|_| WeaveError::Configuration("Invalid API key format".to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| WeaveError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| OPENAI_API_URL.to_string());

        let mut config = config;
        if config.model.is_empty() {
            config.model = LlmProvider::OpenAI.default_model().to_string();
        }

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn build_request(&self, messages: &[Message], options: &GenerationOptions) -> ChatRequest {
        let response_format = match options.response_format {
            Some(ResponseFormat::Json) => Some(ChatResponseFormat {
                format_type: "json_object",
            }),
            _ => None,
        };

        ChatRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: options.temperature.unwrap_or(self.config.temperature),
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            response_format,
        }
    }
}

fn parse_response(body: &str) -> WeaveResult<LlmResponse> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| WeaveError::llm(format!("Failed to parse response: {}", e)))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content);

    let usage = response.usage.map(|u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(LlmResponse { content, usage })
}

#[async_trait]
impl Llm for OpenAiLlm {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> WeaveResult<LlmResponse> {
        let options = options.unwrap_or_default();
        let request = self.build_request(messages, &options);

        tracing::debug!(model = %self.config.model, "Sending chat completion request");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| WeaveError::llm(format!("OpenAI API request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WeaveError::llm(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let error: Result<OpenAiError, _> = serde_json::from_str(&body);
            let message = error
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.clone());
            return Err(WeaveError::llm(format!(
                "OpenAI API error ({}): {}",
                status, message
            )));
        }

        parse_response(&body)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm() -> OpenAiLlm {
        OpenAiLlm::new(LlmConfig {
            model: "gpt-4o".to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_request_shape() {
        let options = GenerationOptions {
            temperature: Some(0.2),
            response_format: Some(ResponseFormat::Json),
            ..Default::default()
        };
        let request = llm().build_request(
            &[Message::system("Extract."), Message::user("text")],
            &options,
        );
        let value = serde_json::to_value(request).unwrap();

        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["response_format"]["type"], "json_object");
        assert!((value["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"entities\": []}"}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7}
        }"#;
        let response = parse_response(body).unwrap();
        assert_eq!(response.content_or_empty(), "{\"entities\": []}");
        assert_eq!(response.usage.unwrap().completion_tokens, 4);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let response = parse_response(r#"{"choices": []}"#).unwrap();
        assert!(response.content.is_none());
    }
}
