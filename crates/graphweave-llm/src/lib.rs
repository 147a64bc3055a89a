//! graphweave-llm - LLM provider implementations for graphweave.
//!
//! # Supported Providers
//!
//! - **Gemini** - `generateContent` with a JSON response MIME type (default)
//! - **OpenAI** - chat completions with `response_format: json_object`
//!
//! # Example
//!
//! ```ignore
//! use graphweave_llm::LlmFactory;
//!
//! // Reads GEMINI_API_KEY from the environment
//! let llm = LlmFactory::gemini()?;
//!
//! // Or with a specific model
//! let llm = LlmFactory::openai_with_model("gpt-4o")?;
//! ```

mod factory;
mod gemini;
mod openai;

pub use factory::LlmFactory;
pub use gemini::GeminiLlm;
pub use openai::OpenAiLlm;

// Re-export core types for convenience
pub use graphweave_core::config::LlmProvider;
pub use graphweave_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, ResponseFormat};
