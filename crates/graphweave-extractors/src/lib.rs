//! graphweave-extractors - Extraction record producers for graphweave.
//!
//! Two extractors implement [`graphweave_core::Extractor`]:
//!
//! - [`GoldStandardExtractor`] replays a fixed dataset keyed `chunk_{id}` (mock mode)
//! - [`LlmExtractor`] prompts an LLM for JSON and parses it leniently (live mode)
//!
//! # Example
//!
//! ```ignore
//! use graphweave_core::PipelineConfig;
//! use graphweave_extractors::ExtractorFactory;
//!
//! let config = PipelineConfig::from_env()?;
//! let extractor = ExtractorFactory::from_config(&config)?;
//! let record = extractor.extract(&chunk).await?;
//! ```

mod factory;
mod gold;
mod llm;

pub use factory::ExtractorFactory;
pub use gold::GoldStandardExtractor;
pub use llm::LlmExtractor;

// Re-export core types for convenience
pub use graphweave_core::traits::Extractor;
pub use graphweave_core::types::{Chunk, ExtractionRecord};
