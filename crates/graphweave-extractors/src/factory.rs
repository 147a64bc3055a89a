//! Factory for creating extractors.

use std::path::Path;
use std::sync::Arc;

use graphweave_core::config::{Mode, PipelineConfig};
use graphweave_core::error::WeaveResult;
use graphweave_core::traits::{Extractor, Llm};
use graphweave_llm::LlmFactory;

use crate::gold::GoldStandardExtractor;
use crate::llm::LlmExtractor;

/// Factory for creating extractors.
pub struct ExtractorFactory;

impl ExtractorFactory {
    /// Create the extractor selected by `config.mode`.
    ///
    /// Mock mode loads the gold standard dataset. Live mode validates the
    /// configuration first, so a missing API key fails before any chunk runs.
    pub fn from_config(config: &PipelineConfig) -> WeaveResult<Arc<dyn Extractor>> {
        match config.mode {
            Mode::Mock => Self::gold_standard(&config.gold_standard_path),
            Mode::Live => {
                config.validate()?;
                let llm = LlmFactory::from_config(&config.llm)?;
                tracing::info!(
                    provider = ?config.llm.provider,
                    model = llm.model_name(),
                    "Using LLM extractor"
                );
                Ok(Self::llm(llm))
            }
        }
    }

    /// Create a gold standard extractor from a dataset file.
    pub fn gold_standard(path: impl AsRef<Path>) -> WeaveResult<Arc<dyn Extractor>> {
        Ok(Arc::new(GoldStandardExtractor::from_path(path)?))
    }

    /// Create an LLM extractor around an existing provider.
    pub fn llm(llm: Arc<dyn Llm>) -> Arc<dyn Extractor> {
        Arc::new(LlmExtractor::new(llm))
    }
}
