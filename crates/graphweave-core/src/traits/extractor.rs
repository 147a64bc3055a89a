//! Extractor trait.

use async_trait::async_trait;

use crate::error::WeaveResult;
use crate::types::{Chunk, ExtractionRecord};

/// Turns a chunk of text into an [`ExtractionRecord`].
///
/// Implementations may call out to an LLM or look the chunk up in a fixed
/// dataset. The returned record's `chunk_id` must equal `chunk.id`.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract entity, relationship and event mentions from a chunk.
    async fn extract(&self, chunk: &Chunk) -> WeaveResult<ExtractionRecord>;

    /// Human-readable name for this extractor.
    fn name(&self) -> &str;
}
