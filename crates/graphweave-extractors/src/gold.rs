//! Gold standard extractor backed by a fixed JSON dataset.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;

use graphweave_core::error::{ErrorCode, WeaveError, WeaveResult};
use graphweave_core::traits::Extractor;
use graphweave_core::types::{Chunk, ExtractionRecord, ParseMode};

/// Replays pre-extracted records keyed `chunk_{id}`.
///
/// Entries are parsed strictly: a gold record with a mention missing its
/// name or type fails that chunk instead of being silently trimmed.
#[derive(Debug, Clone, Default)]
pub struct GoldStandardExtractor {
    records: Map<String, Value>,
}

impl GoldStandardExtractor {
    /// Load the dataset from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> WeaveResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| WeaveError::Extraction {
            message: format!("Failed to read gold standard {}: {}", path.display(), e),
            code: ErrorCode::ExtSourceUnavailable,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| {
            WeaveError::parse(format!(
                "Failed to parse gold standard {}: {}",
                path.display(),
                e
            ))
        })?;

        let extractor = Self::from_value(value)?;
        tracing::info!(
            path = %path.display(),
            records = extractor.len(),
            "Loaded gold standard"
        );
        Ok(extractor)
    }

    /// Build from an already parsed JSON object.
    pub fn from_value(value: Value) -> WeaveResult<Self> {
        match value {
            Value::Object(records) => Ok(Self { records }),
            _ => Err(WeaveError::parse("gold standard must be a JSON object")),
        }
    }

    /// Dataset key for a chunk id.
    pub fn key_for(chunk_id: &str) -> String {
        format!("chunk_{}", chunk_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl Extractor for GoldStandardExtractor {
    async fn extract(&self, chunk: &Chunk) -> WeaveResult<ExtractionRecord> {
        let key = Self::key_for(&chunk.id);
        match self.records.get(&key) {
            Some(value) => ExtractionRecord::from_json(chunk.id.clone(), value, ParseMode::Strict),
            None => {
                tracing::warn!(chunk_id = %chunk.id, key = %key, "No gold standard entry for chunk");
                Ok(ExtractionRecord::new(chunk.id.clone()))
            }
        }
    }

    fn name(&self) -> &str {
        "gold_standard"
    }
}
