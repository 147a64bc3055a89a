//! Input text chunks.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::{WeaveError, WeaveResult};

/// A chunk of source text to extract from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk id. Numeric ids in the input file are kept as their decimal text.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Chunk text.
    #[serde(default)]
    pub text: String,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s.trim().to_string(),
    })
}

/// Load chunks from a JSON array file.
pub fn load_chunks(path: impl AsRef<Path>) -> WeaveResult<Vec<Chunk>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let chunks: Vec<Chunk> = serde_json::from_str(&content).map_err(|e| {
        WeaveError::parse(format!(
            "Failed to parse chunks from {}: {}",
            path.display(),
            e
        ))
    })?;
    tracing::debug!(path = %path.display(), count = chunks.len(), "Loaded chunks");
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_numeric_and_string_ids() {
        let chunks: Vec<Chunk> = serde_json::from_str(
            r#"[{"id": 1, "text": "Swiggy was founded in 2014."}, {"id": " c-2 ", "text": ""}]"#,
        )
        .unwrap();
        assert_eq!(chunks[0].id, "1");
        assert_eq!(chunks[1].id, "c-2");
    }

    #[test]
    fn test_load_chunks_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": 3, "text": "hello"}}]"#).unwrap();

        let chunks = load_chunks(file.path()).unwrap();
        assert_eq!(chunks, vec![Chunk::new("3", "hello")]);
    }

    #[test]
    fn test_load_chunks_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let err = load_chunks(file.path()).unwrap_err();
        assert!(matches!(err, WeaveError::Parse { .. }));
    }

    #[test]
    fn test_load_chunks_missing_file() {
        let err = load_chunks("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, WeaveError::Io(_)));
    }
}
