//! Error types for graphweave operations.
//!
//! One error enum covers the whole pipeline. Variants carry an [`ErrorCode`]
//! so callers can branch on the failure class without matching on messages.

use thiserror::Error;

/// Result type alias for graphweave operations.
pub type WeaveResult<T> = Result<T, WeaveError>;

/// Main error type for all graphweave operations.
#[derive(Error, Debug)]
pub enum WeaveError {
    /// An extraction record does not have the expected shape.
    #[error("Malformed record for chunk '{chunk_id}': {message}")]
    MalformedRecord {
        chunk_id: String,
        message: String,
        code: ErrorCode,
    },

    /// An internal graph invariant was violated (e.g. an edge endpoint is missing).
    #[error("Consistency error: {message}")]
    Consistency { message: String, code: ErrorCode },

    /// A node or edge lookup failed.
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        code: ErrorCode,
        element_id: Option<String>,
    },

    /// Every chunk of a run failed.
    #[error("All {total} chunks failed to process")]
    AllChunksFailed { total: usize },

    /// Extraction of a chunk failed.
    #[error("Extraction error: {message}")]
    Extraction { message: String, code: ErrorCode },

    /// LLM operation failed.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Records (REC_xxx)
    RecMissingField,

    // Graph (GRP_xxx)
    GrpMissingEndpoint,
    GrpNodeNotFound,
    GrpEdgeNotFound,

    // Extraction (EXT_xxx)
    ExtSourceUnavailable,
    ExtFailed,

    // LLM (LLM_xxx)
    LlmGenerationFailed,

    // Parse (PARSE_xxx)
    ParseInvalidJson,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RecMissingField => "REC_001",
            ErrorCode::GrpMissingEndpoint => "GRP_001",
            ErrorCode::GrpNodeNotFound => "GRP_002",
            ErrorCode::GrpEdgeNotFound => "GRP_003",
            ErrorCode::ExtSourceUnavailable => "EXT_001",
            ErrorCode::ExtFailed => "EXT_002",
            ErrorCode::LlmGenerationFailed => "LLM_002",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl WeaveError {
    /// Create a malformed-record error.
    pub fn malformed(chunk_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            chunk_id: chunk_id.into(),
            message: message.into(),
            code: ErrorCode::RecMissingField,
        }
    }

    /// Create a consistency error for an edge endpoint missing from the graph.
    pub fn consistency(message: impl Into<String>) -> Self {
        Self::Consistency {
            message: message.into(),
            code: ErrorCode::GrpMissingEndpoint,
        }
    }

    /// Create a not found error for a node.
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        let id = node_id.into();
        Self::NotFound {
            message: format!("Node with id '{}' not found", id),
            code: ErrorCode::GrpNodeNotFound,
            element_id: Some(id),
        }
    }

    /// Create a not found error for an edge.
    pub fn edge_not_found(edge_id: impl Into<String>) -> Self {
        let id = edge_id.into();
        Self::NotFound {
            message: format!("Edge with id '{}' not found", id),
            code: ErrorCode::GrpEdgeNotFound,
            element_id: Some(id),
        }
    }

    /// Create an extraction error.
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
            code: ErrorCode::ExtFailed,
        }
    }

    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedRecord { code, .. } => *code,
            Self::Consistency { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Extraction { code, .. } => *code,
            Self::Llm { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether this error only affects the chunk being processed.
    ///
    /// Chunk-scoped errors are logged and the run moves on to the next chunk.
    pub fn is_chunk_scoped(&self) -> bool {
        matches!(
            self,
            Self::MalformedRecord { .. }
                | Self::Consistency { .. }
                | Self::Extraction { .. }
                | Self::Llm { .. }
                | Self::Parse { .. }
        )
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::MalformedRecord { .. } => {
                Some("Check that every mention has a name, a type and, for relationships, both endpoints")
            }
            Self::NotFound { .. } => Some("Please check the element ID and ensure it exists"),
            Self::Llm { .. } => Some("Please check your LLM provider configuration and API key"),
            Self::AllChunksFailed { .. } => {
                Some("Inspect the per-chunk errors in the log; the extraction source may be unavailable")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_record_error() {
        let err = WeaveError::malformed("chunk_3", "entity #0 has no name");
        assert_eq!(err.code(), ErrorCode::RecMissingField);
        assert!(err.to_string().contains("chunk_3"));
        assert!(err.is_chunk_scoped());
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_not_found_error() {
        let err = WeaveError::node_not_found("organization:acme");
        assert_eq!(err.code(), ErrorCode::GrpNodeNotFound);
        assert!(!err.is_chunk_scoped());
    }

    #[test]
    fn test_all_chunks_failed_is_global() {
        let err = WeaveError::AllChunksFailed { total: 4 };
        assert_eq!(err.code(), ErrorCode::Internal);
        assert!(!err.is_chunk_scoped());
        assert_eq!(err.to_string(), "All 4 chunks failed to process");
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::RecMissingField.as_str(), "REC_001");
        assert_eq!(ErrorCode::GrpMissingEndpoint.as_str(), "GRP_001");
    }
}
