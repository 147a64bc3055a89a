//! graphweave-core - Core library for graphweave.
//!
//! This crate provides extraction records, identity resolution, the merge
//! engine, the in-memory graph store and the JSON/Mermaid exporters.
//!
//! # Example
//!
//! ```ignore
//! use graphweave_core::{GraphStore, MergeEngine, ExtractionRecord, EntityMention};
//!
//! let engine = MergeEngine::default();
//! let mut graph = GraphStore::new();
//!
//! let record = ExtractionRecord::new("1")
//!     .with_entity(EntityMention::new("Organization", "Acme Inc."));
//! let outcome = engine.process_record(&mut graph, &record)?;
//!
//! println!("{}", graphweave_core::export::to_json_string(&graph)?);
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod pipeline;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{LlmProvider, LlmProviderConfig, Mode, PipelineConfig};
pub use error::{ErrorCode, WeaveError, WeaveResult};
pub use export::{GraphExport, MermaidRenderer};
pub use graph::{
    Edge, EntityType, GraphStore, IdentityResolver, MergeConfig, MergeEngine, Node, Ontology,
    OntologyConfig, RecordOutcome, TypeConflict, UnresolvedReference,
};
pub use pipeline::{ChunkFailure, OutputPaths, Pipeline, RunReport};
pub use traits::{Extractor, GenerationOptions, Llm, LlmConfig, LlmResponse, ResponseFormat};
pub use types::{
    load_chunks, AttributeValue, Attributes, Chunk, EntityMention, EventMention,
    ExtractionRecord, Message, MessageRole, ParseMode, RelationshipMention, Scalar,
};
