//! Non-fatal findings reported while merging records.

use serde::{Deserialize, Serialize};

use super::resolver::NodeId;

/// A relationship or event participant that named an entity nobody declared.
///
/// The mention is dropped; no edge is created for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    pub chunk_id: String,
    pub relation_type: String,
    /// Surface name that could not be resolved.
    pub missing_endpoint: String,
}

/// A mention whose type disagreed with the type already stored for its key.
///
/// The stored type is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeConflict {
    pub chunk_id: String,
    pub node_id: NodeId,
    pub existing_type: String,
    pub incoming_type: String,
}

/// What processing one record did to the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub chunk_id: String,
    pub nodes_created: usize,
    pub nodes_merged: usize,
    pub edges_created: usize,
    pub edges_merged: usize,
    pub unresolved: Vec<UnresolvedReference>,
    pub type_conflicts: Vec<TypeConflict>,
    /// Set when a consistency error stopped the record's remaining relationships.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl RecordOutcome {
    pub fn new(chunk_id: impl Into<String>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            ..Default::default()
        }
    }

    /// Number of nodes and edges touched.
    pub fn touched(&self) -> usize {
        self.nodes_created + self.nodes_merged + self.edges_created + self.edges_merged
    }
}
