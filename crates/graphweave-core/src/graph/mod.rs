//! Graph construction: ontology, identity resolution, merge engine and store.
//!
//! Records flow through [`MergeEngine::process_record`], which resolves every
//! mention to a canonical key with the [`IdentityResolver`] and upserts the
//! result into a caller-owned [`GraphStore`].

pub mod diagnostics;
pub mod merge;
pub mod ontology;
pub mod resolver;
pub mod store;

pub use diagnostics::{RecordOutcome, TypeConflict, UnresolvedReference};
pub use merge::{
    merge_attributes, EdgeUpsert, MergeConfig, MergeEngine, NodeUpsert, ALIASES_ATTRIBUTE,
    EVENT_TYPE_ATTRIBUTE,
};
pub use ontology::{
    normalize_label, EntityType, Ontology, OntologyConfig, EVENT_PARTICIPANT_RELATION,
    KNOWN_RELATIONS,
};
pub use resolver::{
    edge_key, node_key, normalize_name, ChunkScope, EdgeId, IdentityResolver, NodeId,
    ResolvedEntity, ResolvedRelationship,
};
pub use store::{Edge, GraphStore, Neighbors, Node, Sources};
