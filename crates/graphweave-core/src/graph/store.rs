//! In-memory graph store backed by a petgraph `DiGraph`.
//!
//! The store keeps nodes and edges in first-insertion order (petgraph
//! indices are never reused because nothing is ever removed) and maintains
//! lookup indices by key, by endpoint pair and by normalized name.
//!
//! Reads are public. Writes are crate-private: only the merge engine
//! mutates a store.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use super::ontology::EntityType;
use super::resolver::{EdgeId, NodeId};
use crate::error::{WeaveError, WeaveResult};
use crate::types::Attributes;

/// Set of chunk ids that contributed evidence, in first-contribution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sources(Vec<String>);

impl Sources {
    /// Create a set holding one chunk id.
    pub fn single(chunk_id: impl Into<String>) -> Self {
        Self(vec![chunk_id.into()])
    }

    /// Add a chunk id. Returns `false` if it was already present.
    pub fn insert(&mut self, chunk_id: &str) -> bool {
        if self.contains(chunk_id) {
            return false;
        }
        self.0.push(chunk_id.to_string());
        true
    }

    /// Check membership.
    pub fn contains(&self, chunk_id: &str) -> bool {
        self.0.iter().any(|s| s == chunk_id)
    }

    /// Iterate over chunk ids.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of contributing chunks.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no contributing chunks.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A deduplicated entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Canonical key.
    pub id: NodeId,
    /// Entity type, fixed by the first mention.
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Display name.
    pub name: String,
    /// Merged attributes.
    pub attributes: Attributes,
    /// Contributing chunk ids.
    pub sources: Sources,
}

/// A deduplicated directed relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Canonical key.
    pub id: EdgeId,
    /// Source node key.
    pub source_id: NodeId,
    /// Target node key.
    pub target_id: NodeId,
    /// Relation label.
    pub relation_type: String,
    /// Merged attributes.
    pub attributes: Attributes,
    /// Contributing chunk ids.
    pub sources: Sources,
}

/// Edge ids touching a node, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighbors {
    /// Edges leaving the node.
    pub outgoing: Vec<EdgeId>,
    /// Edges entering the node.
    pub incoming: Vec<EdgeId>,
}

/// The accumulated knowledge graph of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    graph: DiGraph<Node, Edge>,
    node_index: HashMap<NodeId, NodeIndex>,
    edge_index: HashMap<EdgeId, EdgeIndex>,
    pair_index: HashMap<(NodeId, NodeId), Vec<EdgeId>>,
    name_index: HashMap<String, Vec<NodeId>>,
}

impl GraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node by key.
    pub fn get_node(&self, id: &str) -> WeaveResult<&Node> {
        self.node_index
            .get(id)
            .and_then(|idx| self.graph.node_weight(*idx))
            .ok_or_else(|| WeaveError::node_not_found(id))
    }

    /// Look up an edge by key.
    pub fn get_edge(&self, id: &str) -> WeaveResult<&Edge> {
        self.edge_index
            .get(id)
            .and_then(|idx| self.graph.edge_weight(*idx))
            .ok_or_else(|| WeaveError::edge_not_found(id))
    }

    /// Check if a node exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Check if an edge exists.
    pub fn contains_edge(&self, id: &str) -> bool {
        self.edge_index.contains_key(id)
    }

    /// All nodes in first-insertion order.
    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// All edges in first-insertion order.
    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    /// Outgoing and incoming edge ids of a node.
    pub fn neighbors(&self, node_id: &str) -> WeaveResult<Neighbors> {
        let idx = *self
            .node_index
            .get(node_id)
            .ok_or_else(|| WeaveError::node_not_found(node_id))?;

        Ok(Neighbors {
            outgoing: self.edge_ids(idx, Direction::Outgoing),
            incoming: self.edge_ids(idx, Direction::Incoming),
        })
    }

    fn edge_ids(&self, idx: NodeIndex, direction: Direction) -> Vec<EdgeId> {
        // petgraph walks adjacency lists newest-first
        let mut edges: Vec<_> = self.graph.edges_directed(idx, direction).collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| e.weight().id.clone()).collect()
    }

    /// Edge ids from `source_id` to `target_id`, in insertion order.
    pub fn edges_between(&self, source_id: &str, target_id: &str) -> &[EdgeId] {
        self.pair_index
            .get(&(source_id.to_string(), target_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Node ids registered under a canonical normalized name, in insertion order.
    pub fn find_by_name(&self, normalized_name: &str) -> &[NodeId] {
        self.name_index
            .get(normalized_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Verify the store's structural invariants.
    ///
    /// Every edge endpoint must resolve to a node and every key must be
    /// indexed exactly once.
    pub fn check_invariants(&self) -> WeaveResult<()> {
        if self.node_index.len() != self.graph.node_count() {
            return Err(WeaveError::consistency("duplicate or unindexed node key"));
        }
        if self.edge_index.len() != self.graph.edge_count() {
            return Err(WeaveError::consistency("duplicate or unindexed edge key"));
        }
        for edge in self.all_edges() {
            for endpoint in [&edge.source_id, &edge.target_id] {
                if !self.contains_node(endpoint) {
                    return Err(WeaveError::consistency(format!(
                        "edge '{}' references missing node '{}'",
                        edge.id, endpoint
                    )));
                }
            }
        }
        Ok(())
    }

    /// Insert a new node. The caller guarantees the key is not present.
    pub(crate) fn insert_node(&mut self, node: Node, normalized_name: &str) -> &mut Node {
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_index.insert(id.clone(), idx);
        self.name_index
            .entry(normalized_name.to_string())
            .or_default()
            .push(id);
        &mut self.graph[idx]
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> WeaveResult<&mut Node> {
        self.node_index
            .get(id)
            .and_then(|idx| self.graph.node_weight_mut(*idx))
            .ok_or_else(|| WeaveError::node_not_found(id))
    }

    /// Insert a new edge. The caller guarantees the key is not present.
    ///
    /// Fails with a consistency error if either endpoint is missing.
    pub(crate) fn insert_edge(&mut self, edge: Edge) -> WeaveResult<&mut Edge> {
        let source = *self.node_index.get(&edge.source_id).ok_or_else(|| {
            WeaveError::consistency(format!(
                "edge '{}' source '{}' is not in the graph",
                edge.id, edge.source_id
            ))
        })?;
        let target = *self.node_index.get(&edge.target_id).ok_or_else(|| {
            WeaveError::consistency(format!(
                "edge '{}' target '{}' is not in the graph",
                edge.id, edge.target_id
            ))
        })?;

        let id = edge.id.clone();
        let pair = (edge.source_id.clone(), edge.target_id.clone());
        let idx = self.graph.add_edge(source, target, edge);
        self.edge_index.insert(id.clone(), idx);
        self.pair_index.entry(pair).or_default().push(id);
        Ok(&mut self.graph[idx])
    }

    pub(crate) fn edge_mut(&mut self, id: &str) -> WeaveResult<&mut Edge> {
        self.edge_index
            .get(id)
            .and_then(|idx| self.graph.edge_weight_mut(*idx))
            .ok_or_else(|| WeaveError::edge_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str) -> Node {
        Node {
            id: id.to_string(),
            entity_type: EntityType::Organization,
            name: name.to_string(),
            attributes: Attributes::new(),
            sources: Sources::single("1"),
        }
    }

    fn edge(source: &str, relation: &str, target: &str) -> Edge {
        Edge {
            id: format!("{}-[{}]->{}", source, relation, target),
            source_id: source.to_string(),
            target_id: target.to_string(),
            relation_type: relation.to_string(),
            attributes: Attributes::new(),
            sources: Sources::single("1"),
        }
    }

    #[test]
    fn test_sources_set_semantics() {
        let mut sources = Sources::single("1");
        assert!(!sources.insert("1"));
        assert!(sources.insert("10"));
        assert!(sources.insert("2"));
        assert_eq!(sources.iter().collect::<Vec<_>>(), vec!["1", "10", "2"]);
        assert_eq!(serde_json::to_string(&sources).unwrap(), r#"["1","10","2"]"#);
    }

    #[test]
    fn test_lookups_and_not_found() {
        let mut store = GraphStore::new();
        assert!(store.is_empty());
        store.insert_node(node("organization:acme", "Acme"), "acme");

        assert_eq!(store.get_node("organization:acme").unwrap().name, "Acme");
        assert!(matches!(
            store.get_node("organization:nope"),
            Err(WeaveError::NotFound { .. })
        ));
        assert!(matches!(store.get_edge("x"), Err(WeaveError::NotFound { .. })));
        assert!(matches!(store.neighbors("x"), Err(WeaveError::NotFound { .. })));
        assert_eq!(store.find_by_name("acme"), ["organization:acme".to_string()]);
        assert!(store.find_by_name("other").is_empty());
    }

    #[test]
    fn test_insertion_order_is_stable() {
        let mut store = GraphStore::new();
        for name in ["c", "a", "b"] {
            store.insert_node(node(name, name), name);
        }
        let ids: Vec<_> = store.all_nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_insert_edge_requires_endpoints() {
        let mut store = GraphStore::new();
        store.insert_node(node("a", "A"), "a");

        let err = store.insert_edge(edge("a", "knows", "b")).unwrap_err();
        assert!(matches!(err, WeaveError::Consistency { .. }));
        assert_eq!(store.edge_count(), 0);
        assert!(store.check_invariants().is_ok());
    }

    #[test]
    fn test_neighbors_and_pair_index() {
        let mut store = GraphStore::new();
        for id in ["a", "b", "c"] {
            store.insert_node(node(id, id), id);
        }
        store.insert_edge(edge("a", "operates", "b")).unwrap();
        store.insert_edge(edge("a", "offers", "b")).unwrap();
        store.insert_edge(edge("c", "acquired", "a")).unwrap();

        let n = store.neighbors("a").unwrap();
        assert_eq!(n.outgoing, vec!["a-[operates]->b", "a-[offers]->b"]);
        assert_eq!(n.incoming, vec!["c-[acquired]->a"]);

        assert_eq!(store.edges_between("a", "b").len(), 2);
        assert!(store.edges_between("b", "a").is_empty());
        assert!(store.check_invariants().is_ok());
    }
}
