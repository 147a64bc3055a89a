//! Identity resolution: canonical keys for entity and relationship mentions.
//!
//! Two mentions collide when their keys are equal:
//!
//! - entity key: `"{type}:{normalized name}"`
//! - edge key: `"{source key}-[{relation}]->{target key}"`
//!
//! Everything here is a pure function of its inputs. Endpoint resolution
//! reads the graph's name index but never mutates it.

use std::collections::HashMap;

use super::ontology::{EntityType, Ontology};
use super::store::GraphStore;

/// Canonical node key.
pub type NodeId = String;

/// Canonical edge key.
pub type EdgeId = String;

/// Characters that only format a name and never distinguish two entities.
const FORMATTING_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '\'', '"', '`', '(', ')', '[', ']', '{', '}', '\u{2018}',
    '\u{2019}', '\u{201C}', '\u{201D}',
];

/// Normalize an entity name for identity comparison.
///
/// Case-folds, strips formatting punctuation, trims and collapses inner
/// whitespace, so `"Acme Inc."` and `"  acme   inc "` both become `"acme inc"`.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !FORMATTING_PUNCTUATION.contains(c))
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build a node key from a resolved type and a canonical normalized name.
pub fn node_key(entity_type: &EntityType, normalized_name: &str) -> NodeId {
    format!("{}:{}", entity_type.as_str(), normalized_name)
}

/// Build an edge key from endpoint keys and a resolved relation.
pub fn edge_key(source_id: &str, relation_type: &str, target_id: &str) -> EdgeId {
    format!("{}-[{}]->{}", source_id, relation_type, target_id)
}

/// Identity of an entity mention after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntity {
    /// Canonical node key.
    pub key: NodeId,
    /// Resolved entity type.
    pub entity_type: EntityType,
    /// Canonical normalized name (after alias mapping).
    pub normalized_name: String,
}

/// Identity of a relationship mention after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelationship {
    /// Canonical edge key.
    pub key: EdgeId,
    /// Source node key.
    pub source_id: NodeId,
    /// Target node key.
    pub target_id: NodeId,
    /// Resolved relation label.
    pub relation_type: String,
}

/// Entity names established so far in the chunk being processed.
///
/// Lets relationships refer to entities declared anywhere in the same chunk.
/// The first entity registered under a name wins.
#[derive(Debug, Default)]
pub struct ChunkScope {
    names: HashMap<String, NodeId>,
}

impl ChunkScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolved entity.
    pub fn register(&mut self, entity: &ResolvedEntity) {
        self.names
            .entry(entity.normalized_name.clone())
            .or_insert_with(|| entity.key.clone());
    }

    /// Look up a canonical normalized name.
    pub fn get(&self, normalized_name: &str) -> Option<&NodeId> {
        self.names.get(normalized_name)
    }

    /// Number of distinct names in scope.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the scope is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Computes canonical keys for mentions.
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    ontology: Ontology,
}

impl IdentityResolver {
    /// Create a resolver over the given ontology.
    pub fn new(ontology: Ontology) -> Self {
        Self { ontology }
    }

    /// Get the ontology.
    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    /// Canonical normalized form of a name, after alias mapping.
    pub fn canonical_name(&self, name: &str) -> String {
        let normalized = normalize_name(name);
        self.ontology.canonical_name(&normalized).to_string()
    }

    /// Resolve an entity mention to its key.
    ///
    /// Returns `None` if the type is blank or the name normalizes to nothing.
    pub fn resolve_entity(&self, entity_type: &str, name: &str) -> Option<ResolvedEntity> {
        let entity_type = self.ontology.resolve_type(entity_type)?;
        let normalized_name = self.canonical_name(name);
        if normalized_name.is_empty() {
            return None;
        }
        Some(ResolvedEntity {
            key: node_key(&entity_type, &normalized_name),
            entity_type,
            normalized_name,
        })
    }

    /// Resolve a relationship between two already-resolved endpoints.
    ///
    /// Returns `None` if the relation label is blank.
    pub fn resolve_relationship(
        &self,
        source_id: &str,
        target_id: &str,
        relation_type: &str,
    ) -> Option<ResolvedRelationship> {
        let relation_type = self.ontology.resolve_relation(relation_type);
        if relation_type.is_empty() {
            return None;
        }
        Some(ResolvedRelationship {
            key: edge_key(source_id, &relation_type, target_id),
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            relation_type,
        })
    }

    /// Resolve an endpoint name to a node key.
    ///
    /// Entities of the current chunk take precedence; otherwise the first node
    /// inserted into the graph under that name is used.
    pub fn resolve_endpoint(
        &self,
        name: &str,
        scope: &ChunkScope,
        graph: &GraphStore,
    ) -> Option<NodeId> {
        let normalized = self.canonical_name(name);
        if normalized.is_empty() {
            return None;
        }
        if let Some(key) = scope.get(&normalized) {
            return Some(key.clone());
        }
        graph.find_by_name(&normalized).first().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ontology::OntologyConfig;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Acme Inc."), "acme inc");
        assert_eq!(normalize_name("  acme   INC "), "acme inc");
        assert_eq!(normalize_name("\"Swiggy One\""), "swiggy one");
        assert_eq!(normalize_name("AT&T"), "at&t");
        assert_eq!(normalize_name("Launch Instamart (2020)"), "launch instamart 2020");
        assert_eq!(normalize_name("..."), "");
    }

    #[test]
    fn test_case_fold_mentions_collide() {
        let resolver = IdentityResolver::default();
        let a = resolver.resolve_entity("Organization", "Acme Inc.").unwrap();
        let b = resolver.resolve_entity("organization", "acme inc").unwrap();
        assert_eq!(a.key, b.key);
        assert_eq!(a.key, "organization:acme inc");
    }

    #[test]
    fn test_type_is_part_of_identity() {
        let resolver = IdentityResolver::default();
        let company = resolver.resolve_entity("Company", "Swiggy").unwrap();
        let product = resolver.resolve_entity("Product", "Swiggy").unwrap();
        assert_ne!(company.key, product.key);
    }

    #[test]
    fn test_ontology_mapping_merges_types_and_names() {
        let mut config = OntologyConfig::default();
        config.type_aliases.insert("Startup".into(), "Organization".into());
        config.name_aliases.insert("Swiggy Ltd.".into(), "Swiggy".into());
        let resolver = IdentityResolver::new(Ontology::new(&config));

        let a = resolver.resolve_entity("Startup", "Swiggy Ltd").unwrap();
        let b = resolver.resolve_entity("Company", "swiggy").unwrap();
        assert_eq!(a.key, b.key);
    }

    #[test]
    fn test_resolve_entity_rejects_empty_identity() {
        let resolver = IdentityResolver::default();
        assert!(resolver.resolve_entity("Organization", "...").is_none());
        assert!(resolver.resolve_entity("  ", "Acme").is_none());
    }

    #[test]
    fn test_resolve_relationship_key() {
        let resolver = IdentityResolver::default();
        let rel = resolver
            .resolve_relationship("organization:acme inc", "person:jane doe", "Founded By")
            .unwrap();
        assert_eq!(rel.relation_type, "founded_by");
        assert_eq!(rel.key, "organization:acme inc-[founded_by]->person:jane doe");
        assert!(resolver.resolve_relationship("a", "b", " - ").is_none());
    }

    #[test]
    fn test_resolve_endpoint_prefers_chunk_scope() {
        let resolver = IdentityResolver::default();
        let graph = GraphStore::new();
        let mut scope = ChunkScope::new();
        assert!(scope.is_empty());

        let product = resolver.resolve_entity("Product", "Swiggy").unwrap();
        let company = resolver.resolve_entity("Company", "Swiggy").unwrap();
        scope.register(&product);
        scope.register(&company);
        assert_eq!(scope.len(), 1);

        assert_eq!(
            resolver.resolve_endpoint("SWIGGY", &scope, &graph),
            Some(product.key)
        );
        assert_eq!(resolver.resolve_endpoint("Zomato", &scope, &graph), None);
    }
}
