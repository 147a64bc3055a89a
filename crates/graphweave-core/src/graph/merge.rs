//! Merge engine: folds extraction records into a [`GraphStore`].
//!
//! The engine holds no graph state of its own. Every call takes the store
//! explicitly, so a run is just a sequence of `process_record` calls over one
//! owned store.

use serde::{Deserialize, Serialize};

use super::diagnostics::{RecordOutcome, TypeConflict, UnresolvedReference};
use super::ontology::{normalize_label, EntityType, OntologyConfig, Ontology, EVENT_PARTICIPANT_RELATION};
use super::resolver::{normalize_name, ChunkScope, IdentityResolver, ResolvedEntity};
use super::store::{Edge, GraphStore, Node, Sources};
use crate::error::{WeaveError, WeaveResult};
use crate::types::{AttributeValue, Attributes, ExtractionRecord};

/// Attribute that collects differing surface forms of a node's name.
pub const ALIASES_ATTRIBUTE: &str = "aliases";

/// Attribute that keeps an event mention's declared kind.
pub const EVENT_TYPE_ATTRIBUTE: &str = "event_type";

/// Configuration for node merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Names treated as "no real name yet". A stored placeholder name is
    /// replaced by the first meaningful name seen for the same key.
    /// Default: `["unknown"]`
    pub placeholder_names: Vec<String>,
    /// Whether differing surface forms are recorded in the `aliases` attribute.
    /// Default: true
    pub track_aliases: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            placeholder_names: vec!["unknown".to_string()],
            track_aliases: true,
        }
    }
}

impl MergeConfig {
    /// Set whether aliases are tracked.
    pub fn track_aliases(mut self, track: bool) -> Self {
        self.track_aliases = track;
        self
    }

    /// Add a placeholder name.
    pub fn with_placeholder(mut self, name: impl Into<String>) -> Self {
        self.placeholder_names.push(name.into());
        self
    }
}

/// Result of a node upsert.
#[derive(Debug)]
pub struct NodeUpsert<'a> {
    pub node: &'a Node,
    pub created: bool,
    /// The incoming type, when it differed from the stored one.
    pub conflicting_type: Option<EntityType>,
}

/// Result of an edge upsert.
#[derive(Debug)]
pub struct EdgeUpsert<'a> {
    pub edge: &'a Edge,
    pub created: bool,
}

/// The only component that mutates a [`GraphStore`].
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    resolver: IdentityResolver,
    config: MergeConfig,
}

impl MergeEngine {
    /// Create a merge engine.
    pub fn new(resolver: IdentityResolver, config: MergeConfig) -> Self {
        Self { resolver, config }
    }

    /// Create a merge engine from ontology and merge configuration.
    pub fn from_config(ontology: &OntologyConfig, config: MergeConfig) -> Self {
        Self::new(IdentityResolver::new(Ontology::new(ontology)), config)
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    fn is_placeholder(&self, name: &str) -> bool {
        let normalized = normalize_name(name);
        normalized.is_empty()
            || self
                .config
                .placeholder_names
                .iter()
                .any(|p| normalize_name(p) == normalized)
    }

    /// Insert a node or merge into the existing node with the same key.
    ///
    /// The stored type never changes. The stored name is only replaced when
    /// it is a placeholder. Attributes merge without loss and `chunk_id` joins
    /// the node's sources.
    pub fn upsert_node<'g>(
        &self,
        graph: &'g mut GraphStore,
        key: &str,
        entity_type: &EntityType,
        name: &str,
        attributes: &Attributes,
        chunk_id: &str,
    ) -> WeaveResult<NodeUpsert<'g>> {
        let name = name.trim();

        if !graph.contains_node(key) {
            let node = Node {
                id: key.to_string(),
                entity_type: entity_type.clone(),
                name: name.to_string(),
                attributes: attributes.clone(),
                sources: Sources::single(chunk_id),
            };
            let normalized = self.resolver.canonical_name(name);
            tracing::debug!(node_id = %key, chunk_id, "Created node");
            return Ok(NodeUpsert {
                node: graph.insert_node(node, &normalized),
                created: true,
                conflicting_type: None,
            });
        }

        let incoming_is_placeholder = self.is_placeholder(name);
        let node = graph.node_mut(key)?;

        let conflicting_type = (node.entity_type != *entity_type).then(|| entity_type.clone());

        if self.is_placeholder(&node.name) && !incoming_is_placeholder {
            node.name = name.to_string();
        } else if self.config.track_aliases && !incoming_is_placeholder && name != node.name {
            let alias = AttributeValue::List(vec![name.into()]);
            match node.attributes.get_mut(ALIASES_ATTRIBUTE) {
                Some(existing) => {
                    existing.merge(&alias);
                }
                None => {
                    node.attributes.insert(ALIASES_ATTRIBUTE.to_string(), alias);
                }
            }
        }

        merge_attributes(&mut node.attributes, attributes);
        node.sources.insert(chunk_id);
        tracing::debug!(node_id = %key, chunk_id, "Merged node");

        Ok(NodeUpsert {
            node,
            created: false,
            conflicting_type,
        })
    }

    /// Insert an edge or merge into the existing edge with the same key.
    ///
    /// Fails with a consistency error if either endpoint is not in the graph.
    #[allow(clippy::too_many_arguments)]
    pub fn upsert_edge<'g>(
        &self,
        graph: &'g mut GraphStore,
        key: &str,
        source_id: &str,
        target_id: &str,
        relation_type: &str,
        attributes: &Attributes,
        chunk_id: &str,
    ) -> WeaveResult<EdgeUpsert<'g>> {
        if graph.contains_edge(key) {
            let edge = graph.edge_mut(key)?;
            merge_attributes(&mut edge.attributes, attributes);
            edge.sources.insert(chunk_id);
            tracing::debug!(edge_id = %key, chunk_id, "Merged edge");
            return Ok(EdgeUpsert {
                edge,
                created: false,
            });
        }

        let edge = Edge {
            id: key.to_string(),
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            relation_type: relation_type.to_string(),
            attributes: attributes.clone(),
            sources: Sources::single(chunk_id),
        };
        let edge = graph.insert_edge(edge)?;
        tracing::debug!(edge_id = %key, chunk_id, "Created edge");
        Ok(EdgeUpsert {
            edge,
            created: true,
        })
    }

    /// Fold one extraction record into the graph.
    ///
    /// Entities are merged first, then relationships, then events. The record
    /// is validated and every identity is resolved before the graph is
    /// touched, so a malformed record leaves the graph unchanged.
    pub fn process_record(
        &self,
        graph: &mut GraphStore,
        record: &ExtractionRecord,
    ) -> WeaveResult<RecordOutcome> {
        record.validate()?;
        let chunk_id = record.chunk_id.as_str();

        let entities = record
            .entities
            .iter()
            .map(|e| {
                self.resolver
                    .resolve_entity(&e.entity_type, &e.name)
                    .ok_or_else(|| {
                        WeaveError::malformed(chunk_id, format!("entity '{}' has no usable identity", e.name))
                    })
            })
            .collect::<WeaveResult<Vec<_>>>()?;

        for rel in &record.relationships {
            if self.resolver.ontology().resolve_relation(&rel.relation_type).is_empty() {
                return Err(WeaveError::malformed(
                    chunk_id,
                    format!("relation '{}' normalizes to nothing", rel.relation_type),
                ));
            }
        }

        let events = record
            .events
            .iter()
            .map(|e| {
                self.resolver
                    .resolve_entity(EntityType::Event.as_str(), &e.name)
                    .ok_or_else(|| {
                        WeaveError::malformed(chunk_id, format!("event '{}' has no usable identity", e.name))
                    })
            })
            .collect::<WeaveResult<Vec<_>>>()?;

        let mut outcome = RecordOutcome::new(chunk_id);
        let mut scope = ChunkScope::new();

        for (mention, resolved) in record.entities.iter().zip(&entities) {
            self.merge_entity(graph, resolved, &mention.name, &mention.attributes, &mut outcome)?;
            scope.register(resolved);
        }

        for rel in &record.relationships {
            let relation_type = self.resolver.ontology().resolve_relation(&rel.relation_type);
            if !self.resolver.ontology().is_known_relation(&relation_type) {
                tracing::debug!(chunk_id, relation = %relation_type, "Relation outside the known vocabulary");
            }

            let source = self.resolver.resolve_endpoint(&rel.source_name, &scope, graph);
            let target = self.resolver.resolve_endpoint(&rel.target_name, &scope, graph);
            let (source_id, target_id) = match (source, target) {
                (Some(s), Some(t)) => (s, t),
                (None, _) => {
                    outcome.unresolved.push(unresolved(chunk_id, &relation_type, &rel.source_name));
                    continue;
                }
                (_, None) => {
                    outcome.unresolved.push(unresolved(chunk_id, &relation_type, &rel.target_name));
                    continue;
                }
            };

            let Some(resolved) = self
                .resolver
                .resolve_relationship(&source_id, &target_id, &relation_type)
            else {
                continue;
            };

            match self.upsert_edge(
                graph,
                &resolved.key,
                &resolved.source_id,
                &resolved.target_id,
                &resolved.relation_type,
                &rel.attributes,
                chunk_id,
            ) {
                Ok(upsert) => count_edge(&mut outcome, upsert.created),
                // Endpoints come from the chunk scope or the name index, so this
                // only fires when the store's indices disagree with its nodes.
                Err(err @ WeaveError::Consistency { .. }) => {
                    tracing::error!(chunk_id, error = %err, "Aborting remaining relationships of chunk");
                    outcome.aborted = Some(err.to_string());
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        for (event, resolved) in record.events.iter().zip(&events) {
            let mut attributes = event.attributes.clone();
            let event_type = normalize_label(&event.event_type);
            if !event_type.is_empty() {
                attributes
                    .entry(EVENT_TYPE_ATTRIBUTE.to_string())
                    .or_insert_with(|| event_type.into());
            }
            self.merge_entity(graph, resolved, &event.name, &attributes, &mut outcome)?;

            for participant in &event.participants {
                let Some(participant_id) = self.resolver.resolve_endpoint(participant, &scope, graph)
                else {
                    outcome
                        .unresolved
                        .push(unresolved(chunk_id, EVENT_PARTICIPANT_RELATION, participant));
                    continue;
                };
                let Some(link) = self.resolver.resolve_relationship(
                    &participant_id,
                    &resolved.key,
                    EVENT_PARTICIPANT_RELATION,
                ) else {
                    continue;
                };
                let upsert = self.upsert_edge(
                    graph,
                    &link.key,
                    &link.source_id,
                    &link.target_id,
                    &link.relation_type,
                    &Attributes::new(),
                    chunk_id,
                )?;
                count_edge(&mut outcome, upsert.created);
            }
        }

        Ok(outcome)
    }

    fn merge_entity(
        &self,
        graph: &mut GraphStore,
        resolved: &ResolvedEntity,
        name: &str,
        attributes: &Attributes,
        outcome: &mut RecordOutcome,
    ) -> WeaveResult<()> {
        // First node already stored under this name with another type.
        let earlier_type = if graph.contains_node(&resolved.key) {
            None
        } else {
            graph
                .find_by_name(&resolved.normalized_name)
                .first()
                .and_then(|id| graph.get_node(id).ok())
                .filter(|node| node.entity_type != resolved.entity_type)
                .map(|node| node.entity_type.clone())
        };

        let upsert = self.upsert_node(
            graph,
            &resolved.key,
            &resolved.entity_type,
            name,
            attributes,
            &outcome.chunk_id,
        )?;

        let conflict = match (upsert.conflicting_type, earlier_type) {
            (Some(incoming), _) => Some((upsert.node.entity_type.clone(), incoming)),
            (None, Some(existing)) if upsert.created => {
                Some((existing, resolved.entity_type.clone()))
            }
            _ => None,
        };
        let created = upsert.created;

        if let Some((existing, incoming)) = conflict {
            let conflict = TypeConflict {
                chunk_id: outcome.chunk_id.clone(),
                node_id: resolved.key.clone(),
                existing_type: existing.to_string(),
                incoming_type: incoming.to_string(),
            };
            tracing::warn!(
                chunk_id = %conflict.chunk_id,
                node_id = %conflict.node_id,
                existing = %conflict.existing_type,
                incoming = %conflict.incoming_type,
                "Entity name already stored with another type"
            );
            outcome.type_conflicts.push(conflict);
        }

        if created {
            outcome.nodes_created += 1;
        } else {
            outcome.nodes_merged += 1;
        }
        Ok(())
    }
}

/// Merge incoming attributes into an existing map without losing values.
pub fn merge_attributes(existing: &mut Attributes, incoming: &Attributes) {
    for (key, value) in incoming {
        match existing.get_mut(key) {
            Some(current) => {
                current.merge(value);
            }
            None => {
                existing.insert(key.clone(), value.clone());
            }
        }
    }
}

fn unresolved(chunk_id: &str, relation_type: &str, missing: &str) -> UnresolvedReference {
    tracing::warn!(chunk_id, relation = relation_type, endpoint = missing, "Unresolved reference, dropping mention");
    UnresolvedReference {
        chunk_id: chunk_id.to_string(),
        relation_type: relation_type.to_string(),
        missing_endpoint: missing.to_string(),
    }
}

fn count_edge(outcome: &mut RecordOutcome, created: bool) {
    if created {
        outcome.edges_created += 1;
    } else {
        outcome.edges_merged += 1;
    }
}
