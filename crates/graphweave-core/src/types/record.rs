//! Extraction records: the per-chunk output of an extractor.
//!
//! Records are the contract between extraction (gold standard or LLM) and
//! the merge engine. Raw JSON from either source goes through
//! [`ExtractionRecord::from_json`], which accepts the field-name variants
//! extractors tend to produce.

use serde::{Deserialize, Serialize};

use super::attribute::{attributes_from_json, Attributes};
use crate::error::{WeaveError, WeaveResult};

/// An entity mention as extracted from one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMention {
    /// Declared entity type (free text, resolved through the ontology).
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Surface name as written in the chunk.
    pub name: String,
    /// Free-form attributes.
    #[serde(default)]
    pub attributes: Attributes,
}

impl EntityMention {
    /// Create a new entity mention.
    pub fn new(entity_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            name: name.into(),
            attributes: Attributes::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<super::AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A relationship mention between two named entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMention {
    /// Relation type (e.g. `founded_by`).
    pub relation_type: String,
    /// Surface name of the source entity.
    pub source_name: String,
    /// Surface name of the target entity.
    pub target_name: String,
    /// Free-form attributes.
    #[serde(default)]
    pub attributes: Attributes,
}

impl RelationshipMention {
    /// Create a new relationship mention.
    pub fn new(
        relation_type: impl Into<String>,
        source_name: impl Into<String>,
        target_name: impl Into<String>,
    ) -> Self {
        Self {
            relation_type: relation_type.into(),
            source_name: source_name.into(),
            target_name: target_name.into(),
            attributes: Attributes::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<super::AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// An event mention with its participating entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMention {
    /// Event kind (e.g. `launch`, `acquisition`).
    #[serde(rename = "type", default)]
    pub event_type: String,
    /// Event label, e.g. "Launch Instamart (2020)".
    pub name: String,
    /// Temporal and descriptive attributes.
    #[serde(default)]
    pub attributes: Attributes,
    /// Surface names of participating entities.
    #[serde(default)]
    pub participants: Vec<String>,
}

impl EventMention {
    /// Create a new event mention.
    pub fn new(event_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            name: name.into(),
            attributes: Attributes::new(),
            participants: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<super::AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add a participant.
    pub fn with_participant(mut self, name: impl Into<String>) -> Self {
        self.participants.push(name.into());
        self
    }
}

/// Everything extracted from one chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Id of the chunk the mentions came from.
    pub chunk_id: String,
    #[serde(default)]
    pub entities: Vec<EntityMention>,
    #[serde(default)]
    pub relationships: Vec<RelationshipMention>,
    #[serde(default)]
    pub events: Vec<EventMention>,
}

/// How strictly raw JSON is turned into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Any invalid mention makes the whole record malformed.
    #[default]
    Strict,
    /// Invalid mentions are dropped with a warning.
    Lenient,
}

impl ExtractionRecord {
    /// Create an empty record for a chunk.
    pub fn new(chunk_id: impl Into<String>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            ..Default::default()
        }
    }

    /// Add an entity mention.
    pub fn with_entity(mut self, entity: EntityMention) -> Self {
        self.entities.push(entity);
        self
    }

    /// Add a relationship mention.
    pub fn with_relationship(mut self, relationship: RelationshipMention) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Add an event mention.
    pub fn with_event(mut self, event: EventMention) -> Self {
        self.events.push(event);
        self
    }

    /// Check if the record carries no mentions.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty() && self.events.is_empty()
    }

    /// Total number of mentions.
    pub fn mention_count(&self) -> usize {
        self.entities.len() + self.relationships.len() + self.events.len()
    }

    /// Check that every required field is present and non-blank.
    pub fn validate(&self) -> WeaveResult<()> {
        if self.chunk_id.trim().is_empty() {
            return Err(WeaveError::malformed("", "record has no chunk id"));
        }
        for (i, entity) in self.entities.iter().enumerate() {
            if entity.name.trim().is_empty() {
                return Err(WeaveError::malformed(
                    &self.chunk_id,
                    format!("entity #{} has no name", i),
                ));
            }
            if entity.entity_type.trim().is_empty() {
                return Err(WeaveError::malformed(
                    &self.chunk_id,
                    format!("entity '{}' has no type", entity.name),
                ));
            }
        }
        for (i, rel) in self.relationships.iter().enumerate() {
            if rel.relation_type.trim().is_empty() {
                return Err(WeaveError::malformed(
                    &self.chunk_id,
                    format!("relationship #{} has no relation type", i),
                ));
            }
            if rel.source_name.trim().is_empty() || rel.target_name.trim().is_empty() {
                return Err(WeaveError::malformed(
                    &self.chunk_id,
                    format!("relationship #{} is missing an endpoint", i),
                ));
            }
        }
        for (i, event) in self.events.iter().enumerate() {
            if event.name.trim().is_empty() {
                return Err(WeaveError::malformed(
                    &self.chunk_id,
                    format!("event #{} has no name", i),
                ));
            }
        }
        Ok(())
    }

    /// Build a record from raw extractor JSON.
    ///
    /// The value must be an object with optional `entities`, `relationships`
    /// and `events` arrays. In [`ParseMode::Strict`] any mention missing a
    /// required field fails the whole record; in [`ParseMode::Lenient`] such
    /// mentions are skipped.
    pub fn from_json(
        chunk_id: impl Into<String>,
        value: &serde_json::Value,
        mode: ParseMode,
    ) -> WeaveResult<Self> {
        let chunk_id = chunk_id.into();
        let obj = value.as_object().ok_or_else(|| {
            WeaveError::malformed(&chunk_id, "extraction output is not a JSON object")
        })?;

        let mut record = ExtractionRecord::new(chunk_id.clone());

        for (i, raw) in raw::array(obj, "entities", &chunk_id)?.iter().enumerate() {
            match raw::entity(raw) {
                Ok(entity) => record.entities.push(entity),
                Err(reason) => raw::reject(mode, &chunk_id, "entity", i, reason)?,
            }
        }

        for (i, raw) in raw::array(obj, "relationships", &chunk_id)?.iter().enumerate() {
            match raw::relationship(raw) {
                Ok(rel) => record.relationships.push(rel),
                Err(reason) => raw::reject(mode, &chunk_id, "relationship", i, reason)?,
            }
        }

        for (i, raw) in raw::array(obj, "events", &chunk_id)?.iter().enumerate() {
            match raw::event(raw) {
                Ok(event) => record.events.push(event),
                Err(reason) => raw::reject(mode, &chunk_id, "event", i, reason)?,
            }
        }

        Ok(record)
    }
}

/// Field lookup for raw extractor output.
mod raw {
    use serde_json::{Map, Value};

    use super::{attributes_from_json, EntityMention, EventMention, ParseMode, RelationshipMention};
    use crate::error::{WeaveError, WeaveResult};

    const EMPTY: &[Value] = &[];

    pub fn array<'a>(
        obj: &'a Map<String, Value>,
        key: &str,
        chunk_id: &str,
    ) -> WeaveResult<&'a [Value]> {
        match obj.get(key) {
            None | Some(Value::Null) => Ok(EMPTY),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(_) => Err(WeaveError::malformed(
                chunk_id,
                format!("'{}' is not an array", key),
            )),
        }
    }

    pub fn reject(
        mode: ParseMode,
        chunk_id: &str,
        kind: &str,
        index: usize,
        reason: String,
    ) -> WeaveResult<()> {
        match mode {
            ParseMode::Strict => Err(WeaveError::malformed(
                chunk_id,
                format!("{} #{}: {}", kind, index, reason),
            )),
            ParseMode::Lenient => {
                tracing::warn!(chunk_id, kind, index, %reason, "Skipping invalid mention");
                Ok(())
            }
        }
    }

    /// First non-blank string among the given keys.
    fn text(value: &Value, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| value.get(*k))
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn required(value: &Value, keys: &[&str]) -> Result<String, String> {
        text(value, keys).ok_or_else(|| format!("missing '{}'", keys[0]))
    }

    fn attributes(value: &Value) -> super::Attributes {
        value
            .get("attributes")
            .or_else(|| value.get("properties"))
            .map(attributes_from_json)
            .unwrap_or_default()
    }

    pub fn entity(value: &Value) -> Result<EntityMention, String> {
        if !value.is_object() {
            return Err("not an object".to_string());
        }
        let name = required(value, &["name"])?;
        let entity_type = required(value, &["type", "entity_type", "entityType"])?;
        let mut entity = EntityMention::new(entity_type, name);
        entity.attributes = attributes(value);
        if let Some(desc) = text(value, &["description"]) {
            entity
                .attributes
                .entry("description".to_string())
                .or_insert_with(|| desc.into());
        }
        Ok(entity)
    }

    pub fn relationship(value: &Value) -> Result<RelationshipMention, String> {
        if !value.is_object() {
            return Err("not an object".to_string());
        }
        let relation = required(
            value,
            &["relation_type", "relation", "relationship_type", "relationshipType", "type"],
        )?;
        let source = required(value, &["source_name", "source", "from"])?;
        let target = required(value, &["target_name", "target", "to"])?;
        let mut rel = RelationshipMention::new(relation, source, target);
        rel.attributes = attributes(value);
        Ok(rel)
    }

    pub fn event(value: &Value) -> Result<EventMention, String> {
        if !value.is_object() {
            return Err("not an object".to_string());
        }
        let name = required(value, &["name", "label"])?;
        let event_type = text(value, &["type", "event_type"]).unwrap_or_default();
        let mut event = EventMention::new(event_type, name);
        event.attributes = attributes(value);
        if let Some(Value::Array(items)) = value.get("participants") {
            event.participants = items
                .iter()
                .filter_map(|p| p.as_str())
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(event)
    }
}
