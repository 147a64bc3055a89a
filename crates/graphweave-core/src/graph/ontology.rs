//! Minimal ontology: entity types, relation vocabulary and alias tables.
//!
//! The ontology only decides identity. It maps the many spellings an
//! extractor may use for a type or relation onto one canonical form, and
//! optionally folds alias names onto a canonical entity name. It performs
//! no schema validation beyond that.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use super::resolver::normalize_name;

/// Entity categories.
///
/// Known categories accept common synonyms (see [`EntityType::from_str_flexible`]);
/// anything else is kept as [`EntityType::Other`] so that type stays part of
/// identity instead of collapsing into a catch-all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    /// A person (e.g., "Jane Doe").
    Person,
    /// A company or other organization (e.g., "Acme Inc.").
    Organization,
    /// A physical location.
    Location,
    /// A product (e.g., "Swiggy One").
    Product,
    /// A service offered by an organization (e.g., "Food Delivery").
    Service,
    /// An abstract platform layer (e.g., "Unified Platform").
    Platform,
    /// A foundational capability (e.g., "Analytics").
    Capability,
    /// A partner category (e.g., "Delivery Partners").
    Partner,
    /// A feature of a product or service.
    Feature,
    /// A project or initiative.
    Project,
    /// An abstract concept or topic.
    Concept,
    /// A dated occurrence: launch, acquisition, IPO.
    Event,
    /// Any other declared category, normalized to snake_case.
    Other(String),
}

impl EntityType {
    /// Parse an entity type with flexible matching.
    ///
    /// Handles case, surrounding whitespace and common synonyms such as
    /// "company" or "acquisition target" for [`EntityType::Organization`].
    /// Returns `None` for blank input only.
    pub fn from_str_flexible(s: &str) -> Option<Self> {
        let normalized = normalize_label(s);

        let parsed = match normalized.as_str() {
            "" => return None,

            "person" | "per" | "people" | "individual" | "human" | "founder" => Self::Person,

            "organization" | "org" | "organisation" | "company" | "corporation"
            | "institution" | "business" | "firm" | "agency" | "acquisition_target" => {
                Self::Organization
            }

            "location" | "loc" | "place" | "address" | "city" | "country" | "region" => {
                Self::Location
            }

            "product" | "offering" | "membership" => Self::Product,

            "service" | "business_line" | "vertical" => Self::Service,

            "platform" => Self::Platform,

            "capability" | "competency" | "technology" => Self::Capability,

            "partner" | "partners" | "partner_category" => Self::Partner,

            "feature" | "benefit" => Self::Feature,

            "project" | "initiative" | "program" | "programme" | "campaign" => Self::Project,

            "concept" | "idea" | "topic" | "theme" => Self::Concept,

            "event" | "milestone" | "launch" | "acquisition" | "ipo" => Self::Event,

            other => Self::Other(other.to_string()),
        };
        Some(parsed)
    }

    /// Get all built-in entity type variants.
    pub fn all() -> &'static [EntityType] {
        &[
            Self::Person,
            Self::Organization,
            Self::Location,
            Self::Product,
            Self::Service,
            Self::Platform,
            Self::Capability,
            Self::Partner,
            Self::Feature,
            Self::Project,
            Self::Concept,
            Self::Event,
        ]
    }

    /// Convert to string for keys, prompts and display.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Person => "person",
            Self::Organization => "organization",
            Self::Location => "location",
            Self::Product => "product",
            Self::Service => "service",
            Self::Platform => "platform",
            Self::Capability => "capability",
            Self::Partner => "partner",
            Self::Feature => "feature",
            Self::Project => "project",
            Self::Concept => "concept",
            Self::Event => "event",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_flexible(s).ok_or_else(|| format!("Unknown entity type: {:?}", s))
    }
}

impl Serialize for EntityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Relation vocabulary the extraction prompt steers towards.
///
/// Relations outside it are still accepted; they are only logged.
pub const KNOWN_RELATIONS: &[&str] = &[
    "operates",
    "offers",
    "encompasses",
    "enabled_by",
    "supported_by",
    "includes",
    "integrated_surface",
    "executed_via",
    "acquired",
    "has_event",
    "launched",
    "milestone_for",
    "described_in",
    "founded_by",
    "works_at",
    "part_of",
    "related_to",
    "benefits_across",
    "feature",
    "events_experiences_surface",
    "expanded_surface",
];

/// Relation used to link event participants to the event node.
pub const EVENT_PARTICIPANT_RELATION: &str = "has_event";

/// Normalize a type or relation label: trim, lowercase, and turn runs of
/// spaces and hyphens into single underscores.
pub fn normalize_label(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Alias tables loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OntologyConfig {
    /// Extra type spellings, e.g. `"startup" = "organization"`.
    pub type_aliases: BTreeMap<String, String>,
    /// Alternative entity names, e.g. `"Swiggy Limited" = "Swiggy"`.
    pub name_aliases: BTreeMap<String, String>,
    /// Relation spellings, e.g. `"runs" = "operates"`.
    pub relation_aliases: BTreeMap<String, String>,
}

/// Resolved ontology used by the identity resolver.
#[derive(Debug, Clone, Default)]
pub struct Ontology {
    type_aliases: HashMap<String, EntityType>,
    name_aliases: HashMap<String, String>,
    relation_aliases: HashMap<String, String>,
}

impl Ontology {
    /// Build an ontology from configuration.
    pub fn new(config: &OntologyConfig) -> Self {
        let type_aliases = config
            .type_aliases
            .iter()
            .filter_map(|(alias, target)| {
                let target = EntityType::from_str_flexible(target)?;
                Some((normalize_label(alias), target))
            })
            .collect();

        let name_aliases = config
            .name_aliases
            .iter()
            .map(|(alias, canonical)| (normalize_name(alias), normalize_name(canonical)))
            .filter(|(alias, canonical)| !alias.is_empty() && !canonical.is_empty())
            .collect();

        let relation_aliases = config
            .relation_aliases
            .iter()
            .map(|(alias, canonical)| (normalize_label(alias), normalize_label(canonical)))
            .filter(|(alias, canonical)| !alias.is_empty() && !canonical.is_empty())
            .collect();

        Self {
            type_aliases,
            name_aliases,
            relation_aliases,
        }
    }

    /// Resolve a declared type. Configured aliases win over built-in synonyms.
    pub fn resolve_type(&self, raw: &str) -> Option<EntityType> {
        let label = normalize_label(raw);
        if let Some(t) = self.type_aliases.get(&label) {
            return Some(t.clone());
        }
        EntityType::from_str_flexible(&label)
    }

    /// Map a normalized entity name onto its canonical normalized name.
    pub fn canonical_name<'a>(&'a self, normalized: &'a str) -> &'a str {
        self.name_aliases
            .get(normalized)
            .map(String::as_str)
            .unwrap_or(normalized)
    }

    /// Resolve a relation label to its canonical snake_case form.
    pub fn resolve_relation(&self, raw: &str) -> String {
        let label = normalize_label(raw);
        match self.relation_aliases.get(&label) {
            Some(canonical) => canonical.clone(),
            None => label,
        }
    }

    /// Check if a (resolved) relation belongs to the prompt vocabulary.
    pub fn is_known_relation(&self, relation: &str) -> bool {
        KNOWN_RELATIONS.contains(&relation)
    }
}
