//! Mermaid flowchart rendering.

use std::collections::{HashMap, HashSet};

use crate::graph::GraphStore;

/// Attribute keys left out of node labels.
const HIDDEN_ATTRIBUTES: &[&str] = &["description"];

/// Renders a graph as a Mermaid `graph TD` flowchart.
///
/// Node ids are reduced to `[A-Za-z0-9_]` and made unique; labels read
/// `"{type}: {name}"` followed by the node's attributes.
#[derive(Debug, Clone)]
pub struct MermaidRenderer {
    direction: String,
    show_attributes: bool,
}

impl Default for MermaidRenderer {
    fn default() -> Self {
        Self {
            direction: "TD".to_string(),
            show_attributes: true,
        }
    }
}

impl MermaidRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flowchart direction (`TD`, `LR`, ...).
    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = direction.into();
        self
    }

    /// Include attributes in node labels.
    pub fn with_attributes(mut self, show: bool) -> Self {
        self.show_attributes = show;
        self
    }

    /// Render the whole graph.
    pub fn render(&self, graph: &GraphStore) -> String {
        let mut lines = vec![
            format!("graph {}", self.direction),
            " %% =========================".to_string(),
            " %% Generated Graph".to_string(),
            " %% =========================".to_string(),
        ];

        let mut ids = MermaidIds::default();

        for node in graph.all_nodes() {
            let safe_id = ids.assign(&node.id);
            let mut label = format!("{}: {}", node.entity_type, node.name);

            if self.show_attributes {
                let parts: Vec<String> = node
                    .attributes
                    .iter()
                    .filter(|(k, _)| !HIDDEN_ATTRIBUTES.contains(&k.to_lowercase().as_str()))
                    .map(|(k, v)| format!("{}={}", k, v.display_joined()))
                    .collect();
                if !parts.is_empty() {
                    label.push_str("<br/><b>Tags/Attributes</b>: ");
                    label.push_str(&parts.join("; "));
                }
            }

            lines.push(format!(" {}[\"{}\"]", safe_id, escape_label(&label)));
        }

        lines.push(String::new());

        for edge in graph.all_edges() {
            let (Some(source), Some(target)) = (ids.get(&edge.source_id), ids.get(&edge.target_id))
            else {
                continue;
            };
            lines.push(format!(
                " {} -->|{}| {}",
                source,
                escape_edge_label(&edge.relation_type),
                target
            ));
        }

        lines.join("\n")
    }
}

/// Maps node keys to unique Mermaid-safe ids.
#[derive(Default)]
struct MermaidIds {
    assigned: HashMap<String, String>,
    taken: HashSet<String>,
}

impl MermaidIds {
    fn assign(&mut self, node_id: &str) -> String {
        if let Some(id) = self.assigned.get(node_id) {
            return id.clone();
        }
        let base = sanitize_id(node_id);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        self.taken.insert(candidate.clone());
        self.assigned.insert(node_id.to_string(), candidate.clone());
        candidate
    }

    fn get(&self, node_id: &str) -> Option<&str> {
        self.assigned.get(node_id).map(String::as_str)
    }
}

/// Reduce a node key to characters Mermaid accepts in a bare id.
fn sanitize_id(node_id: &str) -> String {
    let mut out = String::with_capacity(node_id.len());
    let mut last_underscore = false;
    for c in node_id.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_underscore = false;
        } else if !last_underscore && !out.is_empty() {
            out.push('_');
            last_underscore = true;
        }
    }
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "node".to_string()
    } else {
        trimmed.to_string()
    }
}

fn escape_label(label: &str) -> String {
    label.replace('"', "#quot;")
}

fn escape_edge_label(label: &str) -> String {
    label.replace('|', "/").replace('"', "#quot;")
}
