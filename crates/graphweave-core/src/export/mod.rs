//! Read-only exports of a finished graph.
//!
//! Supports pretty-printed JSON (`{"nodes": [...], "edges": [...]}`) and
//! Mermaid `graph TD` flowcharts.
//!
//! # Example
//!
//! ```ignore
//! use graphweave_core::export::{json, MermaidRenderer};
//!
//! let file = tokio::fs::File::create("output/graph.json").await?;
//! let stats = json::write_json(pipeline.graph(), file).await?;
//! let diagram = MermaidRenderer::new().render(pipeline.graph());
//! ```

pub mod json;
pub mod mermaid;

pub use json::{to_json_string, write_json, ExportStats, GraphExport};
pub use mermaid::MermaidRenderer;
