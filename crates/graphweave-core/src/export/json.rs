//! JSON export for graph data.
//!
//! The document is a single pretty-printed object with `nodes` and `edges`
//! arrays in first-insertion order. Attribute maps are ordered by key, so the
//! same run always produces the same bytes.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::error::WeaveResult;
use crate::graph::{Edge, GraphStore, Node};

/// Statistics from an export operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportStats {
    /// Nodes written.
    pub nodes: usize,
    /// Edges written.
    pub edges: usize,
    /// Bytes written.
    pub bytes: usize,
}

/// Graph data in export format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl From<&GraphStore> for GraphExport {
    fn from(graph: &GraphStore) -> Self {
        Self {
            nodes: graph.all_nodes().cloned().collect(),
            edges: graph.all_edges().cloned().collect(),
        }
    }
}

/// Serialize a graph to pretty-printed JSON.
pub fn to_json_string(graph: &GraphStore) -> WeaveResult<String> {
    Ok(serde_json::to_string_pretty(&GraphExport::from(graph))?)
}

/// Write a graph as pretty-printed JSON.
///
/// Uses buffered writing and flushes before returning.
pub async fn write_json<W>(graph: &GraphStore, writer: W) -> WeaveResult<ExportStats>
where
    W: AsyncWrite + Unpin,
{
    let json = to_json_string(graph)?;
    let mut writer = BufWriter::new(writer);
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    Ok(ExportStats {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        bytes: json.len() + 1,
    })
}
