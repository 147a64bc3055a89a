//! Pipeline driver: extract every chunk, merge it, export the result.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::error::{WeaveError, WeaveResult};
use crate::export::{json, MermaidRenderer};
use crate::graph::{GraphStore, MergeEngine, RecordOutcome, TypeConflict, UnresolvedReference};
use crate::traits::Extractor;
use crate::types::Chunk;

/// A chunk that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkFailure {
    pub chunk_id: String,
    pub code: &'static str,
    pub error: String,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub total_chunks: usize,
    pub processed_chunks: usize,
    pub failed_chunks: usize,
    pub failures: Vec<ChunkFailure>,
    pub unresolved_references: Vec<UnresolvedReference>,
    pub type_conflicts: Vec<TypeConflict>,
    /// Chunks whose remaining relationships were dropped after a consistency error.
    pub aborted_chunks: Vec<String>,
    pub node_count: usize,
    pub edge_count: usize,
}

impl RunReport {
    fn record(&mut self, outcome: RecordOutcome) {
        self.processed_chunks += 1;
        if outcome.aborted.is_some() {
            self.aborted_chunks.push(outcome.chunk_id.clone());
        }
        self.unresolved_references.extend(outcome.unresolved);
        self.type_conflicts.extend(outcome.type_conflicts);
    }

    fn fail(&mut self, chunk_id: &str, err: &WeaveError) {
        self.failed_chunks += 1;
        self.failures.push(ChunkFailure {
            chunk_id: chunk_id.to_string(),
            code: err.code().as_str(),
            error: err.to_string(),
        });
    }
}

/// Files written by [`Pipeline::write_outputs`].
#[derive(Debug, Clone, Default)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub mermaid: Option<PathBuf>,
    pub diagnostics: Option<PathBuf>,
}

/// Drives extraction and merging over an ordered list of chunks.
pub struct Pipeline {
    extractor: Arc<dyn Extractor>,
    engine: MergeEngine,
    graph: GraphStore,
}

impl Pipeline {
    /// Create a pipeline with an empty graph.
    pub fn new(extractor: Arc<dyn Extractor>, engine: MergeEngine) -> Self {
        Self {
            extractor,
            engine,
            graph: GraphStore::new(),
        }
    }

    /// Create a pipeline using the merge and ontology settings of `config`.
    pub fn from_config(config: &PipelineConfig, extractor: Arc<dyn Extractor>) -> Self {
        Self::new(
            extractor,
            MergeEngine::from_config(&config.ontology, config.merge.clone()),
        )
    }

    /// Get the accumulated graph.
    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    /// Consume the pipeline and return the graph.
    pub fn into_graph(self) -> GraphStore {
        self.graph
    }

    pub fn engine(&self) -> &MergeEngine {
        &self.engine
    }

    /// Process chunks strictly in order.
    ///
    /// Chunk-scoped failures are logged and recorded in the report. The run
    /// fails only on a global error, or when every chunk failed.
    pub async fn run(&mut self, chunks: &[Chunk]) -> WeaveResult<RunReport> {
        tracing::info!(
            chunks = chunks.len(),
            extractor = self.extractor.name(),
            "Starting pipeline run"
        );

        let mut report = RunReport {
            total_chunks: chunks.len(),
            ..Default::default()
        };

        for chunk in chunks {
            tracing::info!(chunk_id = %chunk.id, "Processing chunk");
            match self.process_chunk(chunk).await {
                Ok(outcome) => {
                    tracing::info!(
                        chunk_id = %chunk.id,
                        touched = outcome.touched(),
                        unresolved = outcome.unresolved.len(),
                        "Merged chunk"
                    );
                    report.record(outcome);
                }
                Err(err) if err.is_chunk_scoped() => {
                    tracing::error!(chunk_id = %chunk.id, error = %err, "Skipping chunk");
                    report.fail(&chunk.id, &err);
                }
                Err(err) => return Err(err),
            }
        }

        if report.total_chunks > 0 && report.failed_chunks == report.total_chunks {
            return Err(WeaveError::AllChunksFailed {
                total: report.total_chunks,
            });
        }

        report.node_count = self.graph.node_count();
        report.edge_count = self.graph.edge_count();
        tracing::info!(
            processed = report.processed_chunks,
            failed = report.failed_chunks,
            nodes = report.node_count,
            edges = report.edge_count,
            unresolved = report.unresolved_references.len(),
            "Pipeline run complete"
        );
        Ok(report)
    }

    async fn process_chunk(&mut self, chunk: &Chunk) -> WeaveResult<RecordOutcome> {
        let record = self.extractor.extract(chunk).await?;
        if record.chunk_id != chunk.id {
            tracing::warn!(
                chunk_id = %chunk.id,
                record_chunk_id = %record.chunk_id,
                "Extractor returned a record for a different chunk id"
            );
        }
        self.engine.process_record(&mut self.graph, &record)
    }

    /// Write `graph.json`, and optionally `graph.mmd` and `diagnostics.json`,
    /// into `output_dir`.
    pub async fn write_outputs(
        &self,
        report: &RunReport,
        output_dir: &Path,
        write_mermaid: bool,
        write_diagnostics: bool,
    ) -> WeaveResult<OutputPaths> {
        tokio::fs::create_dir_all(output_dir).await?;

        let json_path = output_dir.join("graph.json");
        let file = tokio::fs::File::create(&json_path).await?;
        let stats = json::write_json(&self.graph, file).await?;
        tracing::info!(path = %json_path.display(), bytes = stats.bytes, "Graph JSON saved");

        let mut paths = OutputPaths {
            json: json_path,
            ..Default::default()
        };

        if write_mermaid {
            let path = output_dir.join("graph.mmd");
            tokio::fs::write(&path, MermaidRenderer::new().render(&self.graph)).await?;
            tracing::info!(path = %path.display(), "Mermaid graph saved");
            paths.mermaid = Some(path);
        }

        if write_diagnostics {
            let path = output_dir.join("diagnostics.json");
            tokio::fs::write(&path, serde_json::to_string_pretty(report)?).await?;
            tracing::info!(path = %path.display(), "Diagnostics saved");
            paths.diagnostics = Some(path);
        }

        Ok(paths)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("extractor", &self.extractor.name())
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}
