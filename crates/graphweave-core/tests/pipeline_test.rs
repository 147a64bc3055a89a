//! Integration tests for the pipeline driver.

use async_trait::async_trait;
use graphweave_core::{
    Chunk, EntityMention, ExtractionRecord, Extractor, MergeEngine, Pipeline, PipelineConfig,
    RelationshipMention, WeaveError, WeaveResult,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Extractor serving canned records; chunks listed in `failing` error out.
struct MockExtractor {
    records: HashMap<String, ExtractionRecord>,
    failing: Vec<String>,
}

impl MockExtractor {
    fn new(records: Vec<ExtractionRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.chunk_id.clone(), r))
                .collect(),
            failing: Vec::new(),
        }
    }

    fn failing(mut self, chunk_id: &str) -> Self {
        self.failing.push(chunk_id.to_string());
        self
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn extract(&self, chunk: &Chunk) -> WeaveResult<ExtractionRecord> {
        if self.failing.contains(&chunk.id) {
            return Err(WeaveError::extraction("upstream unavailable"));
        }
        Ok(self
            .records
            .get(&chunk.id)
            .cloned()
            .unwrap_or_else(|| ExtractionRecord::new(chunk.id.clone())))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn chunks(ids: &[&str]) -> Vec<Chunk> {
    ids.iter().map(|id| Chunk::new(*id, format!("text {}", id))).collect()
}

fn records() -> Vec<ExtractionRecord> {
    vec![
        ExtractionRecord::new("1")
            .with_entity(EntityMention::new("Company", "Swiggy"))
            .with_entity(EntityMention::new("Service", "Food Delivery"))
            .with_relationship(RelationshipMention::new("offers", "Swiggy", "Food Delivery")),
        ExtractionRecord::new("2")
            .with_entity(EntityMention::new("Service", "Instamart"))
            .with_relationship(RelationshipMention::new("offers", "Swiggy", "Instamart"))
            .with_relationship(RelationshipMention::new("offers", "Zomato", "Instamart")),
        // Entity without a type: malformed
        ExtractionRecord::new("3").with_entity(EntityMention::new(" ", "Genie")),
    ]
}

fn pipeline(extractor: MockExtractor) -> Pipeline {
    Pipeline::new(Arc::new(extractor), MergeEngine::default())
}

#[tokio::test]
async fn test_run_merges_in_order_and_reports() {
    let mut pipeline = pipeline(MockExtractor::new(records()));
    let report = pipeline.run(&chunks(&["1", "2", "3", "4"])).await.unwrap();

    assert_eq!(report.total_chunks, 4);
    assert_eq!(report.processed_chunks, 3);
    assert_eq!(report.failed_chunks, 1);
    assert_eq!(report.failures[0].chunk_id, "3");
    assert_eq!(report.failures[0].code, "REC_001");
    assert_eq!(report.unresolved_references.len(), 1);
    assert_eq!(report.unresolved_references[0].missing_endpoint, "Zomato");
    assert_eq!(report.node_count, 3);
    assert_eq!(report.edge_count, 2);

    let graph = pipeline.graph();
    let ids: Vec<&str> = graph.all_nodes().map(|n| n.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["organization:swiggy", "service:food delivery", "service:instamart"]
    );
    assert!(graph.get_node("service:genie").is_err());
}

#[tokio::test]
async fn test_extraction_failure_skips_chunk() {
    let mut pipeline = pipeline(MockExtractor::new(records()).failing("1"));
    let report = pipeline.run(&chunks(&["1", "2"])).await.unwrap();

    assert_eq!(report.failed_chunks, 1);
    assert_eq!(report.failures[0].code, "EXT_002");
    // Chunk 1 never declared Swiggy, so chunk 2 cannot link it either.
    assert_eq!(report.unresolved_references.len(), 2);
    assert_eq!(pipeline.graph().node_count(), 1);
}

#[tokio::test]
async fn test_all_chunks_failed() {
    let mut pipeline = pipeline(MockExtractor::new(vec![]).failing("1").failing("2"));
    let err = pipeline.run(&chunks(&["1", "2"])).await.unwrap_err();
    assert!(matches!(err, WeaveError::AllChunksFailed { total: 2 }));
}

#[tokio::test]
async fn test_no_chunks_is_an_empty_run() {
    let mut pipeline = pipeline(MockExtractor::new(vec![]));
    let report = pipeline.run(&[]).await.unwrap();
    assert_eq!(report.total_chunks, 0);
    assert!(pipeline.into_graph().is_empty());
}

#[tokio::test]
async fn test_write_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("out");

    let mut pipeline = pipeline(MockExtractor::new(records()));
    let report = pipeline.run(&chunks(&["1", "2"])).await.unwrap();
    let paths = pipeline
        .write_outputs(&report, &output_dir, true, true)
        .await
        .unwrap();

    let json = std::fs::read_to_string(&paths.json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["nodes"].as_array().unwrap().len(), 3);

    let mermaid = std::fs::read_to_string(paths.mermaid.unwrap()).unwrap();
    assert!(mermaid.starts_with("graph TD"));
    assert!(mermaid.contains("-->|offers|"));

    let diagnostics = std::fs::read_to_string(paths.diagnostics.unwrap()).unwrap();
    let diagnostics: serde_json::Value = serde_json::from_str(&diagnostics).unwrap();
    assert_eq!(diagnostics["unresolved_references"][0]["missing_endpoint"], "Zomato");
}

#[tokio::test]
async fn test_write_outputs_json_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::builder()
        .output_dir(dir.path())
        .write_mermaid(false)
        .write_diagnostics(false)
        .build();

    let mut pipeline = Pipeline::from_config(&config, Arc::new(MockExtractor::new(records())));
    let report = pipeline.run(&chunks(&["1"])).await.unwrap();
    let paths = pipeline
        .write_outputs(&report, &config.output_dir, config.write_mermaid, config.write_diagnostics)
        .await
        .unwrap();

    assert!(paths.json.exists());
    assert!(paths.mermaid.is_none());
    assert!(!dir.path().join("graph.mmd").exists());
}

#[tokio::test]
async fn test_runs_are_byte_identical() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    for dir in [&dir_a, &dir_b] {
        let mut pipeline = pipeline(MockExtractor::new(records()));
        let report = pipeline.run(&chunks(&["1", "2", "3"])).await.unwrap();
        pipeline.write_outputs(&report, dir.path(), true, false).await.unwrap();
    }

    for file in ["graph.json", "graph.mmd"] {
        assert_eq!(
            std::fs::read(dir_a.path().join(file)).unwrap(),
            std::fs::read(dir_b.path().join(file)).unwrap()
        );
    }
}
