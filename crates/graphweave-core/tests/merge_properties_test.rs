//! Integration tests for merge engine properties across records.

use graphweave_core::export::to_json_string;
use graphweave_core::{
    AttributeValue, EntityMention, EntityType, EventMention, ExtractionRecord, GraphStore,
    MergeEngine, RelationshipMention, Scalar,
};
use std::collections::BTreeSet;

fn corpus() -> Vec<ExtractionRecord> {
    vec![
        ExtractionRecord::new("1")
            .with_entity(
                EntityMention::new("Company", "Swiggy")
                    .with_attribute("founded", 2014_i64)
                    .with_attribute("tags", AttributeValue::List(vec!["Strategy".into()])),
            )
            .with_entity(EntityMention::new("Platform", "Unified Platform"))
            .with_relationship(RelationshipMention::new("operates", "Swiggy", "Unified Platform")),
        ExtractionRecord::new("2")
            .with_entity(EntityMention::new("Service", "Instamart").with_attribute("year", 2020_i64))
            .with_relationship(RelationshipMention::new("encompasses", "Unified Platform", "Instamart"))
            .with_relationship(RelationshipMention::new("offers", "Swiggy", "Instamart")),
        ExtractionRecord::new("3")
            .with_entity(
                EntityMention::new("company", "swiggy")
                    .with_attribute("founded", 2013_i64)
                    .with_attribute("tags", AttributeValue::List(vec!["Culture".into()])),
            )
            .with_entity(EntityMention::new("Company", "Dineout"))
            .with_relationship(RelationshipMention::new("acquired", "Swiggy", "Dineout"))
            .with_event(
                EventMention::new("acquisition", "Acquire Dineout (2022)")
                    .with_attribute("year", 2022_i64)
                    .with_participant("Swiggy")
                    .with_participant("Dineout"),
            ),
    ]
}

fn build(records: &[ExtractionRecord]) -> GraphStore {
    let engine = MergeEngine::default();
    let mut graph = GraphStore::new();
    for record in records {
        engine.process_record(&mut graph, record).unwrap();
    }
    graph
}

fn node_ids(graph: &GraphStore) -> BTreeSet<String> {
    graph.all_nodes().map(|n| n.id.clone()).collect()
}

fn edge_ids(graph: &GraphStore) -> BTreeSet<String> {
    graph.all_edges().map(|e| e.id.clone()).collect()
}

#[test]
fn test_reprocessing_every_record_is_idempotent() {
    let records = corpus();
    let engine = MergeEngine::default();
    let mut graph = GraphStore::new();
    for record in &records {
        engine.process_record(&mut graph, record).unwrap();
    }
    let first = to_json_string(&graph).unwrap();

    for record in &records {
        let outcome = engine.process_record(&mut graph, record).unwrap();
        assert_eq!(outcome.nodes_created, 0);
        assert_eq!(outcome.edges_created, 0);
    }
    assert_eq!(to_json_string(&graph).unwrap(), first);
}

#[test]
fn test_same_input_gives_identical_export() {
    let a = to_json_string(&build(&corpus())).unwrap();
    let b = to_json_string(&build(&corpus())).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_key_sets_are_order_independent() {
    let forward = build(&corpus());
    let mut reversed_records = corpus();
    reversed_records.reverse();

    // Each record declares the entities it references, so reversing the order
    // still resolves every endpoint.
    let mut self_contained = Vec::new();
    for record in reversed_records {
        let mut record = record;
        if record.chunk_id == "2" {
            record = record
                .with_entity(EntityMention::new("Company", "Swiggy"))
                .with_entity(EntityMention::new("Platform", "Unified Platform"));
        }
        self_contained.push(record);
    }
    let reversed = build(&self_contained);

    assert_eq!(node_ids(&forward), node_ids(&reversed));
    assert_eq!(edge_ids(&forward), edge_ids(&reversed));

    let founded_forward = &forward.get_node("organization:swiggy").unwrap().attributes["founded"];
    let founded_reversed = &reversed.get_node("organization:swiggy").unwrap().attributes["founded"];
    assert_eq!(
        founded_forward,
        &AttributeValue::List(vec![Scalar::Integer(2014), Scalar::Integer(2013)])
    );
    assert_eq!(
        founded_reversed,
        &AttributeValue::List(vec![Scalar::Integer(2013), Scalar::Integer(2014)])
    );
}

#[test]
fn test_no_orphan_edges() {
    let graph = build(&corpus());
    assert!(graph.check_invariants().is_ok());
    for edge in graph.all_edges() {
        assert!(graph.get_node(&edge.source_id).is_ok());
        assert!(graph.get_node(&edge.target_id).is_ok());
        assert!(graph.edges_between(&edge.source_id, &edge.target_id).contains(&edge.id));
    }
}

#[test]
fn test_lossless_conflict_merge() {
    let graph = build(&[
        ExtractionRecord::new("1").with_entity(EntityMention::new("Organization", "Acme").with_attribute("founded", 1998_i64)),
        ExtractionRecord::new("2").with_entity(EntityMention::new("Organization", "Acme").with_attribute("founded", 2001_i64)),
    ]);
    let node = graph.get_node("organization:acme").unwrap();
    assert_eq!(
        node.attributes["founded"],
        AttributeValue::List(vec![Scalar::Integer(1998), Scalar::Integer(2001)])
    );
    assert_eq!(node.sources.iter().collect::<Vec<_>>(), vec!["1", "2"]);
}

#[test]
fn test_case_folded_names_merge_into_one_node() {
    let graph = build(&[
        ExtractionRecord::new("1").with_entity(EntityMention::new("Organization", "Acme Inc.")),
        ExtractionRecord::new("2").with_entity(EntityMention::new("Organization", "acme inc")),
    ]);
    assert_eq!(graph.node_count(), 1);
    let node = graph.get_node("organization:acme inc").unwrap();
    assert_eq!(node.name, "Acme Inc.");
    assert_eq!(node.sources.len(), 2);
}

#[test]
fn test_never_mentioned_endpoint_is_reported_once() {
    let engine = MergeEngine::default();
    let mut graph = GraphStore::new();
    let outcome = engine
        .process_record(
            &mut graph,
            &ExtractionRecord::new("1")
                .with_entity(EntityMention::new("Organization", "Acme"))
                .with_relationship(RelationshipMention::new("partnered_with", "Acme", "Initech")),
        )
        .unwrap();

    assert_eq!(outcome.unresolved.len(), 1);
    assert_eq!(outcome.unresolved[0].missing_endpoint, "Initech");
    assert_eq!(outcome.unresolved[0].relation_type, "partnered_with");
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_type_synonym_merges_without_conflict() {
    let engine = MergeEngine::default();
    let mut graph = GraphStore::new();
    engine
        .process_record(
            &mut graph,
            &ExtractionRecord::new("1").with_entity(EntityMention::new("Organization", "Acme")),
        )
        .unwrap();
    let outcome = engine
        .process_record(
            &mut graph,
            &ExtractionRecord::new("2").with_entity(EntityMention::new("Company", "Acme")),
        )
        .unwrap();

    // "Company" resolves to the same type, so there is no conflict.
    assert!(outcome.type_conflicts.is_empty());
    assert_eq!(graph.node_count(), 1);
    assert_eq!(
        graph.get_node("organization:acme").unwrap().entity_type,
        EntityType::Organization
    );
}

#[test]
fn test_same_name_with_other_type_is_flagged() {
    let engine = MergeEngine::default();
    let mut graph = GraphStore::new();
    engine
        .process_record(
            &mut graph,
            &ExtractionRecord::new("1").with_entity(EntityMention::new("Company", "Swiggy")),
        )
        .unwrap();
    let second = ExtractionRecord::new("2")
        .with_entity(EntityMention::new("Product", "Swiggy"))
        .with_entity(EntityMention::new("Service", "Instamart"))
        .with_relationship(RelationshipMention::new("offers", "Swiggy", "Instamart"));
    let outcome = engine.process_record(&mut graph, &second).unwrap();

    assert_eq!(outcome.type_conflicts.len(), 1);
    let conflict = &outcome.type_conflicts[0];
    assert_eq!(conflict.chunk_id, "2");
    assert_eq!(conflict.node_id, "product:swiggy");
    assert_eq!(conflict.existing_type, "organization");
    assert_eq!(conflict.incoming_type, "product");

    // Both nodes stay distinct.
    assert_eq!(graph.node_count(), 3);
    assert!(graph.get_node("organization:swiggy").is_ok());
    assert!(graph.get_node("product:swiggy").is_ok());

    let again = engine.process_record(&mut graph, &second).unwrap();
    assert!(again.type_conflicts.is_empty());
    assert_eq!(graph.node_count(), 3);
}

#[test]
fn test_events_link_participants() {
    let graph = build(&corpus());
    let event_id = "event:acquire dineout 2022";
    let event = graph.get_node(event_id).unwrap();
    assert_eq!(event.entity_type, EntityType::Event);
    assert_eq!(event.attributes["event_type"], AttributeValue::from("acquisition"));

    let incoming = graph.neighbors(event_id).unwrap().incoming;
    assert_eq!(
        incoming,
        vec![
            "organization:swiggy-[has_event]->event:acquire dineout 2022".to_string(),
            "organization:dineout-[has_event]->event:acquire dineout 2022".to_string(),
        ]
    );
}
