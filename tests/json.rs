mod common;

use std::sync::Arc;

use causal_adjust::{
    AdjustmentEngine, AdjustmentQuery, ColliderPolicy, EngineConfig, GraphType, Limit, MixedGraph, NearEndpoint,
};
use common::*;

const GRAPH_JSON: &str = r#"{
    "nodes": ["X", "Y", "U", "W"],
    "edges": ["X --> W", "W --> Y", "U --> X", "U --> Y"]
}"#;

#[test]
fn graph_document_drives_the_engine() {
    let g = MixedGraph::from_json(GRAPH_JSON).unwrap();
    let e = AdjustmentEngine::new(Arc::new(g));
    assert_eq!(keys(&e.adjustment_sets(&xy()).unwrap()), vec!["U"]);
}

#[test]
fn graph_survives_a_json_round_trip() {
    let original = graph(&CHAIN_AND_CONFOUNDER);
    let json = original.to_json_pretty().unwrap();
    let restored = MixedGraph::from_json(&json).unwrap();
    let before = keys(&AdjustmentEngine::new(Arc::new(original)).adjustment_sets(&xy()).unwrap());
    let after = keys(&AdjustmentEngine::new(Arc::new(restored)).adjustment_sets(&xy()).unwrap());
    assert_eq!(before, after);
}

#[test]
fn query_json_uses_names_and_signed_limits() {
    let q = AdjustmentQuery::from_json(
        r#"{
            "treatments": ["X"],
            "outcomes": ["Y"],
            "graph_type": "cpdag",
            "max_num_sets": 3,
            "max_radius": -1,
            "near": "treatment",
            "max_path_length": 4,
            "collider_policy": "PREFER_NONCOLLIDERS",
            "mode": { "not_followed": ["W"] }
        }"#,
    )
    .unwrap();
    assert_eq!(q.graph_type, GraphType::Pdag);
    assert_eq!(q.max_radius, Limit::Unbounded);
    assert_eq!(q.max_path_length, Limit::AtMost(4));
    assert_eq!(q.near, NearEndpoint::Treatment);
    assert_eq!(q.collider_policy, Some(ColliderPolicy::PreferNoncolliders));
    assert!(!q.mode.is_rb());

    let e = engine(&CHAIN_AND_CONFOUNDER);
    assert_eq!(e.run(&q).unwrap().keys(), vec!["U"]);

    let again = AdjustmentQuery::from_json(&q.to_json_pretty().unwrap()).unwrap();
    assert_eq!(again, q);
}

#[test]
fn invalid_query_json_is_rejected() {
    let err = AdjustmentQuery::from_json(r#"{"treatments": ["X"], "outcomes": ["X"]}"#).unwrap_err();
    assert!(err.is_validation());
    let err = AdjustmentQuery::from_json(r#"{"treatments": "X"}"#).unwrap_err();
    assert!(err.is_serialization());
}

#[test]
fn report_serializes_names_and_digests() {
    let e = engine(&PURE_FORK);
    let report = e.run(&xy()).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["request_id"], report.request_id.to_string());
    assert_eq!(json["sets"][0]["names"][0], "U");
    assert_eq!(json["sets"][0]["key"], "U");
    assert_eq!(json["sets"][0]["digest"].as_str().unwrap().len(), 64);
    assert_eq!(json["no_amenable_paths"], true);
    assert_eq!(json["stats"]["branches_explored"], 2);
}

#[test]
fn engine_config_from_json() {
    let config: EngineConfig =
        serde_json::from_str(r#"{"parallelism": 4, "collider_policy": "OFF", "no_amenable_policy": "SUPPRESS"}"#).unwrap();
    let e = AdjustmentEngine::with_config(Arc::new(graph(&PURE_FORK)), config).unwrap();
    assert_eq!(e.config().parallelism, 4);
    assert!(e.adjustment_sets(&xy()).unwrap().is_empty());
}
