mod common;

use causal_adjust::{AdjustmentQuery, ColliderPolicy, DeadlineBehavior, EngineConfig};
use common::*;

fn config(parallelism: usize) -> EngineConfig {
    EngineConfig {
        parallelism,
        ..EngineConfig::default()
    }
}

#[test]
fn parallel_branches_match_sequential_output() {
    let q = AdjustmentQuery::builder()
        .treatment("X")
        .outcome("Y")
        .max_num_sets(50)
        .build()
        .unwrap();
    for edges in [&MIXED_DAG[..], &TWIN_CONFOUNDERS[..], &["A --> X", "A --> B", "B --> Y", "X --> Y"][..]] {
        let seq = engine_with(edges, config(1)).run(&q).unwrap();
        for workers in [2, 4, 8] {
            let par = engine_with(edges, config(workers)).run(&q).unwrap();
            assert_eq!(par.keys(), seq.keys(), "{workers} workers");
            assert_eq!(par.stats, seq.stats, "{workers} workers");
        }
    }
}

#[test]
fn parallel_runs_respect_the_set_limit() {
    let q = AdjustmentQuery::builder()
        .treatment("X")
        .outcome("Y")
        .max_num_sets(1)
        .collider_policy(ColliderPolicy::PreferNoncolliders)
        .build()
        .unwrap();
    let seq = engine_with(&MIXED_DAG, config(1)).run(&q).unwrap();
    let par = engine_with(&MIXED_DAG, config(4)).run(&q).unwrap();
    assert_eq!(seq.sets.len(), 1);
    assert_eq!(par.keys(), seq.keys());
}

#[test]
fn generous_deadline_does_not_cut_the_search_short() {
    for behavior in [DeadlineBehavior::Partial, DeadlineBehavior::Cancel] {
        let e = engine_with(
            &MIXED_DAG,
            EngineConfig {
                max_duration_ms: Some(60_000),
                deadline_behavior: behavior,
                parallelism: 2,
                ..EngineConfig::default()
            },
        );
        let report = e.run(&xy()).unwrap();
        assert!(!report.timed_out);
        assert_eq!(report.keys(), engine(&MIXED_DAG).run(&xy()).unwrap().keys());
    }
}

#[test]
fn zero_parallelism_is_rejected() {
    let err = causal_adjust::AdjustmentEngine::with_config(std::sync::Arc::new(graph(&PURE_FORK)), config(0)).unwrap_err();
    assert!(err.is_validation());
}
