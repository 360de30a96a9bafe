#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use causal_adjust::{AdjustmentEngine, AdjustmentQuery, AdjustmentSet, EngineConfig, MixedGraph};
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

/// X -> W -> Y with a confounder U.
pub const CHAIN_AND_CONFOUNDER: [&str; 4] = ["X --> W", "W --> Y", "U --> X", "U --> Y"];

/// X <- U -> Y and nothing else.
pub const PURE_FORK: [&str; 2] = ["U --> X", "U --> Y"];

/// X -> C <- Y and nothing else.
pub const COLLIDER: [&str; 2] = ["X --> C", "Y --> C"];

/// Two confounders and a direct effect.
pub const TWIN_CONFOUNDERS: [&str; 5] = ["U1 --> X", "U1 --> Y", "U2 --> X", "U2 --> Y", "X --> Y"];

/// Several backdoor routes, mediators, descendants and a collider.
pub const MIXED_DAG: [&str; 17] = [
    "X --> M",
    "M --> Y",
    "X --> Y",
    "M --> D",
    "Y --> E",
    "A --> X",
    "A --> B",
    "B --> Y",
    "C1 --> X",
    "C1 --> Y",
    "C2 --> X",
    "C2 --> C3",
    "C3 --> Y",
    "L --> A",
    "L --> C3",
    "X --> S",
    "Y --> S",
];

pub fn graph(edges: &[&str]) -> MixedGraph {
    MixedGraph::from_edges(edges.iter().copied()).unwrap()
}

pub fn engine(edges: &[&str]) -> AdjustmentEngine {
    AdjustmentEngine::new(Arc::new(graph(edges)))
}

pub fn engine_with(edges: &[&str], config: EngineConfig) -> AdjustmentEngine {
    AdjustmentEngine::with_config(Arc::new(graph(edges)), config).unwrap()
}

pub fn xy() -> AdjustmentQuery {
    AdjustmentQuery::single("X", "Y").unwrap()
}

/// Canonical keys of `sets`, in order.
pub fn keys(sets: &[AdjustmentSet]) -> Vec<String> {
    sets.iter().map(|s| s.key().to_string()).collect()
}
