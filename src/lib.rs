//! # causal-adjust
//!
//! Enumerates covariate adjustment sets for estimating the causal effect of
//! treatments X on outcomes Y in a causal graph (DAG, CPDAG, MAG or PAG).
//!
//! ## Core Concepts
//!
//! - **Forbidden set**: nodes on or downstream of possibly-causal paths from X to Y
//! - **Candidate pool**: nodes near the endpoints, ordered by distance
//! - **Witness**: an open backdoor path given the current conditioning set
//! - **Adjustment set**: a locally-minimal conditioning set blocking every witness
//!
//! The engine grows a conditioning set by blocking witnesses one at a time,
//! trims it back to local minimality, and enumerates alternatives by banning
//! members of earlier solutions.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use causal_adjust::{AdjustmentEngine, AdjustmentQuery, MixedGraph};
//!
//! let graph = MixedGraph::from_edges(["U --> X", "U --> Y", "X --> Y"])?;
//! let engine = AdjustmentEngine::new(Arc::new(graph));
//!
//! let query = AdjustmentQuery::single("X", "Y")?;
//! let sets = engine.adjustment_sets(&query)?;
//! assert_eq!(sets[0].names(), ["U"]);
//! # Ok::<(), causal_adjust::AdjustError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod adjustment;
pub mod config;
pub mod error;
pub mod graph;
pub mod policy;
pub mod query;

// Search engine
pub mod search;

// Re-export primary types at crate root for convenience
pub use adjustment::{canonical_key, AdjustmentReport, AdjustmentSet, SearchStats};
pub use config::{DeadlineBehavior, EngineConfig, Limit, NearEndpoint};
pub use error::{AdjustError, AdjustResult, ExecutionError, GraphError, ValidationError};
pub use graph::{CausalGraph, Edge, Endpoint, GraphDocument, GraphType, MixedGraph, NodeId, NodeMask};
pub use policy::{ColliderPolicy, NoAmenablePolicy, WitnessRole};
pub use query::{AdjustmentQuery, AdjustmentQueryBuilder, Endpoints, Mode, DEFAULT_MAX_NUM_SETS};
pub use search::{AdjustmentEngine, ConditioningSet, PrecomputeContext, Shells};
