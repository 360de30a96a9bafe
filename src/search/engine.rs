//! The adjustment engine façade.

use std::sync::Arc;

use tracing::{debug, debug_span, warn};

use super::context::PrecomputeContext;
use super::deadline::Deadline;
use super::enumerate::{enumerate, enumerate_parallel};
use super::forbidden::forbidden_set;
use super::solver::{ConditioningSet, Solver};
use super::witness::find_witness;
use crate::adjustment::{AdjustmentReport, AdjustmentSet, SearchStats};
use crate::config::{DeadlineBehavior, EngineConfig};
use crate::error::{AdjustResult, ExecutionError};
use crate::graph::{CausalGraph, NodeId};
use crate::policy::{ColliderPolicy, NoAmenablePolicy};
use crate::query::{AdjustmentQuery, Endpoints};

/// Enumerates covariate adjustment sets over one causal graph.
///
/// The graph is shared read-only; policies and limits live in the engine's
/// own [`EngineConfig`], so two engines never affect each other.
#[derive(Clone)]
pub struct AdjustmentEngine {
    graph: Arc<dyn CausalGraph>,
    config: EngineConfig,
}

impl std::fmt::Debug for AdjustmentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdjustmentEngine")
            .field("nodes", &self.graph.node_count())
            .field("config", &self.config)
            .finish()
    }
}

impl AdjustmentEngine {
    /// Create an engine with the default configuration.
    #[must_use]
    pub fn new(graph: Arc<dyn CausalGraph>) -> Self {
        Self {
            graph,
            config: EngineConfig::default(),
        }
    }

    /// Create an engine with an explicit configuration.
    pub fn with_config(graph: Arc<dyn CausalGraph>, config: EngineConfig) -> AdjustResult<Self> {
        config.validate()?;
        Ok(Self { graph, config })
    }

    /// Sets the blocker ranking policy for this engine.
    pub fn set_collider_policy(&mut self, policy: ColliderPolicy) -> &mut Self {
        self.config.collider_policy = policy;
        self
    }

    /// Sets the no-amenable-path policy for this engine.
    pub fn set_no_amenable_policy(&mut self, policy: NoAmenablePolicy) -> &mut Self {
        self.config.no_amenable_policy = policy;
        self
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The graph queries run against.
    #[must_use]
    pub fn graph(&self) -> &dyn CausalGraph {
        self.graph.as_ref()
    }

    /// Enumerates adjustment sets and reports how the search went.
    pub fn run(&self, query: &AdjustmentQuery) -> AdjustResult<AdjustmentReport> {
        let deadline = Deadline::from_budget(self.config.max_duration());
        self.run_until(query, &deadline)
    }

    fn run_until(&self, query: &AdjustmentQuery, deadline: &Deadline) -> AdjustResult<AdjustmentReport> {
        let span = debug_span!("adjustment_query", request_id = %query.request_id);
        let _guard = span.enter();

        let graph = self.graph.as_ref();
        let ctx = match PrecomputeContext::build(graph, query, deadline) {
            Ok(ctx) => ctx,
            Err(e) if e.is_timeout() && self.config.deadline_behavior == DeadlineBehavior::Partial => {
                warn!("deadline expired while building the candidate pool");
                return Ok(AdjustmentReport {
                    request_id: query.request_id,
                    sets: Vec::new(),
                    stats: SearchStats::default(),
                    no_amenable_paths: false,
                    timed_out: true,
                });
            }
            Err(e) => return Err(e),
        };

        let collider_policy = query.collider_policy.unwrap_or(self.config.collider_policy);
        let solver = Solver::new(graph, &ctx, collider_policy, self.config.no_amenable_policy, deadline);
        let found = if self.config.parallelism > 1 {
            enumerate_parallel(&solver, graph, query.max_num_sets, self.config.parallelism, deadline)?
        } else {
            enumerate(&solver, graph, query.max_num_sets, deadline)?
        };

        if found.timed_out && self.config.deadline_behavior == DeadlineBehavior::Cancel {
            return Err(ExecutionError::Timeout {
                duration_ms: self.config.max_duration_ms.unwrap_or(0),
            }
            .into());
        }

        debug!(
            sets = found.sets.len(),
            branches = found.stats.branches_explored,
            timed_out = found.timed_out,
            "enumeration finished"
        );
        Ok(AdjustmentReport {
            request_id: query.request_id,
            sets: found.sets,
            stats: found.stats,
            no_amenable_paths: !ctx.has_amenable_paths(),
            timed_out: found.timed_out,
        })
    }

    /// Enumerates adjustment sets in discovery order.
    pub fn adjustment_sets(&self, query: &AdjustmentQuery) -> AdjustResult<Vec<AdjustmentSet>> {
        Ok(self.run(query)?.sets)
    }

    /// True if some amenable path connects a treatment to an outcome.
    pub fn has_amenable_paths(&self, query: &AdjustmentQuery) -> AdjustResult<bool> {
        Ok(self.precompute(query)?.has_amenable_paths())
    }

    /// Names of the nodes no valid adjustment set may contain, sorted.
    pub fn forbidden_set(&self, query: &AdjustmentQuery) -> AdjustResult<Vec<String>> {
        let graph = self.graph.as_ref();
        let endpoints = Endpoints::resolve(graph, query)?;
        let mut names: Vec<String> = forbidden_set(graph, &endpoints)
            .iter()
            .filter_map(|n| graph.node_name(n).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Runs the per-query precomputation without enumerating.
    pub fn precompute(&self, query: &AdjustmentQuery) -> AdjustResult<PrecomputeContext> {
        let deadline = Deadline::from_budget(self.config.max_duration());
        PrecomputeContext::build(self.graph.as_ref(), query, &deadline)
    }

    /// Finds an open backdoor path given the conditioning set `z`, if any.
    pub fn find_witness(&self, ctx: &PrecomputeContext, z: &[NodeId]) -> AdjustResult<Option<Vec<NodeId>>> {
        let graph = self.graph.as_ref();
        let z = ConditioningSet::from_nodes(graph.node_count(), z);
        Ok(find_witness(graph, ctx, &z, &Deadline::unbounded())?)
    }

    /// True if `z` blocks every backdoor path and no single non-seed member
    /// can be dropped without reopening one.
    pub fn is_locally_minimal(&self, ctx: &PrecomputeContext, z: &[NodeId]) -> AdjustResult<bool> {
        if self.find_witness(ctx, z)?.is_some() {
            return Ok(false);
        }
        for (i, &v) in z.iter().enumerate() {
            if ctx.is_seed(v) {
                continue;
            }
            let rest: Vec<NodeId> = z.iter().enumerate().filter(|(j, _)| *j != i).map(|(_, n)| *n).collect();
            if self.find_witness(ctx, &rest)?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
