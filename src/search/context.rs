//! Per-query precomputation shared by every enumeration branch.

use std::cmp::Ordering;

use tracing::debug;

use super::backbone::{amenable_paths, backbone};
use super::deadline::Deadline;
use super::forbidden::forbidden_set;
use super::shells::{backdoor_entries, Shells};
use crate::config::{Limit, NearEndpoint};
use crate::error::AdjustResult;
use crate::graph::{CausalGraph, GraphType, NodeId, NodeMask};
use crate::query::{resolve_names, AdjustmentQuery, Endpoints};

/// Sort distance for pool members outside every requested layer.
const FAR: usize = usize::MAX / 2;

/// Immutable snapshot of everything a query needs before branching.
///
/// Built once per query. Branch solvers only read it, so it can be shared
/// across worker threads without synchronization.
#[derive(Debug, Clone)]
pub struct PrecomputeContext {
    endpoints: Endpoints,
    graph_type: GraphType,
    max_radius: Limit,
    near: NearEndpoint,
    max_path_length: Limit,
    rb_mode: bool,
    amenable: Vec<Vec<NodeId>>,
    backbone: NodeMask,
    forbidden: NodeMask,
    treatment_shells: Shells,
    outcome_shells: Shells,
    entries: Vec<(NodeId, Vec<NodeId>)>,
    pool: Vec<NodeId>,
    pool_rank: Vec<usize>,
    not_followed: NodeMask,
    seeds: Vec<NodeId>,
    seed_mask: NodeMask,
    blocked: NodeMask,
}

impl PrecomputeContext {
    /// Resolves `query` against `graph` and precomputes the search inputs.
    pub(crate) fn build(graph: &dyn CausalGraph, query: &AdjustmentQuery, deadline: &Deadline) -> AdjustResult<Self> {
        let n = graph.node_count();
        let endpoints = Endpoints::resolve(graph, query)?;
        let not_followed = NodeMask::from_nodes(n, resolve_names(graph, &query.mode.not_followed)?);
        let containing = resolve_names(graph, &query.mode.containing)?;
        let rb_mode = query.mode.is_rb();

        let amenable = amenable_paths(graph, &endpoints, query.graph_type, query.max_path_length);
        let backbone = backbone(n, &amenable, &endpoints);
        let forbidden = forbidden_set(graph, &endpoints);

        let entries: Vec<(NodeId, Vec<NodeId>)> = endpoints
            .treatments()
            .iter()
            .map(|&x| (x, backdoor_entries(graph, x, endpoints.outcomes(), query.graph_type)))
            .collect();
        let mut first = Vec::new();
        for w in entries.iter().flat_map(|(_, e)| e.iter().copied()) {
            if !first.contains(&w) {
                first.push(w);
            }
        }

        let radius = query.max_radius.resolve(n);
        let treatment_shells = Shells::grow(graph, &[], &first, endpoints.treatments(), radius, deadline)?;
        let outcome_shells = Shells::grow(graph, endpoints.outcomes(), &[], &[], radius, deadline)?;

        let mut in_pool = NodeMask::with_capacity(n);
        let mut pool = Vec::new();
        let depth = treatment_shells.depth().max(outcome_shells.depth());
        for r in 1..depth {
            let mut layer: Vec<NodeId> = Vec::new();
            if query.near.includes_treatment() {
                layer.extend_from_slice(treatment_shells.layer(r));
            }
            if query.near.includes_outcome() {
                layer.extend_from_slice(outcome_shells.layer(r));
            }
            for v in layer {
                if in_pool.insert(v) {
                    pool.push(v);
                }
            }
        }

        pool.retain(|&v| {
            let reach_x = treatment_shells.reaches(v);
            let reach_y = outcome_shells.reaches(v);
            let kept = match query.near {
                NearEndpoint::Treatment => reach_x,
                NearEndpoint::Outcome => reach_y,
                NearEndpoint::Both => reach_x && reach_y,
            };
            kept && !endpoints.is_endpoint(v)
                && !not_followed.contains(v)
                && (rb_mode || !(forbidden.contains(v) || backbone.contains(v)))
        });
        if rb_mode {
            // Outcomes stay available as seeds in RB mode.
            for &y in endpoints.outcomes() {
                if !not_followed.contains(y) {
                    pool.push(y);
                }
            }
        }

        let distance = |v: NodeId| {
            let dx = treatment_shells.layer_distance(v).unwrap_or(FAR);
            let dy = outcome_shells.layer_distance(v).unwrap_or(FAR);
            match query.near {
                NearEndpoint::Treatment => dx,
                NearEndpoint::Outcome => dy,
                NearEndpoint::Both => dx.min(dy),
            }
        };
        pool.sort_by(|a, b| {
            distance(*a)
                .cmp(&distance(*b))
                .then_with(|| graph.degree(*a).cmp(&graph.degree(*b)))
                .then_with(|| compare_names(graph, *a, *b))
        });

        let mut pool_rank = vec![usize::MAX; n];
        for (i, v) in pool.iter().enumerate() {
            pool_rank[v.index()] = i;
        }

        let mut seeds = Vec::new();
        let mut seed_mask = NodeMask::with_capacity(n);
        for v in containing {
            if pool_rank.get(v.index()).is_some_and(|r| *r != usize::MAX) && seed_mask.insert(v) {
                seeds.push(v);
            }
        }

        let mut blocked = not_followed.clone();
        for v in endpoints.treatments().iter().chain(endpoints.outcomes()) {
            blocked.insert(*v);
        }
        if !rb_mode {
            blocked.union_with(&forbidden);
            blocked.union_with(&backbone);
        }

        debug!(
            treatments = endpoints.treatments().len(),
            outcomes = endpoints.outcomes().len(),
            amenable_paths = amenable.len(),
            backbone = backbone.len(),
            forbidden = forbidden.len(),
            pool = pool.len(),
            seeds = seeds.len(),
            rb_mode,
            "precomputed adjustment context"
        );

        Ok(Self {
            endpoints,
            graph_type: query.graph_type,
            max_radius: query.max_radius,
            near: query.near,
            max_path_length: query.max_path_length,
            rb_mode,
            amenable,
            backbone,
            forbidden,
            treatment_shells,
            outcome_shells,
            entries,
            pool,
            pool_rank,
            not_followed,
            seeds,
            seed_mask,
            blocked,
        })
    }

    /// Resolved endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Graph type the query was interpreted under.
    #[must_use]
    pub fn graph_type(&self) -> GraphType {
        self.graph_type
    }

    /// Shell radius.
    #[must_use]
    pub fn max_radius(&self) -> Limit {
        self.max_radius
    }

    /// Endpoint selector used for the pool.
    #[must_use]
    pub fn near(&self) -> NearEndpoint {
        self.near
    }

    /// Edge bound for witness paths.
    #[must_use]
    pub fn max_path_length(&self) -> Limit {
        self.max_path_length
    }

    /// True in RB mode.
    #[must_use]
    pub fn rb_mode(&self) -> bool {
        self.rb_mode
    }

    /// Amenable paths between every treatment/outcome pair.
    #[must_use]
    pub fn amenable_paths(&self) -> &[Vec<NodeId>] {
        &self.amenable
    }

    /// True if some amenable path connects a treatment to an outcome.
    #[must_use]
    pub fn has_amenable_paths(&self) -> bool {
        !self.amenable.is_empty()
    }

    /// Interior nodes of the amenable paths.
    #[must_use]
    pub fn backbone(&self) -> &NodeMask {
        &self.backbone
    }

    /// Forb(X, Y).
    #[must_use]
    pub fn forbidden(&self) -> &NodeMask {
        &self.forbidden
    }

    /// Shells grown from the treatments' backdoor entries.
    #[must_use]
    pub fn treatment_shells(&self) -> &Shells {
        &self.treatment_shells
    }

    /// Shells grown from the outcomes.
    #[must_use]
    pub fn outcome_shells(&self) -> &Shells {
        &self.outcome_shells
    }

    /// Backdoor-entry neighbors per treatment.
    pub(crate) fn entries(&self) -> &[(NodeId, Vec<NodeId>)] {
        &self.entries
    }

    /// Candidate pool in ranking order.
    #[must_use]
    pub fn pool(&self) -> &[NodeId] {
        &self.pool
    }

    /// Position of `node` in the pool.
    #[must_use]
    pub fn pool_rank(&self, node: NodeId) -> Option<usize> {
        self.pool_rank
            .get(node.index())
            .copied()
            .filter(|r| *r != usize::MAX)
    }

    /// True if `node` is never traversed.
    #[must_use]
    pub fn is_not_followed(&self, node: NodeId) -> bool {
        self.not_followed.contains(node)
    }

    /// Nodes seeded into every set, in the order requested.
    #[must_use]
    pub fn seeds(&self) -> &[NodeId] {
        &self.seeds
    }

    /// True if `node` is a seed.
    #[must_use]
    pub fn is_seed(&self, node: NodeId) -> bool {
        self.seed_mask.contains(node)
    }

    /// True if `node` can never be picked as a blocker, whatever the branch.
    #[must_use]
    pub fn is_blocked(&self, node: NodeId) -> bool {
        self.blocked.contains(node)
    }
}

/// Lexical order by node name, falling back to id.
pub(crate) fn compare_names(graph: &dyn CausalGraph, a: NodeId, b: NodeId) -> Ordering {
    match (graph.node_name(a), graph.node_name(b)) {
        (Some(na), Some(nb)) => na.cmp(nb),
        _ => a.cmp(&b),
    }
}
