//! Grow-then-minimize solver for a single ban-set.

use tracing::trace;

use super::blocker::choose_blocker;
use super::context::PrecomputeContext;
use super::deadline::Deadline;
use super::witness::find_witness;
use crate::error::ExecutionError;
use crate::graph::{CausalGraph, NodeId, NodeMask};
use crate::policy::{ColliderPolicy, NoAmenablePolicy};

/// A conditioning set that remembers insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditioningSet {
    order: Vec<NodeId>,
    mask: NodeMask,
}

impl ConditioningSet {
    /// Creates an empty set sized for `node_count` nodes.
    #[must_use]
    pub fn new(node_count: usize) -> Self {
        Self {
            order: Vec::new(),
            mask: NodeMask::with_capacity(node_count),
        }
    }

    /// Creates a set from `nodes`, dropping repeats.
    #[must_use]
    pub fn from_nodes(node_count: usize, nodes: &[NodeId]) -> Self {
        let mut set = Self::new(node_count);
        for &n in nodes {
            set.insert(n);
        }
        set
    }

    /// Appends `node` if absent.
    pub fn insert(&mut self, node: NodeId) -> bool {
        if !self.mask.insert(node) {
            return false;
        }
        self.order.push(node);
        true
    }

    /// Removes `node` if present.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if !self.mask.remove(node) {
            return false;
        }
        self.order.retain(|n| *n != node);
        true
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.mask.contains(node)
    }

    /// Members in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[NodeId] {
        &self.order
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Consumes the set, returning members in insertion order.
    #[must_use]
    pub fn into_vec(self) -> Vec<NodeId> {
        self.order
    }
}

/// Result of solving one ban-set branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SolveOutcome {
    /// A locally-minimal set, members in growth order.
    Solution(Vec<NodeId>),
    /// Some witness had no selectable blocker.
    Infeasible,
    /// The query has no amenable path and the policy suppresses results.
    Suppressed,
}

/// Outcome plus the work it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Solved {
    pub(crate) outcome: SolveOutcome,
    pub(crate) witness_searches: u64,
}

/// Solves ban-set branches against a shared context.
pub(crate) struct Solver<'a> {
    graph: &'a dyn CausalGraph,
    ctx: &'a PrecomputeContext,
    collider_policy: ColliderPolicy,
    no_amenable_policy: NoAmenablePolicy,
    deadline: &'a Deadline,
}

impl<'a> Solver<'a> {
    pub(crate) fn new(
        graph: &'a dyn CausalGraph,
        ctx: &'a PrecomputeContext,
        collider_policy: ColliderPolicy,
        no_amenable_policy: NoAmenablePolicy,
        deadline: &'a Deadline,
    ) -> Self {
        Self {
            graph,
            ctx,
            collider_policy,
            no_amenable_policy,
            deadline,
        }
    }

    /// Produces one locally-minimal set avoiding `ban`, or reports why not.
    pub(crate) fn solve(&self, ban: &NodeMask) -> Result<Solved, ExecutionError> {
        if !self.ctx.has_amenable_paths() {
            match self.no_amenable_policy {
                NoAmenablePolicy::Search => {}
                NoAmenablePolicy::ReturnEmptySet => {
                    return Ok(Solved {
                        outcome: SolveOutcome::Solution(Vec::new()),
                        witness_searches: 0,
                    });
                }
                NoAmenablePolicy::Suppress => {
                    return Ok(Solved {
                        outcome: SolveOutcome::Suppressed,
                        witness_searches: 0,
                    });
                }
            }
        }

        let mut searches = 0u64;
        let mut z = ConditioningSet::from_nodes(self.graph.node_count(), self.ctx.seeds());

        loop {
            searches += 1;
            let Some(witness) = find_witness(self.graph, self.ctx, &z, self.deadline)? else {
                break;
            };
            let Some(blocker) = choose_blocker(self.graph, self.ctx, &witness, &z, ban, self.collider_policy)
            else {
                trace!(witness_len = witness.len(), size = z.len(), "no selectable blocker");
                return Ok(Solved {
                    outcome: SolveOutcome::Infeasible,
                    witness_searches: searches,
                });
            };
            z.insert(blocker);
        }

        loop {
            let mut changed = false;
            for v in z.as_slice().to_vec() {
                if self.ctx.is_seed(v) {
                    continue;
                }
                z.remove(v);
                searches += 1;
                if find_witness(self.graph, self.ctx, &z, self.deadline)?.is_some() {
                    z.insert(v);
                } else {
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        Ok(Solved {
            outcome: SolveOutcome::Solution(z.into_vec()),
            witness_searches: searches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MixedGraph;
    use crate::query::AdjustmentQuery;

    fn solve(edges: &[&str], q: &AdjustmentQuery, policy: NoAmenablePolicy, ban: &[&str]) -> (MixedGraph, SolveOutcome) {
        let g = MixedGraph::from_edges(edges.iter().copied()).unwrap();
        let deadline = Deadline::unbounded();
        let ctx = PrecomputeContext::build(&g, q, &deadline).unwrap();
        let ban = NodeMask::from_nodes(g.node_count(), ban.iter().map(|n| g.node(n).unwrap()));
        let solver = Solver::new(&g, &ctx, ColliderPolicy::NoncolliderFirst, policy, &deadline);
        let outcome = solver.solve(&ban).unwrap().outcome;
        (g, outcome)
    }

    fn names(g: &MixedGraph, outcome: &SolveOutcome) -> Vec<String> {
        match outcome {
            SolveOutcome::Solution(z) => {
                let mut v: Vec<String> = z.iter().map(|n| g.node_name(*n).unwrap().to_string()).collect();
                v.sort();
                v
            }
            other => panic!("expected a solution, got {other:?}"),
        }
    }

    #[test]
    fn test_conditioning_set_keeps_insertion_order() {
        let mut z = ConditioningSet::new(4);
        let (a, b, c) = (NodeId::from_index(2), NodeId::from_index(0), NodeId::from_index(1));
        assert!(z.insert(a));
        assert!(z.insert(b));
        assert!(!z.insert(a));
        z.insert(c);
        assert!(z.remove(b));
        z.insert(b);
        assert_eq!(z.as_slice(), &[a, c, b]);
        assert_eq!(z.len(), 3);
    }

    #[test]
    fn test_blocks_a_confounder() {
        let q = AdjustmentQuery::single("X", "Y").unwrap();
        let (g, out) = solve(&["U --> X", "U --> Y", "X --> Y"], &q, NoAmenablePolicy::Search, &[]);
        assert_eq!(names(&g, &out), vec!["U"]);
    }

    #[test]
    fn test_trims_redundant_blockers() {
        // Growth picks A (nearest the treatment), then the trim keeps the
        // set minimal: {A} alone blocks the only backdoor path.
        let q = AdjustmentQuery::single("X", "Y").unwrap();
        let (g, out) = solve(&["A --> X", "A --> B", "B --> Y", "X --> Y"], &q, NoAmenablePolicy::Search, &[]);
        assert_eq!(names(&g, &out), vec!["A"]);
    }

    #[test]
    fn test_banning_every_blocker_is_infeasible() {
        let q = AdjustmentQuery::single("X", "Y").unwrap();
        let (_, out) = solve(&["U --> X", "U --> Y", "X --> Y"], &q, NoAmenablePolicy::Search, &["U"]);
        assert_eq!(out, SolveOutcome::Infeasible);
    }

    #[test]
    fn test_no_amenable_policies() {
        let q = AdjustmentQuery::single("X", "Y").unwrap();
        let edges = ["U --> X", "U --> Y"];
        let (g, out) = solve(&edges, &q, NoAmenablePolicy::Search, &[]);
        assert_eq!(names(&g, &out), vec!["U"]);
        let (_, out) = solve(&edges, &q, NoAmenablePolicy::ReturnEmptySet, &[]);
        assert_eq!(out, SolveOutcome::Solution(Vec::new()));
        let (_, out) = solve(&edges, &q, NoAmenablePolicy::Suppress, &[]);
        assert_eq!(out, SolveOutcome::Suppressed);
    }

    #[test]
    fn test_seeds_survive_the_trim() {
        let q = AdjustmentQuery::builder()
            .treatment("X")
            .outcome("Y")
            .containing("S")
            .build()
            .unwrap();
        let (g, out) = solve(
            &["U --> X", "U --> Y", "X --> Y", "S --> X", "S --> Y", "U --> S"],
            &q,
            NoAmenablePolicy::Search,
            &[],
        );
        let z = names(&g, &out);
        assert!(z.contains(&"S".to_string()));
        assert!(z.contains(&"U".to_string()));
    }
}
