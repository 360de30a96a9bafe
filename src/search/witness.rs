//! Open backdoor path search.
//!
//! Depth-first over simple paths that leave a treatment through a backdoor
//! entry, using an explicit stack so deep graphs cannot exhaust the thread
//! stack. The first open path to any outcome, in adjacency order, is the
//! witness.

use super::context::PrecomputeContext;
use super::deadline::{Deadline, StepClock};
use super::solver::ConditioningSet;
use crate::error::ExecutionError;
use crate::graph::{CausalGraph, NodeId, NodeMask};

enum Visit {
    Found,
    Dead,
    Expand,
}

/// Per-search state: one conditioning set, one memo of collider ancestry.
struct WitnessSearch<'a> {
    graph: &'a dyn CausalGraph,
    ctx: &'a PrecomputeContext,
    z: &'a ConditioningSet,
    edge_limit: usize,
    ancestor_memo: Vec<Option<bool>>,
}

impl WitnessSearch<'_> {
    fn visit(&self, path: &[NodeId]) -> Visit {
        if path.len() - 1 > self.edge_limit {
            return Visit::Dead;
        }
        let Some(&tail) = path.last() else {
            return Visit::Dead;
        };
        if self.ctx.endpoints().is_outcome(tail) {
            if self.ctx.rb_mode() && path.len() == 2 {
                return Visit::Dead;
            }
            return Visit::Found;
        }
        Visit::Expand
    }

    /// Openness of `<prev, tail, next>` given Z.
    fn keeps_open(&mut self, prev: NodeId, tail: NodeId, next: NodeId) -> bool {
        if self.graph.is_def_collider(prev, tail, next) {
            return self.z.contains(tail) || self.is_ancestor_of_z(tail);
        }
        !self.z.contains(tail)
    }

    fn is_ancestor_of_z(&mut self, node: NodeId) -> bool {
        if let Some(Some(known)) = self.ancestor_memo.get(node.index()) {
            return *known;
        }
        let answer = self.graph.is_ancestor_of_any(node, self.z.as_slice());
        if let Some(slot) = self.ancestor_memo.get_mut(node.index()) {
            *slot = Some(answer);
        }
        answer
    }

    fn may_traverse(&self, node: NodeId) -> bool {
        !self.ctx.is_not_followed(node) || self.ctx.endpoints().is_outcome(node)
    }

    /// Extends `path` (currently `[x, w]`) until an open path reaches an outcome.
    fn walk(
        &mut self,
        path: &mut Vec<NodeId>,
        on_path: &mut NodeMask,
        clock: &mut StepClock<'_>,
    ) -> Result<bool, ExecutionError> {
        let graph = self.graph;
        let mut cursors: Vec<usize> = Vec::new();
        match self.visit(path) {
            Visit::Found => return Ok(true),
            Visit::Dead => return Ok(false),
            Visit::Expand => cursors.push(0),
        }

        // cursors.len() == path.len() - 1 at the top of every iteration.
        loop {
            clock.tick()?;
            let Some(&tail) = path.last() else {
                return Ok(false);
            };
            let neighbors = graph.adjacent_nodes(tail);
            let Some(cursor) = cursors.last_mut() else {
                return Ok(false);
            };
            let Some(&next) = neighbors.get(*cursor) else {
                cursors.pop();
                if cursors.is_empty() {
                    return Ok(false);
                }
                if let Some(done) = path.pop() {
                    on_path.remove(done);
                }
                continue;
            };
            *cursor += 1;

            if on_path.contains(next) || !self.may_traverse(next) {
                continue;
            }
            let prev = path[path.len() - 2];
            if !self.keeps_open(prev, tail, next) {
                continue;
            }

            path.push(next);
            on_path.insert(next);
            match self.visit(path) {
                Visit::Found => return Ok(true),
                Visit::Dead => {
                    path.pop();
                    on_path.remove(next);
                }
                Visit::Expand => cursors.push(0),
            }
        }
    }
}

/// Finds one open backdoor path from any treatment to any outcome given `z`.
///
/// Returns the path from treatment to outcome, or `None` if every backdoor
/// path within the length bound is blocked.
pub(crate) fn find_witness(
    graph: &dyn CausalGraph,
    ctx: &PrecomputeContext,
    z: &ConditioningSet,
    deadline: &Deadline,
) -> Result<Option<Vec<NodeId>>, ExecutionError> {
    let mut search = WitnessSearch {
        graph,
        ctx,
        z,
        edge_limit: ctx.max_path_length().resolve(usize::MAX),
        ancestor_memo: vec![None; graph.node_count()],
    };
    let mut clock = StepClock::new(deadline);

    for (x, entries) in ctx.entries() {
        let starts: &[NodeId] = if entries.is_empty() && ctx.rb_mode() {
            graph.adjacent_nodes(*x)
        } else {
            entries
        };
        for &w in starts {
            if !search.may_traverse(w) {
                continue;
            }
            let mut path = vec![*x, w];
            let mut on_path = NodeMask::from_nodes(graph.node_count(), [*x, w]);
            if search.walk(&mut path, &mut on_path, &mut clock)? {
                return Ok(Some(path));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limit;
    use crate::graph::MixedGraph;
    use crate::query::AdjustmentQuery;

    fn setup(edges: &[&str], q: &AdjustmentQuery) -> (MixedGraph, PrecomputeContext) {
        let g = MixedGraph::from_edges(edges.iter().copied()).unwrap();
        let c = PrecomputeContext::build(&g, q, &Deadline::unbounded()).unwrap();
        (g, c)
    }

    fn z(g: &MixedGraph, names: &[&str]) -> ConditioningSet {
        let mut set = ConditioningSet::new(g.node_count());
        for n in names {
            set.insert(g.node(n).unwrap());
        }
        set
    }

    fn witness_names(g: &MixedGraph, c: &PrecomputeContext, zs: &ConditioningSet) -> Option<Vec<String>> {
        find_witness(g, c, zs, &Deadline::unbounded())
            .unwrap()
            .map(|p| p.iter().map(|n| g.node_name(*n).unwrap().to_string()).collect())
    }

    #[test]
    fn test_fork_is_open_until_conditioned() {
        let q = AdjustmentQuery::single("X", "Y").unwrap();
        let (g, c) = setup(&["U --> X", "U --> Y", "X --> Y"], &q);
        assert_eq!(witness_names(&g, &c, &z(&g, &[])), Some(vec!["X".into(), "U".into(), "Y".into()]));
        assert_eq!(witness_names(&g, &c, &z(&g, &["U"])), None);
    }

    #[test]
    fn test_causal_edges_are_not_backdoor_starts() {
        let q = AdjustmentQuery::single("X", "Y").unwrap();
        let (g, c) = setup(&["X --> W", "W --> Y"], &q);
        assert_eq!(witness_names(&g, &c, &z(&g, &[])), None);
    }

    #[test]
    fn test_colliders_open_when_a_descendant_is_conditioned() {
        // X <- A -> C <- B -> Y, C -> D
        let q = AdjustmentQuery::single("X", "Y").unwrap();
        let (g, c) = setup(&["A --> X", "A --> C", "B --> C", "B --> Y", "C --> D"], &q);
        assert_eq!(witness_names(&g, &c, &z(&g, &[])), None);
        assert!(witness_names(&g, &c, &z(&g, &["C"])).is_some());
        assert!(witness_names(&g, &c, &z(&g, &["D"])).is_some());
        assert_eq!(witness_names(&g, &c, &z(&g, &["D", "A"])), None);
    }

    #[test]
    fn test_path_length_bound_hides_long_paths() {
        let q = AdjustmentQuery::builder()
            .treatment("X")
            .outcome("Y")
            .max_path_length(Limit::AtMost(2))
            .build()
            .unwrap();
        let (g, c) = setup(&["A --> X", "A --> B", "B --> Y"], &q);
        assert_eq!(witness_names(&g, &c, &z(&g, &[])), None);

        let q = AdjustmentQuery::single("X", "Y").unwrap();
        let (g, c) = setup(&["A --> X", "A --> B", "B --> Y"], &q);
        assert!(witness_names(&g, &c, &z(&g, &[])).is_some());
    }

    #[test]
    fn test_not_followed_nodes_are_not_traversed() {
        let q = AdjustmentQuery::builder()
            .treatment("X")
            .outcome("Y")
            .not_followed("U")
            .build()
            .unwrap();
        let (g, c) = setup(&["U --> X", "U --> Y"], &q);
        assert_eq!(witness_names(&g, &c, &z(&g, &[])), None);
    }

    #[test]
    fn test_not_followed_outcome_is_still_reached() {
        let q = AdjustmentQuery::builder()
            .treatment("X")
            .outcome("Y")
            .not_followed("Y")
            .build()
            .unwrap();
        let (g, c) = setup(&["U --> X", "U --> Y", "X --> Y"], &q);
        assert_eq!(
            witness_names(&g, &c, &z(&g, &[])),
            Some(vec!["X".into(), "U".into(), "Y".into()])
        );
        assert_eq!(witness_names(&g, &c, &z(&g, &["U"])), None);
    }

    #[test]
    fn test_rb_mode_rejects_the_direct_edge_and_falls_back_to_all_neighbors() {
        let q = AdjustmentQuery::builder()
            .treatment("X")
            .outcome("Y")
            .rb_mode(true)
            .build()
            .unwrap();
        let (g, c) = setup(&["X --> Y", "X --> W", "W --> Y"], &q);
        assert_eq!(
            witness_names(&g, &c, &z(&g, &[])),
            Some(vec!["X".into(), "W".into(), "Y".into()])
        );
        assert_eq!(witness_names(&g, &c, &z(&g, &["W"])), None);
    }

    #[test]
    fn test_backtracks_out_of_dead_ends() {
        // The first branch from U dead-ends at D before Y is found via V.
        let q = AdjustmentQuery::single("X", "Y").unwrap();
        let (g, c) = setup(&["U --> X", "U --> D", "D --> E", "U --> V", "V --> Y"], &q);
        assert_eq!(
            witness_names(&g, &c, &z(&g, &[])),
            Some(vec!["X".into(), "U".into(), "V".into(), "Y".into()])
        );
    }

    #[test]
    fn test_multi_endpoint_search_tries_every_treatment() {
        let q = AdjustmentQuery::builder()
            .treatments(["X1", "X2"])
            .outcome("Y")
            .build()
            .unwrap();
        let (g, c) = setup(&["X1 --> Y", "U --> X2", "U --> Y"], &q);
        assert_eq!(
            witness_names(&g, &c, &z(&g, &[])),
            Some(vec!["X2".into(), "U".into(), "Y".into()])
        );
    }
}
