//! Forb(X, Y): nodes on or downstream of possibly-causal paths.
//!
//! An edge is walked out of `a` when it has no arrowhead at `a` and is not
//! bidirected. Forward reach follows such edges away from the seeds; backward
//! reach follows them in reverse towards the targets.

use std::collections::VecDeque;

use crate::graph::{CausalGraph, NodeId, NodeMask};
use crate::query::Endpoints;

fn possibly_out(graph: &dyn CausalGraph, a: NodeId, b: NodeId) -> bool {
    graph.edge(a, b).is_some_and(|e| e.is_possibly_out_of(a))
}

/// Seeds plus every node reachable from them along possibly-out edges.
pub(crate) fn forward_reach<I>(graph: &dyn CausalGraph, seeds: I) -> NodeMask
where
    I: IntoIterator<Item = NodeId>,
{
    let mut seen = NodeMask::with_capacity(graph.node_count());
    let mut queue = VecDeque::new();
    for s in seeds {
        if seen.insert(s) {
            queue.push_back(s);
        }
    }
    while let Some(a) = queue.pop_front() {
        for &b in graph.adjacent_nodes(a) {
            if possibly_out(graph, a, b) && seen.insert(b) {
                queue.push_back(b);
            }
        }
    }
    seen
}

/// Targets plus every node that reaches one of them along possibly-out edges.
pub(crate) fn backward_reach(graph: &dyn CausalGraph, targets: &[NodeId]) -> NodeMask {
    let mut seen = NodeMask::from_nodes(graph.node_count(), targets.iter().copied());
    let mut queue: VecDeque<NodeId> = targets.iter().copied().collect();
    while let Some(b) = queue.pop_front() {
        for &a in graph.adjacent_nodes(b) {
            if possibly_out(graph, a, b) && seen.insert(a) {
                queue.push_back(a);
            }
        }
    }
    seen
}

/// Computes Forb(X, Y).
///
/// Nodes on a possibly-directed path from X to Y, together with everything
/// reachable from X or those nodes, minus X and Y themselves.
pub(crate) fn forbidden_set(graph: &dyn CausalGraph, endpoints: &Endpoints) -> NodeMask {
    let treatments = NodeMask::from_nodes(graph.node_count(), endpoints.treatments().iter().copied());

    let mut on_pd_path = forward_reach(graph, endpoints.treatments().iter().copied());
    on_pd_path.intersect_with(&backward_reach(graph, endpoints.outcomes()));
    on_pd_path.subtract(&treatments);

    let seeds = endpoints
        .treatments()
        .iter()
        .copied()
        .chain(on_pd_path.iter());
    let mut forbidden = forward_reach(graph, seeds);
    forbidden.subtract(&treatments);
    for &y in endpoints.outcomes() {
        forbidden.remove(y);
    }
    forbidden
}
