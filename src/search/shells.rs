//! Radius-bounded BFS shells around the endpoints.

use std::collections::VecDeque;

use serde::Serialize;

use super::deadline::Deadline;
use crate::error::ExecutionError;
use crate::graph::{CausalGraph, GraphType, NodeId, NodeMask};

/// Neighbors of `x` through which a backdoor path can leave it.
///
/// Outside PAGs these are the `w` with an arrowhead into `x`. In a PAG an
/// undirected or bidirected edge also counts when `w` has a directed path
/// to `x` or to some outcome.
pub(crate) fn backdoor_entries(
    graph: &dyn CausalGraph,
    x: NodeId,
    outcomes: &[NodeId],
    graph_type: GraphType,
) -> Vec<NodeId> {
    let mut entries = Vec::new();
    for &w in graph.adjacent_nodes(x) {
        let Some(edge) = graph.edge(x, w) else {
            continue;
        };
        let into_x = edge.points_towards(x);
        let qualifies = if graph_type.is_pag() {
            into_x
                || ((edge.is_undirected() || edge.is_bidirected())
                    && (graph.exists_directed_path(w, x)
                        || outcomes.iter().any(|y| graph.exists_directed_path(w, *y))))
        } else {
            into_x
        };
        if qualifies {
            entries.push(w);
        }
    }
    entries
}

/// BFS layers around one side of the query.
///
/// `layers[d]` holds the nodes first reached at distance `d`, in discovery
/// order. Only distances up to the radius are layered, but `reach` covers
/// every node the BFS touched.
#[derive(Debug, Clone, Serialize)]
pub struct Shells {
    layers: Vec<Vec<NodeId>>,
    #[serde(skip)]
    distance: Vec<Option<usize>>,
    #[serde(skip)]
    reach: NodeMask,
}

impl Shells {
    /// Grows shells around `origins` (distance 0) and `first` (distance 1).
    ///
    /// Nodes in `blocked` are never entered.
    pub(crate) fn grow(
        graph: &dyn CausalGraph,
        origins: &[NodeId],
        first: &[NodeId],
        blocked: &[NodeId],
        radius: usize,
        deadline: &Deadline,
    ) -> Result<Self, ExecutionError> {
        let n = graph.node_count();
        let mut shells = Self {
            layers: vec![Vec::new(); radius.min(n) + 1],
            distance: vec![None; n],
            reach: NodeMask::with_capacity(n),
        };
        let mut visited = NodeMask::from_nodes(n, blocked.iter().copied());
        let mut queue = VecDeque::new();

        for &o in origins {
            if visited.insert(o) {
                shells.record(o, 0);
                queue.push_back(o);
            }
        }
        for &s in first {
            if visited.insert(s) {
                shells.record(s, 1);
                queue.push_back(s);
            }
        }

        while let Some(u) = queue.pop_front() {
            deadline.check()?;
            let du = shells.distance[u.index()].unwrap_or(0);
            if du >= radius {
                continue;
            }
            for &v in graph.adjacent_nodes(u) {
                if visited.insert(v) {
                    shells.record(v, du + 1);
                    queue.push_back(v);
                }
            }
        }
        Ok(shells)
    }

    fn record(&mut self, node: NodeId, d: usize) {
        if let Some(slot) = self.distance.get_mut(node.index()) {
            *slot = Some(d);
        }
        if let Some(layer) = self.layers.get_mut(d) {
            layer.push(node);
        }
        self.reach.insert(node);
    }

    /// Nodes first reached at distance `d`.
    #[must_use]
    pub fn layer(&self, d: usize) -> &[NodeId] {
        self.layers.get(d).map_or(&[], Vec::as_slice)
    }

    /// Number of layers, including layer 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// True if the BFS touched `node`.
    #[must_use]
    pub fn reaches(&self, node: NodeId) -> bool {
        self.reach.contains(node)
    }

    /// Number of nodes the BFS touched.
    #[must_use]
    pub fn reach_len(&self) -> usize {
        self.reach.len()
    }

    /// Distance of `node` if it sits in a layer at distance 1 or more.
    #[must_use]
    pub fn layer_distance(&self, node: NodeId) -> Option<usize> {
        self.distance
            .get(node.index())
            .copied()
            .flatten()
            .filter(|d| *d >= 1 && *d < self.layers.len())
    }
}
