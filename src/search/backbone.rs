//! Amenable paths and their backbone.

use crate::config::Limit;
use crate::graph::{CausalGraph, GraphType, NodeId, NodeMask};
use crate::query::Endpoints;

/// Amenable paths over every treatment/outcome pair, in treatment-major order.
pub(crate) fn amenable_paths(
    graph: &dyn CausalGraph,
    endpoints: &Endpoints,
    graph_type: GraphType,
    max_length: Limit,
) -> Vec<Vec<NodeId>> {
    let mut paths = Vec::new();
    for &x in endpoints.treatments() {
        for &y in endpoints.outcomes() {
            paths.extend(graph.amenable_paths(x, y, graph_type, max_length));
        }
    }
    paths
}

/// Interior nodes of the amenable paths, excluding every endpoint.
pub(crate) fn backbone(node_count: usize, paths: &[Vec<NodeId>], endpoints: &Endpoints) -> NodeMask {
    let mut mask = NodeMask::with_capacity(node_count);
    for path in paths {
        if path.len() < 3 {
            continue;
        }
        for &v in &path[1..path.len() - 1] {
            if !endpoints.is_endpoint(v) {
                mask.insert(v);
            }
        }
    }
    mask
}
