//! The graph oracle contract consumed by the search engine.
//!
//! The engine only ever reads a graph. Anything that can answer these
//! adjacency and path predicates can be searched: the in-memory
//! [`MixedGraph`](super::MixedGraph) is the reference implementation.

use super::{Edge, GraphType, NodeId};
use crate::config::Limit;

/// Read-only view of a causal graph.
///
/// # Ordering
/// `adjacent_nodes` must return neighbors in a stable order. The witness
/// search walks neighbors in that order, so enumeration results are only as
/// deterministic as this listing.
pub trait CausalGraph: Send + Sync {
    /// Number of nodes. Valid ids are `0..node_count()`.
    fn node_count(&self) -> usize;

    /// Name of `node`, used for tie-breaking and canonical keys.
    fn node_name(&self, node: NodeId) -> Option<&str>;

    /// Looks a node up by name.
    fn node_id(&self, name: &str) -> Option<NodeId>;

    /// Neighbors of `node` in stable adjacency order.
    fn adjacent_nodes(&self, node: NodeId) -> &[NodeId];

    /// The edge between `a` and `b`, if adjacent.
    fn edge(&self, a: NodeId, b: NodeId) -> Option<Edge>;

    /// True if `<a, b, c>` is a definite collider at `b`.
    fn is_def_collider(&self, a: NodeId, b: NodeId, c: NodeId) -> bool;

    /// True if `<a, b, c>` is a definite noncollider at `b`.
    fn is_def_noncollider(&self, a: NodeId, b: NodeId, c: NodeId) -> bool;

    /// True if a directed path `from --> ... --> to` exists.
    fn exists_directed_path(&self, from: NodeId, to: NodeId) -> bool;

    /// True if `node` is a member of `targets` or an ancestor of one.
    fn is_ancestor_of_any(&self, node: NodeId, targets: &[NodeId]) -> bool;

    /// Amenable possibly-directed paths from `from` to `to`, each listed from
    /// `from` to `to`, with at most `max_length` edges.
    fn amenable_paths(
        &self,
        from: NodeId,
        to: NodeId,
        graph_type: GraphType,
        max_length: Limit,
    ) -> Vec<Vec<NodeId>>;

    /// Number of neighbors of `node`.
    fn degree(&self, node: NodeId) -> usize {
        self.adjacent_nodes(node).len()
    }

    /// True if `a` and `b` share an edge.
    fn is_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.edge(a, b).is_some()
    }
}
