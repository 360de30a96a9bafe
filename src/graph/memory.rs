//! In-memory mixed graph.
//!
//! Reference [`CausalGraph`] implementation backed by adjacency lists. It
//! supports every edge kind that appears in DAGs, CPDAGs, MAGs and PAGs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::notation::{format_edge, parse_edge, GraphDocument};
use super::{CausalGraph, Edge, Endpoint, GraphType, NodeId, NodeMask};
use crate::config::Limit;
use crate::error::{AdjustError, AdjustResult, GraphError};

/// A named graph with at most one edge per node pair.
///
/// Neighbors are listed in edge-insertion order. That order is what the
/// witness search walks, so two graphs built from the same edge list always
/// produce the same adjustment sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphDocument", into = "GraphDocument")]
pub struct MixedGraph {
    names: Vec<String>,
    index: HashMap<String, NodeId>,
    adjacency: Vec<Vec<NodeId>>,
    edges: HashMap<(NodeId, NodeId), Edge>,
    edge_order: Vec<(NodeId, NodeId)>,
}

fn pair_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl MixedGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from edges in notation, creating nodes on first mention.
    ///
    /// ```
    /// use causal_adjust::MixedGraph;
    ///
    /// let g = MixedGraph::from_edges(["U --> X", "U --> Y", "X --> Y"]).unwrap();
    /// assert_eq!(g.edge_count(), 3);
    /// ```
    pub fn from_edges<I, S>(edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut graph = Self::new();
        for line in edges {
            let (a, at_a, at_b, b) = parse_edge(line.as_ref())?;
            let a = graph.ensure_node(&a)?;
            let b = graph.ensure_node(&b)?;
            graph.insert_edge(a, b, at_a, at_b)?;
        }
        Ok(graph)
    }

    /// Adds a new node.
    pub fn add_node(&mut self, name: impl Into<String>) -> Result<NodeId, GraphError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GraphError::EmptyNodeName);
        }
        if self.index.contains_key(&name) {
            return Err(GraphError::DuplicateNode { name });
        }
        let id = NodeId::from_index(self.names.len());
        self.index.insert(name.clone(), id);
        self.names.push(name);
        self.adjacency.push(Vec::new());
        Ok(id)
    }

    /// Returns the id of `name`, adding the node if it is new.
    pub fn ensure_node(&mut self, name: &str) -> Result<NodeId, GraphError> {
        match self.index.get(name) {
            Some(id) => Ok(*id),
            None => self.add_node(name),
        }
    }

    /// Looks up a node by name.
    pub fn node(&self, name: &str) -> Result<NodeId, GraphError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode {
                name: name.to_string(),
            })
    }

    /// Node names in id order.
    pub fn node_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_order.len()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edge_order
            .iter()
            .filter_map(|key| self.edges.get(key).copied())
    }

    /// Adds an edge between two existing nodes with the given marks.
    pub fn add_edge(&mut self, a: &str, at_a: Endpoint, at_b: Endpoint, b: &str) -> Result<(), GraphError> {
        let a = self.node(a)?;
        let b = self.node(b)?;
        self.insert_edge(a, b, at_a, at_b)
    }

    /// `a --> b`
    pub fn add_directed(&mut self, a: &str, b: &str) -> Result<(), GraphError> {
        self.add_edge(a, Endpoint::Tail, Endpoint::Arrow, b)
    }

    /// `a <-> b`
    pub fn add_bidirected(&mut self, a: &str, b: &str) -> Result<(), GraphError> {
        self.add_edge(a, Endpoint::Arrow, Endpoint::Arrow, b)
    }

    /// `a --- b`
    pub fn add_undirected(&mut self, a: &str, b: &str) -> Result<(), GraphError> {
        self.add_edge(a, Endpoint::Tail, Endpoint::Tail, b)
    }

    /// `a o-> b`
    pub fn add_partially_oriented(&mut self, a: &str, b: &str) -> Result<(), GraphError> {
        self.add_edge(a, Endpoint::Circle, Endpoint::Arrow, b)
    }

    /// `a o-o b`
    pub fn add_nondirected(&mut self, a: &str, b: &str) -> Result<(), GraphError> {
        self.add_edge(a, Endpoint::Circle, Endpoint::Circle, b)
    }

    fn insert_edge(&mut self, a: NodeId, b: NodeId, at_a: Endpoint, at_b: Endpoint) -> Result<(), GraphError> {
        if a == b {
            return Err(GraphError::SelfLoop {
                name: self.name_of(a),
            });
        }
        let key = pair_key(a, b);
        if self.edges.contains_key(&key) {
            return Err(GraphError::DuplicateEdge {
                a: self.name_of(a),
                b: self.name_of(b),
            });
        }
        self.edges.insert(key, Edge::new(a, b, at_a, at_b));
        self.edge_order.push(key);
        self.adjacency[a.index()].push(b);
        self.adjacency[b.index()].push(a);
        Ok(())
    }

    fn name_of(&self, node: NodeId) -> String {
        self.names
            .get(node.index())
            .cloned()
            .unwrap_or_else(|| node.to_string())
    }

    /// True if the graph has `a --> b`.
    #[must_use]
    pub fn is_parent_of(&self, a: NodeId, b: NodeId) -> bool {
        self.edge(a, b).is_some_and(|e| {
            e.endpoint_at(a) == Some(Endpoint::Tail) && e.endpoint_at(b) == Some(Endpoint::Arrow)
        })
    }

    /// Nodes `p` with `p --> node`, in adjacency order.
    #[must_use]
    pub fn parents(&self, node: NodeId) -> Vec<NodeId> {
        self.adjacent_nodes(node)
            .iter()
            .copied()
            .filter(|p| self.is_parent_of(*p, node))
            .collect()
    }

    /// Nodes `c` with `node --> c`, in adjacency order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.adjacent_nodes(node)
            .iter()
            .copied()
            .filter(|c| self.is_parent_of(node, *c))
            .collect()
    }

    /// Serializes the graph as pretty JSON.
    pub fn to_json_pretty(&self) -> AdjustResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AdjustError::SerializationFailed {
            what: "graph",
            message: e.to_string(),
        })
    }

    /// Deserializes a graph from JSON.
    pub fn from_json(s: &str) -> AdjustResult<Self> {
        serde_json::from_str(s).map_err(|e| AdjustError::DeserializationFailed {
            what: "graph",
            message: e.to_string(),
        })
    }

    /// Definitely visible `a --> b` in a PAG: some `c` not adjacent to `b`
    /// has an arrowhead into `a`, or reaches `a` by a collider path into `a`
    /// whose interior nodes are all parents of `b`.
    fn is_def_visible(&self, a: NodeId, b: NodeId) -> bool {
        if !self.is_parent_of(a, b) {
            return false;
        }
        (0..self.node_count()).map(NodeId::from_index).any(|c| {
            if c == a || c == b || self.is_adjacent(c, b) {
                return false;
            }
            let into_a = self
                .edge(c, a)
                .is_some_and(|e| e.endpoint_at(a) == Some(Endpoint::Arrow));
            if into_a {
                return true;
            }
            let mut on_branch = NodeMask::with_capacity(self.node_count());
            self.collider_path_into(None, c, a, b, &mut on_branch)
        })
    }

    fn collider_path_into(
        &self,
        prev: Option<NodeId>,
        cur: NodeId,
        target: NodeId,
        b: NodeId,
        on_branch: &mut NodeMask,
    ) -> bool {
        if cur == target {
            return prev.is_some_and(|p| {
                self.edge(p, target)
                    .is_some_and(|e| e.endpoint_at(target) == Some(Endpoint::Arrow))
            });
        }
        if prev.is_some() && !self.is_parent_of(cur, b) {
            return false;
        }

        on_branch.insert(cur);
        for &next in self.adjacent_nodes(cur) {
            if on_branch.contains(next) {
                continue;
            }
            let collider = match prev {
                None => true,
                Some(p) => self.is_def_collider(p, cur, next),
            };
            if collider && self.collider_path_into(Some(cur), next, target, b, on_branch) {
                return true;
            }
        }
        on_branch.remove(cur);
        false
    }

    fn extend_semidirected(
        &self,
        path: &mut Vec<NodeId>,
        on_path: &mut NodeMask,
        to: NodeId,
        max_edges: usize,
        out: &mut Vec<Vec<NodeId>>,
    ) {
        let Some(&tail) = path.last() else {
            return;
        };
        if tail == to {
            out.push(path.clone());
            return;
        }
        if path.len() > max_edges {
            return;
        }
        for &next in self.adjacent_nodes(tail) {
            if on_path.contains(next) {
                continue;
            }
            let step = self
                .edge(tail, next)
                .and_then(|e| e.endpoint_at(tail))
                .is_some_and(|m| matches!(m, Endpoint::Tail | Endpoint::Circle));
            if !step {
                continue;
            }
            path.push(next);
            on_path.insert(next);
            self.extend_semidirected(path, on_path, to, max_edges, out);
            on_path.remove(next);
            path.pop();
        }
    }
}

impl CausalGraph for MixedGraph {
    fn node_count(&self) -> usize {
        self.names.len()
    }

    fn node_name(&self, node: NodeId) -> Option<&str> {
        self.names.get(node.index()).map(String::as_str)
    }

    fn node_id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    fn adjacent_nodes(&self, node: NodeId) -> &[NodeId] {
        self.adjacency.get(node.index()).map_or(&[], Vec::as_slice)
    }

    fn edge(&self, a: NodeId, b: NodeId) -> Option<Edge> {
        self.edges.get(&pair_key(a, b)).copied()
    }

    fn is_def_collider(&self, a: NodeId, b: NodeId, c: NodeId) -> bool {
        let arrow_at_b = |x: NodeId| {
            self.edge(x, b)
                .is_some_and(|e| e.endpoint_at(b) == Some(Endpoint::Arrow))
        };
        arrow_at_b(a) && arrow_at_b(c)
    }

    fn is_def_noncollider(&self, a: NodeId, b: NodeId, c: NodeId) -> bool {
        let (Some(ab), Some(cb)) = (self.edge(a, b), self.edge(c, b)) else {
            return false;
        };
        let (m1, m2) = (ab.endpoint_at(b), cb.endpoint_at(b));
        if m1 == Some(Endpoint::Tail) || m2 == Some(Endpoint::Tail) {
            return true;
        }
        m1 == Some(Endpoint::Circle) && m2 == Some(Endpoint::Circle) && !self.is_adjacent(a, c)
    }

    fn exists_directed_path(&self, from: NodeId, to: NodeId) -> bool {
        let mut seen = NodeMask::with_capacity(self.node_count());
        let mut stack = self.children(from);
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if seen.insert(node) {
                stack.extend(self.children(node));
            }
        }
        false
    }

    fn is_ancestor_of_any(&self, node: NodeId, targets: &[NodeId]) -> bool {
        if targets.contains(&node) {
            return true;
        }
        let goal = NodeMask::from_nodes(self.node_count(), targets.iter().copied());
        let mut seen = NodeMask::with_capacity(self.node_count());
        seen.insert(node);
        let mut stack = vec![node];
        while let Some(cur) = stack.pop() {
            for child in self.children(cur) {
                if goal.contains(child) {
                    return true;
                }
                if seen.insert(child) {
                    stack.push(child);
                }
            }
        }
        false
    }

    fn amenable_paths(
        &self,
        from: NodeId,
        to: NodeId,
        graph_type: GraphType,
        max_length: Limit,
    ) -> Vec<Vec<NodeId>> {
        let mut out = Vec::new();
        let max_edges = max_length.resolve(usize::MAX);
        if from == to || max_edges == 0 {
            return out;
        }
        for &first in self.adjacent_nodes(from) {
            let Some(edge) = self.edge(from, first) else {
                continue;
            };
            if !edge.points_towards(first) {
                continue;
            }
            if graph_type.is_pag() && !self.is_def_visible(from, first) {
                continue;
            }
            let mut path = vec![from, first];
            let mut on_path = NodeMask::from_nodes(self.node_count(), [from, first]);
            self.extend_semidirected(&mut path, &mut on_path, to, max_edges, &mut out);
        }
        out
    }
}

impl TryFrom<GraphDocument> for MixedGraph {
    type Error = GraphError;

    fn try_from(doc: GraphDocument) -> Result<Self, Self::Error> {
        let mut graph = Self::new();
        for name in doc.nodes {
            graph.add_node(name)?;
        }
        for line in &doc.edges {
            let (a, at_a, at_b, b) = parse_edge(line)?;
            graph.add_edge(&a, at_a, at_b, &b)?;
        }
        Ok(graph)
    }
}

impl From<MixedGraph> for GraphDocument {
    fn from(graph: MixedGraph) -> Self {
        let edges = graph
            .edges()
            .map(|e| {
                format_edge(
                    &graph.name_of(e.node1()),
                    e.endpoint_at(e.node1()).unwrap_or(Endpoint::Tail),
                    e.endpoint_at(e.node2()).unwrap_or(Endpoint::Tail),
                    &graph.name_of(e.node2()),
                )
            })
            .collect();
        Self {
            nodes: graph.names,
            edges,
        }
    }
}
