//! Graph vocabulary shared by the search engine.
//!
//! The engine never owns or mutates a graph. It talks to one through the
//! [`CausalGraph`] oracle trait, addressing nodes by dense [`NodeId`]s so the
//! hot search paths can use index-addressed masks instead of hashing.

mod mask;
mod memory;
mod notation;
mod traits;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use mask::NodeMask;
pub use memory::MixedGraph;
pub use notation::{format_edge, parse_edge, GraphDocument};
pub use traits::CausalGraph;

/// Dense node identifier.
///
/// Ids are assigned by the graph in insertion order, starting at 0, so they
/// double as indices into per-node tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates an id from a dense index.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Returns the dense index of this node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mark at one end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// `-`
    Tail,
    /// `>` (or `<` when read from the other side)
    Arrow,
    /// `o`, undetermined mark in a PAG
    Circle,
}

/// An edge between two nodes with a mark at each end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    node1: NodeId,
    node2: NodeId,
    endpoint1: Endpoint,
    endpoint2: Endpoint,
}

impl Edge {
    /// Creates an edge; `endpoint1` is the mark at `node1`, `endpoint2` the mark at `node2`.
    #[must_use]
    pub const fn new(node1: NodeId, node2: NodeId, endpoint1: Endpoint, endpoint2: Endpoint) -> Self {
        Self {
            node1,
            node2,
            endpoint1,
            endpoint2,
        }
    }

    /// `a --> b`
    #[must_use]
    pub const fn directed(a: NodeId, b: NodeId) -> Self {
        Self::new(a, b, Endpoint::Tail, Endpoint::Arrow)
    }

    /// First node as constructed.
    #[must_use]
    pub const fn node1(&self) -> NodeId {
        self.node1
    }

    /// Second node as constructed.
    #[must_use]
    pub const fn node2(&self) -> NodeId {
        self.node2
    }

    /// Mark at `node`, or `None` if `node` is not on this edge.
    #[must_use]
    pub fn endpoint_at(&self, node: NodeId) -> Option<Endpoint> {
        if node == self.node1 {
            Some(self.endpoint1)
        } else if node == self.node2 {
            Some(self.endpoint2)
        } else {
            None
        }
    }

    /// The node at the other end from `node`.
    #[must_use]
    pub fn distal(&self, node: NodeId) -> Option<NodeId> {
        if node == self.node1 {
            Some(self.node2)
        } else if node == self.node2 {
            Some(self.node1)
        } else {
            None
        }
    }

    /// Arrowhead at `node` and a tail or circle at the other end.
    #[must_use]
    pub fn points_towards(&self, node: NodeId) -> bool {
        let Some(other) = self.distal(node) else {
            return false;
        };
        self.endpoint_at(node) == Some(Endpoint::Arrow)
            && matches!(self.endpoint_at(other), Some(Endpoint::Tail | Endpoint::Circle))
    }

    /// `a <-> b`
    #[must_use]
    pub fn is_bidirected(&self) -> bool {
        self.endpoint1 == Endpoint::Arrow && self.endpoint2 == Endpoint::Arrow
    }

    /// `a --- b`
    #[must_use]
    pub fn is_undirected(&self) -> bool {
        self.endpoint1 == Endpoint::Tail && self.endpoint2 == Endpoint::Tail
    }

    /// `a --> b` in either orientation.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        matches!(
            (self.endpoint1, self.endpoint2),
            (Endpoint::Tail, Endpoint::Arrow) | (Endpoint::Arrow, Endpoint::Tail)
        )
    }

    /// True if the edge can be walked as a possibly-directed step out of `node`:
    /// no arrowhead at `node` and not bidirected.
    #[must_use]
    pub fn is_possibly_out_of(&self, node: NodeId) -> bool {
        match self.endpoint_at(node) {
            None | Some(Endpoint::Arrow) => false,
            Some(_) => !self.is_bidirected(),
        }
    }
}

/// Kind of graph the query is interpreted against.
///
/// Alters which edges count as backdoor entries into the treatment and how
/// amenable paths are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GraphType {
    /// Directed acyclic graph.
    #[default]
    Dag,
    /// Partially directed acyclic graph (CPDAG / MPDAG).
    Pdag,
    /// Maximal ancestral graph.
    Mag,
    /// Partial ancestral graph.
    Pag,
}

impl GraphType {
    /// Returns true for PAGs, which use the extended backdoor-entry rule.
    #[must_use]
    pub const fn is_pag(self) -> bool {
        matches!(self, Self::Pag)
    }

    /// Canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dag => "DAG",
            Self::Pdag => "PDAG",
            Self::Mag => "MAG",
            Self::Pag => "PAG",
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAG" => Ok(Self::Dag),
            "PDAG" | "CPDAG" | "MPDAG" => Ok(Self::Pdag),
            "MAG" => Ok(Self::Mag),
            "PAG" => Ok(Self::Pag),
            _ => Err(ValidationError::InvalidGraphType {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for GraphType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GraphType> for String {
    fn from(value: GraphType) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (NodeId, NodeId, NodeId) {
        (NodeId::from_index(0), NodeId::from_index(1), NodeId::from_index(2))
    }

    #[test]
    fn test_directed_edge_marks() {
        let (a, b, c) = ids();
        let e = Edge::directed(a, b);
        assert!(e.points_towards(b));
        assert!(!e.points_towards(a));
        assert!(e.is_directed());
        assert!(e.is_possibly_out_of(a));
        assert!(!e.is_possibly_out_of(b));
        assert_eq!(e.endpoint_at(c), None);
        assert_eq!(e.distal(a), Some(b));
    }

    #[test]
    fn test_bidirected_is_never_possibly_out() {
        let (a, b, _) = ids();
        let e = Edge::new(a, b, Endpoint::Arrow, Endpoint::Arrow);
        assert!(e.is_bidirected());
        assert!(!e.points_towards(a));
        assert!(!e.is_possibly_out_of(a));
        assert!(!e.is_possibly_out_of(b));
    }

    #[test]
    fn test_undirected_and_circle_edges_are_possibly_out() {
        let (a, b, _) = ids();
        let und = Edge::new(a, b, Endpoint::Tail, Endpoint::Tail);
        assert!(und.is_undirected());
        assert!(und.is_possibly_out_of(a) && und.is_possibly_out_of(b));

        let po = Edge::new(a, b, Endpoint::Circle, Endpoint::Arrow);
        assert!(po.is_possibly_out_of(a));
        assert!(po.points_towards(b));
    }

    #[test]
    fn test_graph_type_parses_aliases() {
        assert_eq!("dag".parse::<GraphType>().unwrap(), GraphType::Dag);
        assert_eq!("CPDAG".parse::<GraphType>().unwrap(), GraphType::Pdag);
        assert_eq!(" Pag ".parse::<GraphType>().unwrap(), GraphType::Pag);
        assert!("tree".parse::<GraphType>().is_err());
    }

    #[test]
    fn test_graph_type_serde_is_case_insensitive() {
        let t: GraphType = serde_json::from_str("\"mag\"").unwrap();
        assert_eq!(t, GraphType::Mag);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"MAG\"");
    }
}
