//! Adjustment sets and enumeration reports.

use blake3::Hasher;
use serde::Serialize;
use uuid::Uuid;

use crate::graph::{CausalGraph, NodeId};

/// Canonical key of a node set: sorted names joined by `,`.
///
/// Two sets with the same members always share a key regardless of the
/// order in which they were grown.
#[must_use]
pub fn canonical_key(graph: &dyn CausalGraph, nodes: &[NodeId]) -> String {
    sorted_names(graph, nodes).join(",")
}

fn sorted_names(graph: &dyn CausalGraph, nodes: &[NodeId]) -> Vec<String> {
    let mut names: Vec<String> = nodes
        .iter()
        .map(|n| graph.node_name(*n).map_or_else(|| n.to_string(), str::to_string))
        .collect();
    names.sort();
    names
}

/// One locally-minimal adjustment set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustmentSet {
    #[serde(skip)]
    members: Vec<NodeId>,
    names: Vec<String>,
    key: String,
    digest: String,
}

impl AdjustmentSet {
    /// Builds a set from members in growth order.
    #[must_use]
    pub fn new(graph: &dyn CausalGraph, members: Vec<NodeId>) -> Self {
        let names = sorted_names(graph, &members);
        let key = names.join(",");

        let mut h = Hasher::new();
        h.update(b"adjustment-set:");
        h.update(key.as_bytes());
        let digest = h.finalize().to_hex().to_string();

        Self {
            members,
            names,
            key,
            digest,
        }
    }

    /// Members in the order the solver added them.
    #[must_use]
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// Member names, sorted.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Canonical key (sorted names joined by `,`; empty for the empty set).
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Hex blake3 digest of the canonical key.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True for the empty set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Membership by id.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    /// Membership by name.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// Counters describing one enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Ban-sets handed to the solver.
    pub branches_explored: u64,
    /// Branches where no blocker could be selected.
    pub infeasible_branches: u64,
    /// Solutions whose key had already been recorded.
    pub duplicate_solutions: u64,
    /// Ban-sets skipped because an identical one was already explored.
    pub skipped_ban_sets: u64,
    /// Witness searches run across all branches.
    pub witness_searches: u64,
}

/// Result of one adjustment query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjustmentReport {
    /// Id of the query this report answers.
    pub request_id: Uuid,
    /// Distinct sets in discovery order.
    pub sets: Vec<AdjustmentSet>,
    /// Enumeration counters.
    pub stats: SearchStats,
    /// True if treatment and outcome share no amenable path.
    pub no_amenable_paths: bool,
    /// True if the deadline stopped enumeration early.
    pub timed_out: bool,
}

impl AdjustmentReport {
    /// Canonical keys in discovery order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.sets.iter().map(AdjustmentSet::key).collect()
    }

    /// Sorted member names of each set, in discovery order.
    #[must_use]
    pub fn name_sets(&self) -> Vec<Vec<String>> {
        self.sets.iter().map(|s| s.names().to_vec()).collect()
    }
}
