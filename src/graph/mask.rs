//! Dense node membership masks.

use bitvec::prelude::*;

use super::NodeId;

/// A set of nodes backed by a bit per dense node index.
///
/// Masks grow on insert, so a mask sized for one graph can safely be queried
/// with any id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMask {
    bits: BitVec<u64, Lsb0>,
}

impl NodeMask {
    /// Creates an empty mask sized for `node_count` nodes.
    #[must_use]
    pub fn with_capacity(node_count: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, node_count),
        }
    }

    /// Creates a mask containing `nodes`.
    pub fn from_nodes<I>(node_count: usize, nodes: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut mask = Self::with_capacity(node_count);
        for node in nodes {
            mask.insert(node);
        }
        mask
    }

    /// Inserts `node`. Returns true if it was not already present.
    pub fn insert(&mut self, node: NodeId) -> bool {
        let i = node.index();
        if i >= self.bits.len() {
            self.bits.resize(i + 1, false);
        }
        let was = self.bits[i];
        self.bits.set(i, true);
        !was
    }

    /// Removes `node`. Returns true if it was present.
    pub fn remove(&mut self, node: NodeId) -> bool {
        let i = node.index();
        if i >= self.bits.len() || !self.bits[i] {
            return false;
        }
        self.bits.set(i, false);
        true
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.bits.get(node.index()).is_some_and(|b| *b)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    /// True if no node is a member.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Members in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.bits.iter_ones().map(NodeId::from_index)
    }

    /// Adds every member of `other`.
    pub fn union_with(&mut self, other: &NodeMask) {
        for node in other.iter() {
            self.insert(node);
        }
    }

    /// Keeps only members also in `other`.
    pub fn intersect_with(&mut self, other: &NodeMask) {
        let drop: Vec<NodeId> = self.iter().filter(|n| !other.contains(*n)).collect();
        for node in drop {
            self.remove(node);
        }
    }

    /// Removes every member of `other`.
    pub fn subtract(&mut self, other: &NodeMask) {
        for node in other.iter() {
            self.remove(node);
        }
    }
}
