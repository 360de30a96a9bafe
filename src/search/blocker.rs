//! Blocker selection on a witness path.

use std::cmp::Ordering;

use super::context::{compare_names, PrecomputeContext};
use super::solver::ConditioningSet;
use crate::graph::{CausalGraph, NodeId, NodeMask};
use crate::policy::{ColliderPolicy, WitnessRole};

/// Role of the interior node at `witness[k]`.
pub(crate) fn role_at(graph: &dyn CausalGraph, witness: &[NodeId], k: usize) -> WitnessRole {
    let (a, b, c) = (witness[k - 1], witness[k], witness[k + 1]);
    if graph.is_def_collider(a, b, c) {
        WitnessRole::Collider
    } else if graph.is_def_noncollider(a, b, c) {
        WitnessRole::Noncollider
    } else {
        WitnessRole::Ambiguous
    }
}

struct Candidate {
    node: NodeId,
    role: WitnessRole,
}

/// Picks the node on `witness` to add to Z, or `None` if nothing qualifies.
///
/// Pool members on the witness are preferred; if none qualifies any interior
/// witness node may be picked. Ranking: role score, then pool position,
/// then degree, then name.
pub(crate) fn choose_blocker(
    graph: &dyn CausalGraph,
    ctx: &PrecomputeContext,
    witness: &[NodeId],
    z: &ConditioningSet,
    ban: &NodeMask,
    policy: ColliderPolicy,
) -> Option<NodeId> {
    if witness.len() < 3 {
        return None;
    }
    let selectable = |v: NodeId| !(ctx.is_blocked(v) || z.contains(v) || ban.contains(v));

    // Interior position of each witness node.
    let interior: Vec<(NodeId, usize)> = (1..witness.len() - 1).map(|k| (witness[k], k)).collect();
    let position = |v: NodeId| interior.iter().find(|(n, _)| *n == v).map(|(_, k)| *k);

    let mut candidates: Vec<Candidate> = ctx
        .pool()
        .iter()
        .filter(|v| selectable(**v))
        .filter_map(|&v| {
            position(v).map(|k| Candidate {
                node: v,
                role: role_at(graph, witness, k),
            })
        })
        .collect();

    if candidates.is_empty() {
        candidates = interior
            .iter()
            .filter(|(v, _)| selectable(*v))
            .map(|&(v, k)| Candidate {
                node: v,
                role: role_at(graph, witness, k),
            })
            .collect();
    }

    if policy.filters_colliders() && candidates.iter().any(|c| c.role.passes_collider_filter()) {
        candidates.retain(|c| c.role.passes_collider_filter());
    }

    candidates
        .into_iter()
        .min_by(|a, b| rank(graph, ctx, policy, a, b))
        .map(|c| c.node)
}

fn rank(graph: &dyn CausalGraph, ctx: &PrecomputeContext, policy: ColliderPolicy, a: &Candidate, b: &Candidate) -> Ordering {
    let rank_of = |v: NodeId| ctx.pool_rank(v).unwrap_or(usize::MAX);
    b.role
        .score(policy)
        .total_cmp(&a.role.score(policy))
        .then_with(|| rank_of(a.node).cmp(&rank_of(b.node)))
        .then_with(|| graph.degree(a.node).cmp(&graph.degree(b.node)))
        .then_with(|| compare_names(graph, a.node, b.node))
}
