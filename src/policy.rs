//! Blocker-ranking and no-amenable-path policies.

use serde::{Deserialize, Serialize};

/// How the blocker selector treats colliders on a witness path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColliderPolicy {
    /// Rank by role score only, with damped magnitudes.
    Off,
    /// Rank by role score; colliders are heavily penalised.
    PreferNoncolliders,
    /// Consider colliders only when no noncollider or ambiguous node qualifies.
    #[default]
    NoncolliderFirst,
}

impl ColliderPolicy {
    /// True if colliders are filtered out ahead of ranking.
    #[must_use]
    pub const fn filters_colliders(self) -> bool {
        matches!(self, Self::NoncolliderFirst)
    }
}

/// Behavior when treatment and outcome share no amenable path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoAmenablePolicy {
    /// Search as usual.
    #[default]
    Search,
    /// Return exactly one result, the empty set.
    ReturnEmptySet,
    /// Return no results.
    Suppress,
}

/// Role of an interior witness node relative to its two path neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WitnessRole {
    /// Definite collider: arrowheads meet at the node.
    Collider,
    /// Definite noncollider.
    Noncollider,
    /// Neither could be established.
    Ambiguous,
}

impl WitnessRole {
    const NONCOLLIDER_SCORE: f64 = 100.0;
    const AMBIGUOUS_SCORE: f64 = 30.0;
    const COLLIDER_SCORE: f64 = -80.0;
    const OFF_DAMPING: f64 = 0.3;

    /// Ranking score under `policy`; higher is preferred.
    #[must_use]
    pub fn score(self, policy: ColliderPolicy) -> f64 {
        let base = match self {
            Self::Noncollider => Self::NONCOLLIDER_SCORE,
            Self::Ambiguous => Self::AMBIGUOUS_SCORE,
            Self::Collider => Self::COLLIDER_SCORE,
        };
        if policy == ColliderPolicy::Off {
            base * Self::OFF_DAMPING
        } else {
            base
        }
    }

    /// True for roles kept by the collider filter.
    #[must_use]
    pub const fn passes_collider_filter(self) -> bool {
        !matches!(self, Self::Collider)
    }
}
