//! Adjustment queries.
//!
//! An [`AdjustmentQuery`] names its endpoints and exclusion sets by node
//! name, so it can be written to JSON and replayed against any graph that
//! carries those names. [`Endpoints`] is the resolved, id-addressed form the
//! engine works with.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{Limit, NearEndpoint};
use crate::error::{AdjustError, AdjustResult, ValidationError};
use crate::graph::{CausalGraph, GraphType, NodeId};
use crate::policy::ColliderPolicy;

/// Default cap on the number of adjustment sets returned.
pub const DEFAULT_MAX_NUM_SETS: usize = 10;

/// Search-mode flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mode {
    /// Never adjust on the amenable backbone or forbidden nodes.
    ///
    /// Turning this off selects RB mode, which emulates separating-set
    /// search: causal-path interior nodes become selectable and the direct
    /// treatment-outcome edge no longer counts as a witness.
    pub avoid_amenable: bool,
    /// Nodes never traversed as intermediate hops nor selected.
    pub not_followed: Vec<String>,
    /// Nodes seeded into every adjustment set (if they are candidates).
    pub containing: Vec<String>,
}

impl Default for Mode {
    fn default() -> Self {
        Self {
            avoid_amenable: true,
            not_followed: Vec::new(),
            containing: Vec::new(),
        }
    }
}

impl Mode {
    /// True in RB (separating-set emulation) mode.
    #[must_use]
    pub const fn is_rb(&self) -> bool {
        !self.avoid_amenable
    }
}

/// A request for adjustment sets between treatments and outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentQuery {
    /// Correlates log lines and reports for this query.
    #[serde(default = "Uuid::new_v4")]
    pub request_id: Uuid,
    /// Treatment node names.
    pub treatments: Vec<String>,
    /// Outcome node names.
    pub outcomes: Vec<String>,
    /// How the graph's edges are interpreted.
    #[serde(default)]
    pub graph_type: GraphType,
    /// Maximum number of distinct sets to return.
    #[serde(default = "default_max_num_sets")]
    pub max_num_sets: usize,
    /// Shell radius bounding the candidate pool.
    #[serde(default)]
    pub max_radius: Limit,
    /// Which endpoint shells feed the candidate pool.
    #[serde(default)]
    pub near: NearEndpoint,
    /// Edge bound for witness paths and amenable paths.
    #[serde(default)]
    pub max_path_length: Limit,
    /// Overrides the engine's collider policy for this query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collider_policy: Option<ColliderPolicy>,
    /// Mode flags and exclusion sets.
    #[serde(default)]
    pub mode: Mode,
}

fn default_max_num_sets() -> usize {
    DEFAULT_MAX_NUM_SETS
}

impl AdjustmentQuery {
    /// Starts a query builder.
    #[must_use]
    pub fn builder() -> AdjustmentQueryBuilder {
        AdjustmentQueryBuilder::new()
    }

    /// A single treatment/outcome query with default bounds.
    pub fn single(treatment: impl Into<String>, outcome: impl Into<String>) -> Result<Self, ValidationError> {
        Self::builder().treatment(treatment).outcome(outcome).build()
    }

    /// Checks name-level invariants: non-empty and disjoint endpoints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.treatments.is_empty() {
            return Err(ValidationError::EmptyTreatments);
        }
        if self.outcomes.is_empty() {
            return Err(ValidationError::EmptyOutcomes);
        }
        if let Some(shared) = self.treatments.iter().find(|t| self.outcomes.contains(t)) {
            if self.treatments.len() == 1 && self.outcomes.len() == 1 {
                return Err(ValidationError::SameEndpoint { node: shared.clone() });
            }
            return Err(ValidationError::OverlappingEndpoints { node: shared.clone() });
        }
        Ok(())
    }

    /// Serializes the query as pretty JSON.
    pub fn to_json_pretty(&self) -> AdjustResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AdjustError::SerializationFailed {
            what: "query",
            message: e.to_string(),
        })
    }

    /// Deserializes and validates a query.
    pub fn from_json(s: &str) -> AdjustResult<Self> {
        let query: Self = serde_json::from_str(s).map_err(|e| AdjustError::DeserializationFailed {
            what: "query",
            message: e.to_string(),
        })?;
        query.validate()?;
        Ok(query)
    }
}

/// Builder for [`AdjustmentQuery`].
///
/// # Example
/// ```
/// use causal_adjust::{AdjustmentQuery, GraphType, Limit};
///
/// let query = AdjustmentQuery::builder()
///     .treatment("X")
///     .outcome("Y")
///     .graph_type(GraphType::Pag)
///     .max_num_sets(3)
///     .max_radius(Limit::AtMost(2))
///     .build()
///     .unwrap();
/// assert_eq!(query.max_num_sets, 3);
/// ```
#[derive(Debug, Clone)]
pub struct AdjustmentQueryBuilder {
    query: AdjustmentQuery,
}

impl Default for AdjustmentQueryBuilder {
    fn default() -> Self {
        Self {
            query: AdjustmentQuery {
                request_id: Uuid::new_v4(),
                treatments: Vec::new(),
                outcomes: Vec::new(),
                graph_type: GraphType::default(),
                max_num_sets: DEFAULT_MAX_NUM_SETS,
                max_radius: Limit::Unbounded,
                near: NearEndpoint::default(),
                max_path_length: Limit::Unbounded,
                collider_policy: None,
                mode: Mode::default(),
            },
        }
    }
}

impl AdjustmentQueryBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a treatment node.
    #[must_use]
    pub fn treatment(mut self, name: impl Into<String>) -> Self {
        self.query.treatments.push(name.into());
        self
    }

    /// Add several treatment nodes.
    #[must_use]
    pub fn treatments<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.treatments.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add an outcome node.
    #[must_use]
    pub fn outcome(mut self, name: impl Into<String>) -> Self {
        self.query.outcomes.push(name.into());
        self
    }

    /// Add several outcome nodes.
    #[must_use]
    pub fn outcomes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.outcomes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set the graph type (default: DAG).
    #[must_use]
    pub fn graph_type(mut self, graph_type: GraphType) -> Self {
        self.query.graph_type = graph_type;
        self
    }

    /// Set the maximum number of sets (default: 10).
    #[must_use]
    pub fn max_num_sets(mut self, max: usize) -> Self {
        self.query.max_num_sets = max;
        self
    }

    /// Bound the candidate shells (default: unbounded).
    #[must_use]
    pub fn max_radius(mut self, radius: impl Into<Limit>) -> Self {
        self.query.max_radius = radius.into();
        self
    }

    /// Select which endpoint shells feed the pool (default: both).
    #[must_use]
    pub fn near(mut self, near: NearEndpoint) -> Self {
        self.query.near = near;
        self
    }

    /// Bound witness and amenable path length in edges (default: unbounded).
    #[must_use]
    pub fn max_path_length(mut self, length: impl Into<Limit>) -> Self {
        self.query.max_path_length = length.into();
        self
    }

    /// Override the engine's collider policy.
    #[must_use]
    pub fn collider_policy(mut self, policy: ColliderPolicy) -> Self {
        self.query.collider_policy = Some(policy);
        self
    }

    /// Toggle amenable-backbone avoidance (default: on).
    #[must_use]
    pub fn avoid_amenable(mut self, avoid: bool) -> Self {
        self.query.mode.avoid_amenable = avoid;
        self
    }

    /// Switch RB mode on or off.
    #[must_use]
    pub fn rb_mode(self, rb: bool) -> Self {
        self.avoid_amenable(!rb)
    }

    /// Never traverse or select `name`.
    #[must_use]
    pub fn not_followed(mut self, name: impl Into<String>) -> Self {
        self.query.mode.not_followed.push(name.into());
        self
    }

    /// Seed `name` into every adjustment set.
    #[must_use]
    pub fn containing(mut self, name: impl Into<String>) -> Self {
        self.query.mode.containing.push(name.into());
        self
    }

    /// Use a fixed request id instead of a random one.
    #[must_use]
    pub fn request_id(mut self, id: Uuid) -> Self {
        self.query.request_id = id;
        self
    }

    /// Build the query.
    ///
    /// Returns `ValidationError` if either endpoint set is empty or the two
    /// sets share a node.
    pub fn build(self) -> Result<AdjustmentQuery, ValidationError> {
        self.query.validate()?;
        Ok(self.query)
    }
}

/// Resolved treatment and outcome node sets.
///
/// Both sets are non-empty, duplicate-free (first mention wins) and
/// disjoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    treatments: Vec<NodeId>,
    outcomes: Vec<NodeId>,
}

/// Resolves names to ids in first-mention order, dropping repeats.
pub(crate) fn resolve_names(graph: &dyn CausalGraph, names: &[String]) -> Result<Vec<NodeId>, ValidationError> {
    let mut ids: Vec<NodeId> = Vec::with_capacity(names.len());
    for name in names {
        let id = graph
            .node_id(name)
            .ok_or_else(|| ValidationError::UnknownNode { name: name.clone() })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

impl Endpoints {
    /// Resolves and validates the endpoints of `query` against `graph`.
    pub fn resolve(graph: &dyn CausalGraph, query: &AdjustmentQuery) -> Result<Self, ValidationError> {
        query.validate()?;
        let treatments = resolve_names(graph, &query.treatments)?;
        let outcomes = resolve_names(graph, &query.outcomes)?;
        Ok(Self { treatments, outcomes })
    }

    /// Treatments in first-mention order.
    #[must_use]
    pub fn treatments(&self) -> &[NodeId] {
        &self.treatments
    }

    /// Outcomes in first-mention order.
    #[must_use]
    pub fn outcomes(&self) -> &[NodeId] {
        &self.outcomes
    }

    /// True for the one-treatment, one-outcome form.
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.treatments.len() == 1 && self.outcomes.len() == 1
    }

    /// True if `node` is a treatment.
    #[must_use]
    pub fn is_treatment(&self, node: NodeId) -> bool {
        self.treatments.contains(&node)
    }

    /// True if `node` is an outcome.
    #[must_use]
    pub fn is_outcome(&self, node: NodeId) -> bool {
        self.outcomes.contains(&node)
    }

    /// True if `node` is either endpoint.
    #[must_use]
    pub fn is_endpoint(&self, node: NodeId) -> bool {
        self.is_treatment(node) || self.is_outcome(node)
    }
}
