//! Error types for causal-adjust.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! specific failure conditions. Soft "no solution" outcomes of the search
//! (an infeasible ban-set, a suppressed query) are not errors; they surface
//! as fewer or zero adjustment sets.

use thiserror::Error;

/// Validation errors raised before any search work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Treatment set cannot be empty")]
    EmptyTreatments,

    #[error("Outcome set cannot be empty")]
    EmptyOutcomes,

    #[error("Treatment and outcome must differ (both are '{node}')")]
    SameEndpoint {
        node: String,
    },

    #[error("Treatment and outcome sets must be disjoint ('{node}' appears in both)")]
    OverlappingEndpoints {
        node: String,
    },

    #[error("Node '{name}' does not exist in the graph")]
    UnknownNode {
        name: String,
    },

    #[error("Unknown graph type '{value}' (expected DAG, PDAG, MAG or PAG)")]
    InvalidGraphType {
        value: String,
    },

    #[error("Invalid endpoint selector code {code} (expected 1, 2 or 3)")]
    InvalidNearEndpoint {
        code: i32,
    },

    #[error("Invalid engine configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Errors raised while building or decoding a graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Node '{name}' already exists")]
    DuplicateNode {
        name: String,
    },

    #[error("Node '{name}' not found")]
    UnknownNode {
        name: String,
    },

    #[error("Node name cannot be empty")]
    EmptyNodeName,

    #[error("Self loop on '{name}' is not allowed")]
    SelfLoop {
        name: String,
    },

    #[error("Nodes '{a}' and '{b}' are already adjacent")]
    DuplicateEdge {
        a: String,
        b: String,
    },

    #[error("Malformed edge notation '{input}': {reason}")]
    InvalidEdgeNotation {
        input: String,
        reason: String,
    },
}

/// Errors raised while a search is running.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Adjustment search timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Branch worker pool disconnected")]
    Disconnected,

    #[error("Branch worker panicked")]
    WorkerPanicked,
}

/// Top-level error type for causal-adjust.
#[derive(Debug, Error)]
pub enum AdjustError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Failed to serialize {what}: {message}")]
    SerializationFailed {
        what: &'static str,
        message: String,
    },

    #[error("Failed to deserialize {what}: {message}")]
    DeserializationFailed {
        what: &'static str,
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl AdjustError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a graph construction error.
    #[must_use]
    pub const fn is_graph(&self) -> bool {
        matches!(self, Self::Graph(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if JSON encoding or decoding failed.
    #[must_use]
    pub const fn is_serialization(&self) -> bool {
        matches!(
            self,
            Self::SerializationFailed { .. } | Self::DeserializationFailed { .. }
        )
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if the search was cut short by its deadline.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Timeout { .. }))
    }
}

/// Result type alias for causal-adjust operations.
pub type AdjustResult<T> = Result<T, AdjustError>;
