//! Adjustment-set search.
//!
//! The pipeline per query is: resolve endpoints, compute the forbidden set and
//! the amenable-path backbone, grow distance shells around the endpoints to
//! build the candidate pool, then enumerate locally-minimal sets with a
//! ban-set branch and bound. Each branch grows Z by blocking witness paths and
//! trims it back to local minimality.

mod backbone;
mod blocker;
mod context;
mod deadline;
mod engine;
mod enumerate;
mod forbidden;
mod shells;
mod solver;
mod witness;

pub use context::PrecomputeContext;
pub use engine::AdjustmentEngine;
pub use shells::Shells;
pub use solver::ConditioningSet;

