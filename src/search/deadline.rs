//! Cooperative query deadlines.

use std::time::{Duration, Instant};

use crate::error::ExecutionError;

/// How many witness DFS steps run between clock reads.
pub(crate) const STEPS_PER_CHECK: u32 = 256;

/// A wall-clock budget checked at loop heads.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    expires_at: Option<Instant>,
    budget_ms: u64,
}

impl Deadline {
    /// A deadline that never expires.
    pub(crate) const fn unbounded() -> Self {
        Self {
            expires_at: None,
            budget_ms: 0,
        }
    }

    /// Expires `budget` from now.
    pub(crate) fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(budget),
            budget_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Builds a deadline from an optional budget.
    pub(crate) fn from_budget(budget: Option<Duration>) -> Self {
        budget.map_or_else(Self::unbounded, Self::after)
    }

    pub(crate) fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Fails with `ExecutionError::Timeout` once the budget is spent.
    pub(crate) fn check(&self) -> Result<(), ExecutionError> {
        if self.is_expired() {
            return Err(ExecutionError::Timeout {
                duration_ms: self.budget_ms,
            });
        }
        Ok(())
    }
}

/// Amortizes deadline checks over many cheap steps.
#[derive(Debug)]
pub(crate) struct StepClock<'a> {
    deadline: &'a Deadline,
    remaining: u32,
}

impl<'a> StepClock<'a> {
    pub(crate) fn new(deadline: &'a Deadline) -> Self {
        Self {
            deadline,
            remaining: STEPS_PER_CHECK,
        }
    }

    /// Counts one step, reading the clock every `STEPS_PER_CHECK` steps.
    pub(crate) fn tick(&mut self) -> Result<(), ExecutionError> {
        self.remaining -= 1;
        if self.remaining == 0 {
            self.remaining = STEPS_PER_CHECK;
            self.deadline.check()?;
        }
        Ok(())
    }
}
