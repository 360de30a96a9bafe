//! Engine and search-bound configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::policy::{ColliderPolicy, NoAmenablePolicy};

/// An optional upper bound.
///
/// Serializes as a signed integer where any negative value means
/// "unbounded", the convention used for radius and path-length limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Limit {
    /// No bound.
    #[default]
    Unbounded,
    /// Bounded by the given value (inclusive).
    AtMost(usize),
}

impl Limit {
    /// Maps negative values to `Unbounded`.
    #[must_use]
    pub fn from_signed(value: i64) -> Self {
        usize::try_from(value).map_or(Self::Unbounded, Self::AtMost)
    }

    /// True if `value` is within the bound.
    #[must_use]
    pub const fn allows(self, value: usize) -> bool {
        match self {
            Self::Unbounded => true,
            Self::AtMost(max) => value <= max,
        }
    }

    /// The bound, or `unbounded` when there is none.
    #[must_use]
    pub const fn resolve(self, unbounded: usize) -> usize {
        match self {
            Self::Unbounded => unbounded,
            Self::AtMost(max) => max,
        }
    }

    /// True if there is no bound.
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl From<i64> for Limit {
    fn from(value: i64) -> Self {
        Self::from_signed(value)
    }
}

impl From<Limit> for i64 {
    fn from(value: Limit) -> Self {
        match value {
            Limit::Unbounded => -1,
            Limit::AtMost(max) => i64::try_from(max).unwrap_or(i64::MAX),
        }
    }
}

/// Which endpoint's neighborhood the candidate pool is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearEndpoint {
    /// Shells grown from the treatment's backdoor-entry neighbors.
    Treatment,
    /// Shells grown from the outcome.
    Outcome,
    /// Both shells, restricted to nodes reachable from both sides.
    #[default]
    Both,
}

impl NearEndpoint {
    /// True if the treatment-side shells are consulted.
    #[must_use]
    pub const fn includes_treatment(self) -> bool {
        matches!(self, Self::Treatment | Self::Both)
    }

    /// True if the outcome-side shells are consulted.
    #[must_use]
    pub const fn includes_outcome(self) -> bool {
        matches!(self, Self::Outcome | Self::Both)
    }
}

/// Integer selector codes: 1 = treatment, 2 = outcome, 3 = both.
impl TryFrom<i32> for NearEndpoint {
    type Error = ValidationError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Treatment),
            2 => Ok(Self::Outcome),
            3 => Ok(Self::Both),
            _ => Err(ValidationError::InvalidNearEndpoint { code }),
        }
    }
}

/// What happens when a query runs past its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineBehavior {
    /// Stop enumerating and return the sets found so far.
    #[default]
    Partial,
    /// Fail the query with `ExecutionError::Timeout`.
    Cancel,
}

/// Engine-wide configuration.
///
/// Scoped to one engine instance; individual queries may override the
/// collider policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Blocker ranking policy.
    pub collider_policy: ColliderPolicy,
    /// Behavior when treatment and outcome share no amenable path.
    pub no_amenable_policy: NoAmenablePolicy,
    /// Worker threads used to solve ban-set branches. 1 = sequential.
    pub parallelism: usize,
    /// Optional wall-clock budget per query.
    pub max_duration_ms: Option<u64>,
    /// Outcome when the budget is exhausted.
    pub deadline_behavior: DeadlineBehavior,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collider_policy: ColliderPolicy::NoncolliderFirst,
            no_amenable_policy: NoAmenablePolicy::Search,
            parallelism: 1,
            max_duration_ms: None,
            deadline_behavior: DeadlineBehavior::Partial,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.parallelism == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "parallelism must be > 0".to_string(),
            });
        }
        if self.max_duration_ms == Some(0) {
            return Err(ValidationError::InvalidConfig {
                reason: "max_duration_ms must be > 0 when set".to_string(),
            });
        }
        Ok(())
    }

    /// The per-query budget as a `Duration`.
    #[must_use]
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_from_signed() {
        assert_eq!(Limit::from_signed(-1), Limit::Unbounded);
        assert_eq!(Limit::from_signed(-40), Limit::Unbounded);
        assert_eq!(Limit::from_signed(0), Limit::AtMost(0));
        assert_eq!(Limit::from(7), Limit::AtMost(7));
        assert!(Limit::AtMost(3).allows(3));
        assert!(!Limit::AtMost(3).allows(4));
        assert_eq!(Limit::Unbounded.resolve(12), 12);
    }

    #[test]
    fn test_limit_serializes_as_signed_integer() {
        assert_eq!(serde_json::to_string(&Limit::Unbounded).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&Limit::AtMost(4)).unwrap(), "4");
        let l: Limit = serde_json::from_str("-5").unwrap();
        assert_eq!(l, Limit::Unbounded);
    }

    #[test]
    fn test_near_endpoint_codes() {
        assert_eq!(NearEndpoint::try_from(1).unwrap(), NearEndpoint::Treatment);
        assert_eq!(NearEndpoint::try_from(2).unwrap(), NearEndpoint::Outcome);
        assert_eq!(NearEndpoint::try_from(3).unwrap(), NearEndpoint::Both);
        assert!(NearEndpoint::try_from(0).is_err());
        assert!(NearEndpoint::Both.includes_treatment());
        assert!(!NearEndpoint::Outcome.includes_treatment());
    }

    #[test]
    fn test_config_default_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_config_rejects_zero_limits() {
        let c = EngineConfig {
            parallelism: 0,
            ..EngineConfig::default()
        };
        assert!(c.validate().is_err());

        let c = EngineConfig {
            max_duration_ms: Some(0),
            ..EngineConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let c: EngineConfig = serde_json::from_str(r#"{"parallelism": 4}"#).unwrap();
        assert_eq!(c.parallelism, 4);
        assert_eq!(c.collider_policy, ColliderPolicy::NoncolliderFirst);
        assert_eq!(c.max_duration(), None);
    }
}
