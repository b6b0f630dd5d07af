//! Observability policy: what a restricted projection may reveal.
//!
//! The policy is fixed when a session is created. Projections are then
//! produced by the session itself via
//! [`Session::restricted_copy`](crate::Session::restricted_copy); the
//! harness only decides *whether* a side gets a restricted copy or a
//! full clone.

use std::fmt;
use std::str::FromStr;

/// The rule a restricted projection applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// No restriction: a restricted copy reveals everything.
    FullInformation,
    /// Visible iff in an unobstructed line from the viewer, within the sight limit.
    LineOfSight,
    /// Visible iff within the sight limit of the viewer, regardless of walls.
    Radius,
}

impl PolicyKind {
    /// Whether this kind uses [`ObservabilityPolicy::sight_limit`].
    pub fn is_sight_limited(self) -> bool {
        !matches!(self, Self::FullInformation)
    }

    /// Canonical short name (accepted by [`FromStr`]).
    pub fn name(self) -> &'static str {
        match self {
            Self::FullInformation => "full",
            Self::LineOfSight => "los",
            Self::Radius => "radius",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An unrecognized policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown observability policy {0:?} (expected one of: full, los, radius)")]
pub struct UnknownPolicy(pub String);

impl FromStr for PolicyKind {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "full-information" | "none" => Ok(Self::FullInformation),
            "los" | "line-of-sight" => Ok(Self::LineOfSight),
            "radius" => Ok(Self::Radius),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

/// Policy kind plus its sight-limit parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObservabilityPolicy {
    /// Visibility rule.
    pub kind: PolicyKind,
    /// Maximum sight distance, in the session's own distance unit.
    /// Ignored by [`PolicyKind::FullInformation`].
    pub sight_limit: u32,
}

impl ObservabilityPolicy {
    /// Build a policy.
    pub fn new(kind: PolicyKind, sight_limit: u32) -> Self {
        Self { kind, sight_limit }
    }

    /// Whether something at `distance` from the viewer is within sight.
    ///
    /// Sessions that have no notion of obstruction may use this directly
    /// for both sight-limited kinds.
    pub fn within_sight(&self, distance: u64) -> bool {
        match self.kind {
            PolicyKind::FullInformation => true,
            PolicyKind::LineOfSight | PolicyKind::Radius => distance <= u64::from(self.sight_limit),
        }
    }
}

impl Default for ObservabilityPolicy {
    fn default() -> Self {
        Self {
            kind: PolicyKind::LineOfSight,
            sight_limit: 50,
        }
    }
}
