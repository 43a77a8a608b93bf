// src/dag/edge.rs

use std::fmt;

use serde::Serialize;

use crate::dag::task::TaskKey;

/// Which classification rule asserted an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    GroupMembership,
    Containment,
    StateGate,
    SharedCounter,
    RiskOrdering,
}

impl EdgeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            EdgeKind::GroupMembership => "group_membership",
            EdgeKind::Containment => "containment",
            EdgeKind::StateGate => "state_gate",
            EdgeKind::SharedCounter => "shared_counter",
            EdgeKind::RiskOrdering => "risk_ordering",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directed "run-before" relationship: `from` must complete before `to`
/// starts.
///
/// Parallel edges between the same pair are legal and all retained; each
/// one adds its weight to the target's tie-break score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub from: TaskKey,
    pub to: TaskKey,
    pub kind: EdgeKind,
    pub reason: String,
    /// Always >= 1.
    pub weight: u32,
}

impl DependencyEdge {
    pub fn new(
        from: impl Into<TaskKey>,
        to: impl Into<TaskKey>,
        kind: EdgeKind,
        weight: u32,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            reason: reason.into(),
            weight: weight.max(1),
        }
    }
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [{} w={}] {}",
            self.from, self.to, self.kind, self.weight, self.reason
        )
    }
}
