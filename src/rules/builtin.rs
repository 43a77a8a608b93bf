// src/rules/builtin.rs

//! The standard rule table.

use tracing::{debug, warn};

use crate::dag::{DependencyEdge, EdgeKind, Task, TaskKind};
use crate::probe::{Relation, StructureProbe};
use crate::rules::{DependencyRule, KeywordSet};

pub const GROUP_MEMBERSHIP_WEIGHT: u32 = 10;
pub const CONTAINMENT_WEIGHT: u32 = 5;
pub const SIBLING_WEIGHT: u32 = 3;
pub const STATE_GATE_WEIGHT: u32 = 8;
pub const SHARED_COUNTER_WEIGHT: u32 = 10;
pub const RISK_ORDERING_WEIGHT: u32 = 6;

/// Fields of a group must be filled before that group's submit control.
#[derive(Debug, Clone)]
pub struct GroupMembershipRule {
    submit: KeywordSet,
}

impl GroupMembershipRule {
    pub fn new(submit: KeywordSet) -> Self {
        Self { submit }
    }

    fn is_submit(&self, task: &Task) -> bool {
        task.kind == TaskKind::Button && self.submit.matches(&task.text)
    }

    fn edge(field: &Task, submit: &Task) -> DependencyEdge {
        DependencyEdge::new(
            &field.key,
            &submit.key,
            EdgeKind::GroupMembership,
            GROUP_MEMBERSHIP_WEIGHT,
            format!(
                "group '{}': field '{}' must be filled before submit '{}'",
                field.group.as_deref().unwrap_or_default(),
                field.text,
                submit.text
            ),
        )
    }
}

impl DependencyRule for GroupMembershipRule {
    fn name(&self) -> &'static str {
        "group_membership"
    }

    fn classify(&self, a: &Task, b: &Task, _probe: &dyn StructureProbe) -> Option<DependencyEdge> {
        if !a.shares_group_with(b) {
            return None;
        }
        if a.kind.is_field() && self.is_submit(b) {
            return Some(Self::edge(a, b));
        }
        if b.kind.is_field() && self.is_submit(a) {
            return Some(Self::edge(b, a));
        }
        None
    }
}

/// Containers before their contents; components' siblings one at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainmentRule;

impl DependencyRule for ContainmentRule {
    fn name(&self) -> &'static str {
        "containment"
    }

    fn classify(&self, a: &Task, b: &Task, probe: &dyn StructureProbe) -> Option<DependencyEdge> {
        let relation = match probe.relation(&a.key, &b.key) {
            Ok(r) => r,
            Err(e) => {
                warn!(a = %a.key, b = %b.key, error = %e, "containment query failed; no edge");
                return None;
            }
        };

        match relation {
            Relation::Contains => Some(DependencyEdge::new(
                &a.key,
                &b.key,
                EdgeKind::Containment,
                CONTAINMENT_WEIGHT,
                format!("'{}' contains '{}' and must be engaged first", a.text, b.text),
            )),
            Relation::ContainedBy => Some(DependencyEdge::new(
                &b.key,
                &a.key,
                EdgeKind::Containment,
                CONTAINMENT_WEIGHT,
                format!("'{}' contains '{}' and must be engaged first", b.text, a.text),
            )),
            Relation::SharedComponent => Some(DependencyEdge::new(
                &a.key,
                &b.key,
                EdgeKind::Containment,
                SIBLING_WEIGHT,
                "siblings in the same tab/accordion component run one at a time",
            )),
            Relation::Unrelated => None,
        }
    }
}

/// A toggle that gates an action must be set before the action fires.
#[derive(Debug, Clone)]
pub struct StateGateRule {
    triggers: KeywordSet,
    actions: KeywordSet,
    proximity_threshold: f64,
}

impl StateGateRule {
    pub fn new(triggers: KeywordSet, actions: KeywordSet, proximity_threshold: f64) -> Self {
        Self {
            triggers,
            actions,
            proximity_threshold,
        }
    }

    fn is_trigger(&self, task: &Task) -> bool {
        task.kind == TaskKind::Checkbox && self.triggers.matches(&task.text)
    }

    fn is_action(&self, task: &Task) -> bool {
        task.kind == TaskKind::Button && self.actions.matches(&task.text)
    }

    fn is_close(&self, a: &Task, b: &Task, probe: &dyn StructureProbe) -> bool {
        match probe.distance(&a.key, &b.key) {
            Ok(d) => d < self.proximity_threshold,
            Err(e) => {
                debug!(a = %a.key, b = %b.key, error = %e, "distance query failed; treating as far apart");
                false
            }
        }
    }

    fn edge(toggle: &Task, action: &Task) -> DependencyEdge {
        DependencyEdge::new(
            &toggle.key,
            &action.key,
            EdgeKind::StateGate,
            STATE_GATE_WEIGHT,
            format!("'{}' must be set before '{}'", toggle.text, action.text),
        )
    }
}

impl DependencyRule for StateGateRule {
    fn name(&self) -> &'static str {
        "state_gate"
    }

    fn classify(&self, a: &Task, b: &Task, probe: &dyn StructureProbe) -> Option<DependencyEdge> {
        if self.is_trigger(a) && self.is_action(b) && self.is_close(a, b, probe) {
            return Some(Self::edge(a, b));
        }
        if self.is_trigger(b) && self.is_action(a) && self.is_close(a, b, probe) {
            return Some(Self::edge(b, a));
        }
        None
    }
}

/// Two keyword tables naming opposite operations on one piece of state
/// (increment/decrement, up/down, open/close).
#[derive(Debug, Clone)]
pub struct CounterPair {
    pub increase: KeywordSet,
    pub decrease: KeywordSet,
}

impl CounterPair {
    fn involves(&self, task: &Task) -> bool {
        self.increase.matches(&task.text) || self.decrease.matches(&task.text)
    }
}

/// Controls that mutate a shared counter in the same container serialize.
#[derive(Debug, Clone)]
pub struct SharedCounterRule {
    pairs: Vec<CounterPair>,
}

impl SharedCounterRule {
    pub fn new(pairs: Vec<CounterPair>) -> Self {
        Self { pairs }
    }
}

impl DependencyRule for SharedCounterRule {
    fn name(&self) -> &'static str {
        "shared_counter"
    }

    fn classify(&self, a: &Task, b: &Task, probe: &dyn StructureProbe) -> Option<DependencyEdge> {
        for pair in &self.pairs {
            if !(pair.involves(a) && pair.involves(b)) {
                continue;
            }

            match probe.share_container(&a.key, &b.key) {
                Ok(true) => {
                    return Some(DependencyEdge::new(
                        &a.key,
                        &b.key,
                        EdgeKind::SharedCounter,
                        SHARED_COUNTER_WEIGHT,
                        format!("'{}' and '{}' share counter state", a.text, b.text),
                    ));
                }
                Ok(false) => {}
                Err(e) => {
                    debug!(a = %a.key, b = %b.key, error = %e, "container query failed; no edge");
                }
            }
        }
        None
    }
}

/// Risky operations run after everything that is not risky.
#[derive(Debug, Clone)]
pub struct RiskOrderingRule {
    risky: KeywordSet,
}

impl RiskOrderingRule {
    pub fn new(risky: KeywordSet) -> Self {
        Self { risky }
    }

    fn edge(safe: &Task, risky: &Task) -> DependencyEdge {
        DependencyEdge::new(
            &safe.key,
            &risky.key,
            EdgeKind::RiskOrdering,
            RISK_ORDERING_WEIGHT,
            format!("risky '{}' runs after '{}'", risky.text, safe.text),
        )
    }
}

impl DependencyRule for RiskOrderingRule {
    fn name(&self) -> &'static str {
        "risk_ordering"
    }

    fn classify(&self, a: &Task, b: &Task, _probe: &dyn StructureProbe) -> Option<DependencyEdge> {
        let a_risky = self.risky.matches(&a.text);
        let b_risky = self.risky.matches(&b.text);

        match (a_risky, b_risky) {
            (true, false) => Some(Self::edge(b, a)),
            (false, true) => Some(Self::edge(a, b)),
            _ => None,
        }
    }
}
