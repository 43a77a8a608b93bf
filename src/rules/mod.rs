// src/rules/mod.rs

//! Pairwise classification rules that feed the graph builder.
//!
//! Each rule looks at one unordered pair of tasks and asserts at most one
//! directed edge. Rules are immutable values collected in a [`RuleSet`];
//! the keyword tables they consult come from [`crate::config::RulesConfig`].
//!
//! - [`keywords`] holds the case-insensitive keyword matcher.
//! - [`builtin`] holds the five standard rules.

pub mod builtin;
pub mod keywords;

use std::fmt::Debug;

use crate::config::RulesConfig;
use crate::dag::{DependencyEdge, Task};
use crate::errors::{Result, SchedulerError};
use crate::probe::StructureProbe;

pub use builtin::{
    ContainmentRule, CounterPair, GroupMembershipRule, RiskOrderingRule, SharedCounterRule,
    StateGateRule,
};
pub use keywords::KeywordSet;

/// A single classification rule.
///
/// `a` precedes `b` in discovery order; the rule decides the direction of
/// any edge it returns. Probe failures must be swallowed and reported as
/// `None`.
pub trait DependencyRule: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn classify(&self, a: &Task, b: &Task, probe: &dyn StructureProbe) -> Option<DependencyEdge>;
}

/// Ordered, immutable collection of rules plus the "unsafe task" predicate.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<Box<dyn DependencyRule>>,
    risky: KeywordSet,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn DependencyRule>>, risky: KeywordSet) -> Self {
        Self { rules, risky }
    }

    /// The five standard rules, configured from `cfg`.
    pub fn from_config(cfg: &RulesConfig) -> Result<Self> {
        let risky = compile(&cfg.risky_keywords, "risky_keywords")?;

        let pairs = cfg
            .counter_pairs
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                Ok(CounterPair {
                    increase: compile(&p.increase, &format!("counter_pairs[{idx}].increase"))?,
                    decrease: compile(&p.decrease, &format!("counter_pairs[{idx}].decrease"))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let rules: Vec<Box<dyn DependencyRule>> = vec![
            Box::new(GroupMembershipRule::new(compile(
                &cfg.submit_keywords,
                "submit_keywords",
            )?)),
            Box::new(ContainmentRule),
            Box::new(StateGateRule::new(
                compile(&cfg.state_trigger_keywords, "state_trigger_keywords")?,
                compile(&cfg.dependent_action_keywords, "dependent_action_keywords")?,
                cfg.proximity_threshold,
            )),
            Box::new(SharedCounterRule::new(pairs)),
            Box::new(RiskOrderingRule::new(risky.clone())),
        ];

        Ok(Self::new(rules, risky))
    }

    /// Standard rules with the default keyword tables.
    pub fn standard() -> Result<Self> {
        Self::from_config(&RulesConfig::default())
    }

    /// Append another rule; it runs after the existing ones.
    pub fn with_rule(mut self, rule: Box<dyn DependencyRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule on the pair, in order. Edges from different rules are
    /// all kept, even when they connect the same two tasks.
    pub fn classify(&self, a: &Task, b: &Task, probe: &dyn StructureProbe) -> Vec<DependencyEdge> {
        self.rules
            .iter()
            .filter_map(|rule| rule.classify(a, b, probe))
            .collect()
    }

    /// Whether a task must never share a parallel group.
    pub fn is_unsafe(&self, task: &Task) -> bool {
        self.risky.matches(&task.text)
    }
}

fn compile(words: &[String], field: &str) -> Result<KeywordSet> {
    KeywordSet::new(words).map_err(|e| {
        SchedulerError::ConfigError(format!("[rules].{field} could not be compiled: {e}"))
    })
}
