#![allow(dead_code)]

use depsched::config::{RawConfigFile, SchedulerConfig};
use depsched::dag::{DependencyEdge, DependencyGraph, EdgeKind, Task, TaskKind};
use depsched::probe::StructureProbe;
use depsched::rules::{DependencyRule, KeywordSet, RuleSet};
use depsched::types::FallbackPolicy;

/// Plain task with no keyword-bearing text.
pub fn task(key: &str) -> Task {
    Task::new(key, TaskKind::Other, format!("task {key}"))
}

pub fn button(key: &str, text: &str) -> Task {
    Task::new(key, TaskKind::Button, text)
}

pub fn input(key: &str) -> Task {
    Task::new(key, TaskKind::Input, format!("field {key}"))
}

pub fn checkbox(key: &str, text: &str) -> Task {
    Task::new(key, TaskKind::Checkbox, text)
}

/// `n` tasks named `t0..t{n-1}` that no standard rule relates.
pub fn independent_tasks(n: usize) -> Vec<Task> {
    (0..n).map(|i| task(&format!("t{i}"))).collect()
}

/// Graph over `keys` with the given `(from, to, weight)` edges.
pub fn graph_with_edges(keys: &[&str], edges: &[(&str, &str, u32)]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for key in keys {
        graph.add_task(task(key));
    }
    for (from, to, weight) in edges {
        graph.add_edge(DependencyEdge::new(
            *from,
            *to,
            EdgeKind::Containment,
            *weight,
            "test edge",
        ));
    }
    graph
}

/// Rule asserting one fixed edge whenever its two endpoints are paired.
#[derive(Debug, Clone)]
pub struct FixedEdgeRule {
    from: String,
    to: String,
    weight: u32,
}

impl DependencyRule for FixedEdgeRule {
    fn name(&self) -> &'static str {
        "fixed_edge"
    }

    fn classify(&self, a: &Task, b: &Task, _probe: &dyn StructureProbe) -> Option<DependencyEdge> {
        let matches = (a.key == self.from && b.key == self.to)
            || (a.key == self.to && b.key == self.from);
        matches.then(|| {
            DependencyEdge::new(
                self.from.as_str(),
                self.to.as_str(),
                EdgeKind::Containment,
                self.weight,
                "fixed test edge",
            )
        })
    }
}

/// Rule set producing exactly the given `(from, to, weight)` edges, one rule
/// per edge, with `unsafe_words` as the unsafe predicate.
pub fn fixed_rules(edges: &[(&str, &str, u32)], unsafe_words: &[&str]) -> RuleSet {
    let rules: Vec<Box<dyn DependencyRule>> = edges
        .iter()
        .map(|(from, to, weight)| {
            Box::new(FixedEdgeRule {
                from: from.to_string(),
                to: to.to_string(),
                weight: *weight,
            }) as Box<dyn DependencyRule>
        })
        .collect();
    RuleSet::new(rules, KeywordSet::new(unsafe_words).expect("valid keywords"))
}

/// Builder for `SchedulerConfig` with timings short enough for tests.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.executor.task_timeout = "2s".to_string();
        config.executor.group_timeout = "5s".to_string();
        config.executor.grace_period = "200ms".to_string();
        config.guard.lock_timeout = "200ms".to_string();
        config.guard.poll_interval = "10ms".to_string();
        Self { config }
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.executor.max_workers = n;
        self
    }

    pub fn task_timeout(mut self, d: &str) -> Self {
        self.config.executor.task_timeout = d.to_string();
        self
    }

    pub fn group_timeout(mut self, d: &str) -> Self {
        self.config.executor.group_timeout = d.to_string();
        self
    }

    pub fn grace_period(mut self, d: &str) -> Self {
        self.config.executor.grace_period = d.to_string();
        self
    }

    pub fn lock_timeout(mut self, d: &str) -> Self {
        self.config.guard.lock_timeout = d.to_string();
        self
    }

    pub fn conflict_threshold(mut self, n: usize) -> Self {
        self.config.guard.conflict_threshold = n;
        self
    }

    pub fn enable_parallel(mut self, on: bool) -> Self {
        self.config.executor.enable_parallel = on;
        self
    }

    pub fn fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.config.executor.fallback_policy = policy;
        self
    }

    pub fn risky_keywords(mut self, words: &[&str]) -> Self {
        self.config.rules.risky_keywords = words.iter().map(|w| w.to_string()).collect();
        self
    }

    pub fn build(self) -> SchedulerConfig {
        SchedulerConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
