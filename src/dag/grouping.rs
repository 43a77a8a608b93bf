// src/dag/grouping.rs

//! Partition a topological order into execution groups.

use std::collections::HashSet;

use tracing::debug;

use crate::dag::graph::DependencyGraph;
use crate::dag::task::{Task, TaskKey};

/// A run of consecutive tasks (in topological order) that were judged safe
/// to attempt together.
#[derive(Debug, Clone)]
pub struct ExecutionGroup {
    pub id: usize,
    pub tasks: Vec<Task>,
    /// Every member plus every task any member transitively depends on.
    pub closure: HashSet<TaskKey>,
    /// Computed once after membership is final: more than one member and no
    /// member flagged unsafe.
    pub parallel_eligible: bool,
}

impl ExecutionGroup {
    fn new(id: usize, tasks: Vec<Task>, closure: HashSet<TaskKey>) -> Self {
        Self {
            id,
            tasks,
            closure,
            parallel_eligible: false,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.key.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tasks.iter().any(|t| t.key == key)
    }
}

/// Walk `order` once and cut it into groups.
///
/// A task starts a new group when its ancestor closure intersects the
/// current group's accumulated closure; otherwise it joins. Sharing any
/// ancestor is treated as a conflict even without a direct edge, since both
/// tasks may touch whatever state that ancestor set up.
///
/// Keys in `order` that are not in `graph` are skipped.
pub fn partition<F>(graph: &DependencyGraph, order: &[TaskKey], is_unsafe: F) -> Vec<ExecutionGroup>
where
    F: Fn(&Task) -> bool,
{
    let mut groups: Vec<ExecutionGroup> = Vec::new();
    let mut current: Vec<Task> = Vec::new();
    let mut closure: HashSet<TaskKey> = HashSet::new();

    for key in order {
        let Some(task) = graph.task(key) else {
            debug!(task = %key, "ordered key not present in graph; skipping");
            continue;
        };

        let ancestors = graph.ancestors(key);

        if !current.is_empty() && !ancestors.is_disjoint(&closure) {
            let id = groups.len();
            groups.push(ExecutionGroup::new(
                id,
                std::mem::take(&mut current),
                std::mem::take(&mut closure),
            ));
        }

        current.push(task.clone());
        closure.insert(key.clone());
        closure.extend(ancestors);
    }

    if !current.is_empty() {
        let id = groups.len();
        groups.push(ExecutionGroup::new(id, current, closure));
    }

    for group in groups.iter_mut() {
        group.parallel_eligible = group.len() > 1 && !group.tasks.iter().any(&is_unsafe);
    }

    debug!(groups = groups.len(), "partitioned order into execution groups");
    groups
}
