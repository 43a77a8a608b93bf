// src/engine/plan.rs

use std::fmt;

use tracing::info;

use crate::dag::{
    DependencyEdge, DependencyGraph, ExecutionGroup, GraphBuilder, SortOutcome, Task, TaskKey,
    partition, sort,
};

/// Everything decided before the first task runs.
#[derive(Debug, Clone)]
pub struct SchedulePlan {
    /// Graph after cycle repair.
    pub graph: DependencyGraph,
    pub order: Vec<TaskKey>,
    pub groups: Vec<ExecutionGroup>,
    /// Edges dropped to make the graph acyclic, in removal order.
    pub repaired: Vec<DependencyEdge>,
}

impl SchedulePlan {
    /// Build, sort and partition without running anything.
    pub fn build(builder: &GraphBuilder, tasks: &[Task]) -> Self {
        let mut graph = builder.build(tasks);
        let SortOutcome { order, removed } = sort(&mut graph);

        let rules = builder.rules();
        let groups = partition(&graph, &order, |task| rules.is_unsafe(task));

        for group in &groups {
            let mode = if group.parallel_eligible {
                "parallel"
            } else {
                "serial"
            };
            info!(
                group = group.id,
                tasks = group.len(),
                mode,
                members = ?group.keys().collect::<Vec<_>>(),
                "planned group"
            );
        }

        Self {
            graph,
            order,
            groups,
            repaired: removed,
        }
    }

    pub fn parallel_groups(&self) -> usize {
        self.groups.iter().filter(|g| g.parallel_eligible).count()
    }

    /// Group id holding `key`, if any.
    pub fn group_of(&self, key: &str) -> Option<usize> {
        self.groups.iter().find(|g| g.contains(key)).map(|g| g.id)
    }
}

impl fmt::Display for SchedulePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "schedule plan: {} tasks, {} edges, {} groups ({} parallel)",
            self.graph.len(),
            self.graph.edge_count(),
            self.groups.len(),
            self.parallel_groups()
        )?;

        if !self.repaired.is_empty() {
            writeln!(f, "removed to break cycles:")?;
            for edge in &self.repaired {
                writeln!(f, "  - {edge}")?;
            }
        }

        for group in &self.groups {
            let mode = if group.parallel_eligible {
                "parallel"
            } else {
                "serial"
            };
            writeln!(f, "group {} [{mode}]:", group.id)?;
            for task in &group.tasks {
                writeln!(f, "  - {task}")?;
                for edge in self.graph.incoming(&task.key) {
                    writeln!(f, "      after {} ({}, w={})", edge.from, edge.kind, edge.weight)?;
                }
            }
        }

        Ok(())
    }
}
