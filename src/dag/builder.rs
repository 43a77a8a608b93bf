// src/dag/builder.rs

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::graph::DependencyGraph;
use crate::dag::task::Task;
use crate::probe::StructureProbe;
use crate::rules::RuleSet;

/// Turns a task list into a [`DependencyGraph`] by running every rule over
/// every unordered pair of tasks.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    rules: Arc<RuleSet>,
    probe: Arc<dyn StructureProbe>,
}

impl GraphBuilder {
    pub fn new(rules: Arc<RuleSet>, probe: Arc<dyn StructureProbe>) -> Self {
        Self { rules, probe }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Build the graph. Pairs are visited as `(tasks[i], tasks[j])` with
    /// `i < j`, so rules that orient by discovery order see the earlier task
    /// first.
    ///
    /// Duplicate keys keep their first occurrence.
    pub fn build(&self, tasks: &[Task]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        let mut unique: Vec<&Task> = Vec::with_capacity(tasks.len());

        for task in tasks {
            if graph.add_task(task.clone()) {
                unique.push(task);
            } else {
                warn!(task = %task.key, "duplicate task key; keeping first occurrence");
            }
        }

        for (i, a) in unique.iter().enumerate() {
            for b in &unique[i + 1..] {
                for edge in self.rules.classify(a, b, self.probe.as_ref()) {
                    debug!(
                        from = %edge.from,
                        to = %edge.to,
                        kind = %edge.kind,
                        weight = edge.weight,
                        reason = %edge.reason,
                        "dependency edge"
                    );
                    graph.add_edge(edge);
                }
            }
        }

        info!(
            tasks = graph.len(),
            edges = graph.edge_count(),
            "dependency graph built"
        );
        graph
    }
}
