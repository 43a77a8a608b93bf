// src/dag/topo.rs

//! Kahn's-algorithm ordering with weight-based tie-breaking and greedy cycle
//! repair.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::dag::edge::DependencyEdge;
use crate::dag::graph::DependencyGraph;
use crate::dag::task::TaskKey;

/// Result of [`sort`]: a full order over the graph plus every edge that had
/// to be dropped to make it acyclic.
#[derive(Debug, Clone, Default)]
pub struct SortOutcome {
    pub order: Vec<TaskKey>,
    pub removed: Vec<DependencyEdge>,
}

impl SortOutcome {
    pub fn repaired(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// Order every task so that each edge's source precedes its target.
///
/// Ready tasks are taken by smallest sum of incoming edge weights; ties go to
/// whichever became ready first (discovery order for the initial roots). If a
/// cycle blocks progress, the weakest edge is dropped via
/// [`break_weakest_edge`] and the sort is retried. Each retry removes one
/// edge, so the loop terminates.
pub fn sort(graph: &mut DependencyGraph) -> SortOutcome {
    let mut removed = Vec::new();

    loop {
        let order = kahn_order(graph);
        if order.len() == graph.len() {
            debug!(
                tasks = order.len(),
                repaired_edges = removed.len(),
                "topological order computed"
            );
            return SortOutcome { order, removed };
        }

        warn!(
            ordered = order.len(),
            total = graph.len(),
            "dependency cycle detected; breaking weakest edge"
        );

        match break_weakest_edge(graph) {
            Some(edge) => removed.push(edge),
            None => {
                // Unreachable for a consistent graph: an incomplete order
                // implies some node still has a positive in-degree.
                warn!("cycle repair found no removable edge; appending remaining tasks");
                let mut order = order;
                let rest: Vec<TaskKey> = {
                    let placed: HashSet<&str> = order.iter().map(|k| k.as_str()).collect();
                    graph
                        .keys()
                        .filter(|k| !placed.contains(k))
                        .map(|k| k.to_string())
                        .collect()
                };
                order.extend(rest);
                return SortOutcome { order, removed };
            }
        }
    }
}

/// One pass of Kahn's algorithm. Returns a partial order when the graph is
/// cyclic.
fn kahn_order(graph: &DependencyGraph) -> Vec<TaskKey> {
    let mut in_degree: HashMap<&str, usize> = graph.in_degrees();
    let weights: HashMap<&str, u64> = graph
        .keys()
        .map(|k| (k, graph.incoming_weight(k)))
        .collect();

    let mut ready: Vec<&str> = graph
        .keys()
        .filter(|k| in_degree.get(k).copied() == Some(0))
        .collect();
    let mut order: Vec<TaskKey> = Vec::with_capacity(graph.len());

    while !ready.is_empty() {
        // `min_by_key` keeps the first of equal minima, which preserves
        // ready-queue order for ties.
        let idx = ready
            .iter()
            .enumerate()
            .min_by_key(|(_, k)| weights.get(*k).copied().unwrap_or(0))
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let node = ready.remove(idx);
        order.push(node.to_string());

        for edge in graph.outgoing(node) {
            if let Some(degree) = in_degree.get_mut(edge.to.as_str()) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    ready.push(edge.to.as_str());
                }
            }
        }
    }

    order
}

/// Drop the weakest constraint blocking the sort.
///
/// Picks the node with the smallest positive in-degree (first in discovery
/// order on ties), then removes its lowest-weight incoming edge (first
/// inserted on ties) from both endpoints. Returns the removed edge, or
/// `None` if no node has incoming edges.
pub fn break_weakest_edge(graph: &mut DependencyGraph) -> Option<DependencyEdge> {
    let target: TaskKey = {
        let in_degree = graph.in_degrees();
        graph
            .keys()
            .filter_map(|k| in_degree.get(k).map(|d| (k, *d)))
            .filter(|(_, d)| *d > 0)
            .min_by_key(|(_, d)| *d)
            .map(|(k, _)| k.to_string())?
    };

    let edge = graph
        .incoming(&target)
        .iter()
        .min_by_key(|e| e.weight)
        .cloned()?;

    if !graph.remove_edge(&edge) {
        return None;
    }

    warn!(
        from = %edge.from,
        to = %edge.to,
        weight = edge.weight,
        kind = %edge.kind,
        reason = %edge.reason,
        "broke dependency cycle by removing edge"
    );

    Some(edge)
}
