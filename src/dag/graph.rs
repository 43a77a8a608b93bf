// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::dag::edge::DependencyEdge;
use crate::dag::task::{Task, TaskKey};

/// Internal node structure: the owning task plus both adjacency lists.
///
/// Every edge is stored twice, once in the source's `outgoing` and once in
/// the target's `incoming`; all mutation goes through [`DependencyGraph`]
/// so the two sides never drift apart.
#[derive(Debug, Clone)]
struct DagNode {
    task: Task,
    outgoing: Vec<DependencyEdge>,
    incoming: Vec<DependencyEdge>,
}

/// Directed dependency graph keyed by task identity.
///
/// Unlike a validated config DAG this one may be cyclic while it is being
/// built; [`crate::dag::topo::sort`] repairs cycles before anything
/// downstream consumes it. Node iteration follows discovery order so that
/// every algorithm on top of it is deterministic.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: HashMap<TaskKey, DagNode>,
    order: Vec<TaskKey>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task as a node. Returns `false` (and leaves the graph untouched)
    /// if a task with the same key is already present.
    pub fn add_task(&mut self, task: Task) -> bool {
        if self.nodes.contains_key(&task.key) {
            return false;
        }
        let key = task.key.clone();
        self.order.push(key.clone());
        self.nodes.insert(
            key,
            DagNode {
                task,
                outgoing: Vec::new(),
                incoming: Vec::new(),
            },
        );
        true
    }

    /// Insert an edge on both endpoints. Edges naming an unknown task are
    /// dropped with a warning.
    pub fn add_edge(&mut self, edge: DependencyEdge) -> bool {
        if !self.nodes.contains_key(&edge.from) || !self.nodes.contains_key(&edge.to) {
            warn!(
                from = %edge.from,
                to = %edge.to,
                "edge references a task that is not in the graph; ignoring"
            );
            return false;
        }

        if let Some(target) = self.nodes.get_mut(&edge.to) {
            target.incoming.push(edge.clone());
        }
        if let Some(source) = self.nodes.get_mut(&edge.from) {
            source.outgoing.push(edge);
        }
        true
    }

    /// Remove exactly one copy of `edge` from both endpoints.
    pub fn remove_edge(&mut self, edge: &DependencyEdge) -> bool {
        let removed_out = self
            .nodes
            .get_mut(&edge.from)
            .map(|n| remove_first(&mut n.outgoing, edge))
            .unwrap_or(false);
        let removed_in = self
            .nodes
            .get_mut(&edge.to)
            .map(|n| remove_first(&mut n.incoming, edge))
            .unwrap_or(false);

        debug_assert_eq!(removed_out, removed_in, "adjacency lists out of sync");
        removed_out && removed_in
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn task(&self, key: &str) -> Option<&Task> {
        self.nodes.get(key).map(|n| &n.task)
    }

    /// Task keys in discovery order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|k| k.as_str())
    }

    /// Tasks in discovery order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.order
            .iter()
            .filter_map(|k| self.nodes.get(k).map(|n| &n.task))
    }

    /// Edges leaving `key` (tasks that must wait for it).
    pub fn outgoing(&self, key: &str) -> &[DependencyEdge] {
        self.nodes
            .get(key)
            .map(|n| n.outgoing.as_slice())
            .unwrap_or(&[])
    }

    /// Edges entering `key` (tasks it waits for).
    pub fn incoming(&self, key: &str) -> &[DependencyEdge] {
        self.nodes
            .get(key)
            .map(|n| n.incoming.as_slice())
            .unwrap_or(&[])
    }

    /// Every edge, grouped by source in discovery order.
    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.order
            .iter()
            .filter_map(|k| self.nodes.get(k))
            .flat_map(|n| n.outgoing.iter())
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.outgoing.len()).sum()
    }

    /// Sum of incoming edge weights; the sort's tie-break score.
    pub fn incoming_weight(&self, key: &str) -> u64 {
        self.incoming(key).iter().map(|e| u64::from(e.weight)).sum()
    }

    /// Current in-degree of every node.
    pub fn in_degrees(&self) -> HashMap<&str, usize> {
        self.order
            .iter()
            .map(|k| (k.as_str(), self.incoming(k).len()))
            .collect()
    }

    /// Transitive predecessors of `key`, not including `key` itself unless
    /// it sits on a cycle.
    ///
    /// Walks incoming edges with an explicit stack so deep graphs cannot
    /// overflow the call stack.
    pub fn ancestors(&self, key: &str) -> HashSet<TaskKey> {
        let mut ancestors: HashSet<TaskKey> = HashSet::new();
        let mut stack: Vec<&str> = self.incoming(key).iter().map(|e| e.from.as_str()).collect();

        while let Some(name) = stack.pop() {
            if !ancestors.insert(name.to_string()) {
                continue;
            }
            stack.extend(self.incoming(name).iter().map(|e| e.from.as_str()));
        }

        ancestors
    }

    /// Returns some task that lies on a cycle, or `None` if the graph is
    /// acyclic.
    pub fn find_cycle_member(&self) -> Option<&str> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for key in self.keys() {
            graph.add_node(key);
        }
        for edge in self.edges() {
            graph.add_edge(edge.from.as_str(), edge.to.as_str(), ());
        }

        match toposort(&graph, None) {
            Ok(_order) => None,
            Err(cycle) => Some(cycle.node_id()),
        }
    }

    pub fn has_cycle(&self) -> bool {
        self.find_cycle_member().is_some()
    }
}

fn remove_first(edges: &mut Vec<DependencyEdge>, edge: &DependencyEdge) -> bool {
    match edges.iter().position(|e| e == edge) {
        Some(idx) => {
            edges.remove(idx);
            true
        }
        None => false,
    }
}
