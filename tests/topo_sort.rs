// tests/topo_sort.rs

mod common;
use crate::common::{init_tracing, pos};

use depsched::dag::{break_weakest_edge, sort};
use depsched_test_utils::builders::graph_with_edges;

#[test]
fn acyclic_order_respects_every_edge() {
    init_tracing();
    let mut graph = graph_with_edges(
        &["a", "b", "c", "d", "e"],
        &[("a", "b", 5), ("b", "d", 3), ("c", "d", 10), ("a", "e", 1)],
    );

    let outcome = sort(&mut graph);

    assert!(!outcome.repaired());
    assert_eq!(outcome.order.len(), 5);
    for edge in graph.edges() {
        assert!(
            pos(&outcome.order, &edge.from) < pos(&outcome.order, &edge.to),
            "{edge} violated by {:?}",
            outcome.order
        );
    }
}

#[test]
fn single_edge_scenario_orders_source_first() {
    let mut graph = graph_with_edges(&["A", "B", "C"], &[("B", "A", 10)]);

    let outcome = sort(&mut graph);

    // C carries no incoming weight, so it beats A once both are ready.
    assert_eq!(outcome.order, vec!["B", "C", "A"]);
}

#[test]
fn ready_tasks_are_taken_by_smallest_incoming_weight() {
    // r unlocks x (weight 8) and y (weight 2); y goes first despite being
    // discovered later.
    let mut graph = graph_with_edges(&["r", "x", "y"], &[("r", "x", 8), ("r", "y", 2)]);

    let outcome = sort(&mut graph);

    assert_eq!(outcome.order, vec!["r", "y", "x"]);
}

#[test]
fn equal_weights_keep_discovery_order() {
    let mut graph = graph_with_edges(&["c", "a", "b"], &[]);

    let outcome = sort(&mut graph);

    assert_eq!(outcome.order, vec!["c", "a", "b"]);
}

#[test]
fn two_cycle_drops_the_weaker_edge() {
    init_tracing();
    let mut graph = graph_with_edges(&["X", "Y"], &[("X", "Y", 5), ("Y", "X", 3)]);

    let outcome = sort(&mut graph);

    assert_eq!(outcome.order, vec!["X", "Y"]);
    assert_eq!(outcome.removed.len(), 1);
    assert_eq!(outcome.removed[0].from, "Y");
    assert_eq!(outcome.removed[0].to, "X");
    assert_eq!(outcome.removed[0].weight, 3);

    // Removal is symmetric.
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.incoming("X").is_empty());
    assert!(graph.outgoing("Y").is_empty());
    assert!(!graph.has_cycle());
}

#[test]
fn self_loop_is_repaired() {
    let mut graph = graph_with_edges(&["a", "b"], &[("a", "a", 4)]);

    let outcome = sort(&mut graph);

    assert_eq!(outcome.order, vec!["a", "b"]);
    assert_eq!(outcome.removed.len(), 1);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn longer_cycle_keeps_the_surviving_edges() {
    let mut graph = graph_with_edges(
        &["a", "b", "c", "d"],
        &[("a", "b", 10), ("b", "c", 10), ("c", "a", 2), ("c", "d", 1)],
    );
    let before = graph.edge_count();

    let outcome = sort(&mut graph);

    assert!(outcome.repaired());
    assert!(graph.edge_count() < before);
    assert_eq!(outcome.order.len(), 4);
    for edge in graph.edges() {
        assert!(pos(&outcome.order, &edge.from) < pos(&outcome.order, &edge.to));
    }
    assert!(outcome.removed.iter().any(|e| e.from == "c" && e.to == "a"));
}

#[test]
fn sorting_twice_gives_the_same_order() {
    let build = || {
        graph_with_edges(
            &["p", "q", "r", "s", "t"],
            &[("p", "r", 3), ("q", "r", 3), ("s", "t", 7), ("t", "s", 7)],
        )
    };

    let first = sort(&mut build());
    let second = sort(&mut build());

    assert_eq!(first.order, second.order);
    assert_eq!(first.removed, second.removed);
}

#[test]
fn repair_targets_the_node_with_the_smallest_in_degree() {
    // In-degrees: a = 2, b = 1.
    let mut graph = graph_with_edges(&["a", "b"], &[("a", "b", 9), ("b", "a", 1), ("b", "a", 1)]);

    let removed = break_weakest_edge(&mut graph).expect("an edge to remove");

    assert_eq!((removed.from.as_str(), removed.to.as_str()), ("a", "b"));
    assert_eq!(graph.incoming("b").len(), 0);
    assert_eq!(graph.incoming("a").len(), 2);
}

#[test]
fn repair_ties_go_to_discovery_then_insertion_order() {
    // Every node has in-degree 2, so x (discovered first) is the target;
    // both of its incoming edges weigh 2 and the first inserted goes.
    let mut graph = graph_with_edges(
        &["x", "y", "z"],
        &[
            ("y", "x", 2),
            ("z", "x", 2),
            ("x", "y", 9),
            ("z", "y", 9),
            ("x", "z", 9),
            ("y", "z", 9),
        ],
    );

    let removed = break_weakest_edge(&mut graph).expect("an edge to remove");

    assert_eq!((removed.from.as_str(), removed.to.as_str()), ("y", "x"));
    assert_eq!(graph.incoming("x").len(), 1);
    assert_eq!(graph.incoming("x")[0].from, "z");
}

#[test]
fn break_weakest_edge_on_edgeless_graph_is_none() {
    let mut graph = graph_with_edges(&["a"], &[]);
    assert!(break_weakest_edge(&mut graph).is_none());
}
