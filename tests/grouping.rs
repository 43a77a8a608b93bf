// tests/grouping.rs

use depsched::dag::{partition, sort};
use depsched::dag::Task;
use depsched_test_utils::builders::graph_with_edges;

fn keys(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.key.as_str()).collect()
}

#[test]
fn dependent_tasks_land_in_different_groups() {
    let mut graph = graph_with_edges(&["A", "B", "C"], &[("B", "A", 10)]);
    let order = sort(&mut graph).order;

    let groups = partition(&graph, &order, |_| false);

    assert_eq!(groups.len(), 2);
    assert_eq!(keys(&groups[0].tasks), vec!["B", "C"]);
    assert_eq!(keys(&groups[1].tasks), vec!["A"]);
    assert!(groups[0].parallel_eligible);
    assert!(!groups[1].parallel_eligible, "single-task groups are serial");
    assert_eq!(groups[0].id, 0);
    assert_eq!(groups[1].id, 1);
}

#[test]
fn independent_tasks_form_one_parallel_group() {
    let mut graph = graph_with_edges(&["a", "b", "c", "d"], &[]);
    let order = sort(&mut graph).order;

    let groups = partition(&graph, &order, |_| false);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 4);
    assert!(groups[0].parallel_eligible);
}

#[test]
fn shared_ancestor_splits_siblings() {
    // x and y both depend on r, but not on each other.
    let mut graph = graph_with_edges(&["r", "x", "y"], &[("r", "x", 5), ("r", "y", 5)]);
    let order = sort(&mut graph).order;

    let groups = partition(&graph, &order, |_| false);

    let layout: Vec<Vec<&str>> = groups.iter().map(|g| keys(&g.tasks)).collect();
    assert_eq!(layout, vec![vec!["r"], vec!["x"], vec!["y"]]);
    assert!(groups.iter().all(|g| !g.parallel_eligible));
}

#[test]
fn later_group_can_be_parallel_again() {
    // p -> r and q -> s: after the cut at r, s has no ancestor in {r, p}.
    let mut graph = graph_with_edges(&["p", "q", "r", "s"], &[("p", "r", 5), ("q", "s", 5)]);
    let order = sort(&mut graph).order;
    assert_eq!(order, vec!["p", "q", "r", "s"]);

    let groups = partition(&graph, &order, |_| false);

    let layout: Vec<Vec<&str>> = groups.iter().map(|g| keys(&g.tasks)).collect();
    assert_eq!(layout, vec![vec!["p", "q"], vec!["r", "s"]]);
    assert!(groups.iter().all(|g| g.parallel_eligible));
    assert!(groups[1].closure.contains("p"));
    assert!(groups[1].closure.contains("q"));
}

#[test]
fn unsafe_member_forces_group_serial() {
    let mut graph = graph_with_edges(&["a", "b", "c"], &[]);
    let order = sort(&mut graph).order;

    let groups = partition(&graph, &order, |t| t.key == "b");

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 3);
    assert!(!groups[0].parallel_eligible);
}

#[test]
fn closure_holds_members_and_transitive_ancestors() {
    let mut graph = graph_with_edges(&["a", "b", "c"], &[("a", "b", 1), ("b", "c", 1)]);
    let order = sort(&mut graph).order;

    let groups = partition(&graph, &order, |_| false);

    assert_eq!(groups.len(), 3);
    let last = &groups[2];
    assert!(last.contains("c"));
    for key in ["a", "b", "c"] {
        assert!(last.closure.contains(key), "{key} missing from closure");
    }
}

#[test]
fn unknown_keys_in_order_are_skipped() {
    let graph = graph_with_edges(&["a"], &[]);
    let order = vec!["a".to_string(), "ghost".to_string()];

    let groups = partition(&graph, &order, |_| false);

    assert_eq!(groups.len(), 1);
    assert_eq!(keys(&groups[0].tasks), vec!["a"]);
}

#[test]
fn empty_order_gives_no_groups() {
    let graph = graph_with_edges(&[], &[]);
    assert!(partition(&graph, &[], |_| false).is_empty());
}
