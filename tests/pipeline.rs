// tests/pipeline.rs

mod common;
use crate::common::init_tracing;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use depsched::config::SchedulerConfig;
use depsched::dag::{StaticTaskSource, Task, TaskSource};
use depsched::errors::SchedulerError;
use depsched::probe::NullProbe;
use depsched::probe::mock::MockProbe;
use depsched_test_utils::builders::{button, checkbox, input, task};
use depsched_test_utils::{FakeRunner, with_timeout};

struct BrokenSource;

impl TaskSource for BrokenSource {
    fn discover(&self) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Task>>> + Send + '_>> {
        Box::pin(async { Err(anyhow!("page did not load")) })
    }
}

fn signup_page() -> Vec<Task> {
    vec![
        input("email").in_group("signup"),
        input("password").in_group("signup"),
        checkbox("terms", "I agree").in_group("signup"),
        button("register", "Register").in_group("signup"),
        task("help"),
        button("close-account", "Delete account"),
    ]
}

#[tokio::test]
async fn run_discovers_plans_and_executes() {
    init_tracing();
    let runner = FakeRunner::new();
    let probe = MockProbe::new();
    probe.set_distance("terms", "register", 30.0);

    let outcome = with_timeout(depsched::run(
        &StaticTaskSource::new(signup_page()),
        Arc::new(probe),
        Arc::new(runner.clone()),
        SchedulerConfig::default(),
    ))
    .await
    .expect("run succeeds");

    assert_eq!(outcome.results.len(), 6);
    assert_eq!(outcome.report.success_count, 6);

    let started = runner.started();
    let at = |key: &str| started.iter().position(|k| k == key).unwrap();
    assert!(at("email") < at("register"));
    assert!(at("terms") < at("register"));
    assert_eq!(at("close-account"), 5, "risky task runs last");
}

#[tokio::test]
async fn discovery_failure_is_the_only_fatal_error() {
    let result = depsched::run(
        &BrokenSource,
        Arc::new(NullProbe),
        Arc::new(FakeRunner::new()),
        SchedulerConfig::default(),
    )
    .await;

    match result {
        Err(SchedulerError::Discovery(msg)) => assert!(msg.contains("page did not load")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected discovery failure"),
    }
}

#[tokio::test]
async fn dry_run_plan_renders_groups() {
    let plan = depsched::plan(
        &StaticTaskSource::new(signup_page()),
        Arc::new(NullProbe),
        &SchedulerConfig::default(),
    )
    .await
    .expect("plan");

    assert_eq!(plan.graph.len(), 6);
    assert!(plan.repaired.is_empty());
    assert_eq!(plan.order.last().map(String::as_str), Some("close-account"));

    let text = plan.to_string();
    assert!(text.starts_with("schedule plan: 6 tasks"));
    assert!(text.contains("group 0 [parallel]:"));
    assert!(text.contains("after email (group_membership, w=10)"));

    let first = plan.group_of("email").unwrap();
    assert!(plan.group_of("register").unwrap() > first);
}

#[tokio::test]
async fn report_renders_summary() {
    let outcome = depsched::run(
        &StaticTaskSource::new(vec![task("a"), task("b")]),
        Arc::new(NullProbe),
        Arc::new(FakeRunner::new().fail("b", "nope")),
        SchedulerConfig::default(),
    )
    .await
    .unwrap();

    let text = outcome.report.to_string();
    assert!(text.contains("groups executed:    1"));
    assert!(text.contains("2 total, 1 passed, 1 failed"));
}
