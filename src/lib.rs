// src/lib.rs

//! Dependency-aware parallel scheduler.
//!
//! Tasks are classified pairwise into a weighted dependency graph, sorted
//! with cycle repair, cut into execution groups and run through a bounded
//! worker pool guarded by per-task locks.

pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod guard;
pub mod logging;
pub mod probe;
pub mod rules;
pub mod types;

use std::sync::Arc;

use tracing::info;

use crate::config::SchedulerConfig;
use crate::dag::{GraphBuilder, TaskSource};
use crate::errors::{Result, SchedulerError};
use crate::probe::StructureProbe;
use crate::rules::RuleSet;

pub use crate::dag::{DependencyEdge, DependencyGraph, EdgeKind, ExecutionGroup, Task, TaskKind};
pub use crate::engine::{
    ExecMode, ExecutionOutcome, ParallelExecutor, ScheduleReport, SchedulePlan, TaskResult,
};
pub use crate::exec::{TaskOutput, TaskRunner};
pub use crate::guard::ConflictGuard;

/// High-level entry point: discover tasks once, then plan and run them.
///
/// Only a discovery failure (or an invalid rule table) is returned as an
/// error; task failures are reported in the outcome.
pub async fn run(
    source: &dyn TaskSource,
    probe: Arc<dyn StructureProbe>,
    runner: Arc<dyn TaskRunner>,
    config: SchedulerConfig,
) -> Result<ExecutionOutcome> {
    let tasks = discover(source).await?;
    let executor = ParallelExecutor::from_config(config, probe, runner)?;
    Ok(executor.execute(&tasks).await)
}

/// Dry run: discover and plan, but execute nothing.
pub async fn plan(
    source: &dyn TaskSource,
    probe: Arc<dyn StructureProbe>,
    config: &SchedulerConfig,
) -> Result<SchedulePlan> {
    let tasks = discover(source).await?;
    let rules = RuleSet::from_config(&config.rules)?;
    let builder = GraphBuilder::new(Arc::new(rules), probe);
    Ok(SchedulePlan::build(&builder, &tasks))
}

async fn discover(source: &dyn TaskSource) -> Result<Vec<dag::Task>> {
    let tasks = source
        .discover()
        .await
        .map_err(|e| SchedulerError::Discovery(format!("{e:#}")))?;
    info!(tasks = tasks.len(), "discovered tasks");
    Ok(tasks)
}
