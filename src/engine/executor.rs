// src/engine/executor.rs

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::dag::{GraphBuilder, Task};
use crate::engine::plan::SchedulePlan;
use crate::engine::report::{ExecMode, ScheduleReport, TaskResult};
use crate::errors::Result;
use crate::exec::{GroupContext, TaskRunner, run_parallel, run_serial};
use crate::guard::{ConflictGuard, GuardSettings};
use crate::probe::StructureProbe;
use crate::rules::RuleSet;
use crate::types::FallbackPolicy;

/// Plan plus everything that came out of running it.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub plan: SchedulePlan,
    pub results: Vec<TaskResult>,
    pub report: ScheduleReport,
}

/// Drives a task list through graph building, sorting, grouping and
/// execution.
///
/// Groups run strictly one after another. Inside a parallel group there is
/// no ordering; tasks hold their key's lock in the [`ConflictGuard`] while
/// they run.
pub struct ParallelExecutor {
    config: SchedulerConfig,
    builder: GraphBuilder,
    runner: Arc<dyn TaskRunner>,
    guard: Arc<ConflictGuard>,
    cancel: CancellationToken,
}

impl ParallelExecutor {
    pub fn new(
        config: SchedulerConfig,
        rules: RuleSet,
        probe: Arc<dyn StructureProbe>,
        runner: Arc<dyn TaskRunner>,
    ) -> Self {
        let guard = Arc::new(ConflictGuard::new(GuardSettings::from(&config.guard)));
        Self {
            builder: GraphBuilder::new(Arc::new(rules), probe),
            config,
            runner,
            guard,
            cancel: CancellationToken::new(),
        }
    }

    /// Standard rules built from `config.rules`.
    pub fn from_config(
        config: SchedulerConfig,
        probe: Arc<dyn StructureProbe>,
        runner: Arc<dyn TaskRunner>,
    ) -> Result<Self> {
        let rules = RuleSet::from_config(&config.rules)?;
        Ok(Self::new(config, rules, probe, runner))
    }

    /// Use an existing guard instead of a private one.
    pub fn with_guard(mut self, guard: Arc<ConflictGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn guard(&self) -> &Arc<ConflictGuard> {
        &self.guard
    }

    /// Cancelling this token cancels every task currently running.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn plan(&self, tasks: &[Task]) -> SchedulePlan {
        SchedulePlan::build(&self.builder, tasks)
    }

    fn group_context(&self) -> GroupContext {
        let exec = &self.config.executor;
        GroupContext {
            runner: Arc::clone(&self.runner),
            guard: Arc::clone(&self.guard),
            max_workers: exec.max_workers,
            task_timeout: exec.task_timeout,
            group_timeout: exec.group_timeout,
            grace_period: exec.grace_period,
            lock_timeout: self.config.guard.lock_timeout,
        }
    }

    /// Plan and run `tasks`. Never fails: every task ends up with exactly
    /// one result, successful or not.
    ///
    /// Conflict statistics and the fallback flag are per run: the guard's
    /// run state is reset before planning.
    pub async fn execute(&self, tasks: &[Task]) -> ExecutionOutcome {
        self.guard.reset_run_state();
        let plan = self.plan(tasks);
        let ctx = self.group_context();
        let exec = &self.config.executor;

        let mut results: Vec<TaskResult> = Vec::with_capacity(plan.graph.len());
        let mut report = ScheduleReport {
            cycle_repairs: plan.repaired.len(),
            ..ScheduleReport::default()
        };
        let mut fallback_logged = false;

        for group in &plan.groups {
            let demote = self.guard.fallback_triggered()
                && exec.fallback_policy == FallbackPolicy::Serial;
            let parallel = group.parallel_eligible && exec.enable_parallel && !demote;

            if group.parallel_eligible && !parallel {
                debug!(group = group.id, "parallel group demoted to serial execution");
            }

            let group_token = self.cancel.child_token();

            if parallel {
                let run = run_parallel(&ctx, group, &group_token).await;
                results.extend(run.results);

                if !run.deferred.is_empty() {
                    info!(
                        group = group.id,
                        tasks = run.deferred.len(),
                        "running lock-contended tasks serially"
                    );
                    let fallback =
                        run_serial(&ctx, &run.deferred, ExecMode::Fallback, &self.cancel).await;
                    results.extend(fallback);
                }
                report.parallel_count += group.len();
            } else {
                info!(group = group.id, tasks = group.len(), "running serial group");
                results.extend(run_serial(&ctx, &group.tasks, ExecMode::Serial, &group_token).await);
                report.serial_count += group.len();
            }

            report.groups_executed += 1;

            if self.guard.fallback_triggered() && !fallback_logged {
                fallback_logged = true;
                match exec.fallback_policy {
                    FallbackPolicy::Advisory => warn!(
                        group = group.id,
                        "fallback triggered; remaining groups keep their planned mode"
                    ),
                    FallbackPolicy::Serial => warn!(
                        group = group.id,
                        "fallback triggered; remaining groups will run serially"
                    ),
                }
            }

            self.guard.sweep_idle(self.config.guard.max_idle);
        }

        report.conflict_count = self.guard.conflict_count();
        report.fallback_triggered = self.guard.fallback_triggered();
        report.tally(&results);

        info!(
            groups = report.groups_executed,
            parallel = report.parallel_count,
            serial = report.serial_count,
            fallback = report.fallback_count,
            conflicts = report.conflict_count,
            fallback_triggered = report.fallback_triggered,
            total = report.total_results,
            passed = report.success_count,
            failed = report.failure_count,
            "schedule finished"
        );

        ExecutionOutcome {
            plan,
            results,
            report,
        }
    }
}
