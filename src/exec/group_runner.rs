// src/exec/group_runner.rs

//! Drives one execution group, either through a bounded worker pool or one
//! task at a time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dag::{ExecutionGroup, Task, TaskKey};
use crate::engine::{ExecMode, TaskResult};
use crate::exec::backend::TaskRunner;
use crate::exec::task_runner::run_one;
use crate::guard::ConflictGuard;

/// Everything a group needs besides the group itself.
#[derive(Clone)]
pub struct GroupContext {
    pub runner: Arc<dyn TaskRunner>,
    pub guard: Arc<ConflictGuard>,
    pub max_workers: usize,
    pub task_timeout: Duration,
    pub group_timeout: Duration,
    pub grace_period: Duration,
    pub lock_timeout: Duration,
}

/// Results of one parallel dispatch, before any deferred task has run.
#[derive(Debug, Default)]
pub struct ParallelRun {
    pub results: Vec<TaskResult>,
    /// Tasks whose lock could not be taken; still to be run serially.
    pub deferred: Vec<Task>,
    pub group_timed_out: bool,
}

enum WorkerOutcome {
    Done(TaskResult),
    Deferred(Task),
}

async fn worker(
    ctx: GroupContext,
    pool: Arc<Semaphore>,
    task: Task,
    token: CancellationToken,
) -> WorkerOutcome {
    let permit = tokio::select! {
        permit = pool.acquire_owned() => permit,
        _ = token.cancelled() => {
            return WorkerOutcome::Done(TaskResult::timed_out(
                task,
                ExecMode::Parallel,
                "group timed out before the task was started".to_string(),
                Duration::ZERO,
            ));
        }
    };
    let Ok(_permit) = permit else {
        return WorkerOutcome::Deferred(task);
    };

    let Some(lease) = ctx.guard.acquire_lease(&task.key, ctx.lock_timeout).await else {
        debug!(task = %task.key, "lock unavailable; deferring to serial fallback");
        return WorkerOutcome::Deferred(task);
    };

    let result = run_one(
        Arc::clone(&ctx.runner),
        task,
        ExecMode::Parallel,
        ctx.task_timeout,
        token,
    )
    .await;

    // After a per-task timeout the detached runner may still be working on
    // this key. Keys are unique within a run, but a guard shared through
    // `ParallelExecutor::with_guard` can hand the key to another run while
    // that runner is still active.
    drop(lease);
    WorkerOutcome::Done(result)
}

// Roughly 30 years; stands in for "never" when a configured wait does not
// fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(wait: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(wait).unwrap_or(now + FAR_FUTURE)
}

/// Dispatch every member of `group` to a pool of
/// `min(group size, max_workers)` workers.
///
/// Waits up to `group_timeout` for the whole group. On expiry `group_token`
/// is cancelled, stragglers get `grace_period` to report, and whatever is
/// still missing is recorded as a timed-out failure.
pub async fn run_parallel(
    ctx: &GroupContext,
    group: &ExecutionGroup,
    group_token: &CancellationToken,
) -> ParallelRun {
    let workers = group.len().min(ctx.max_workers).max(1);
    let pool = Arc::new(Semaphore::new(workers));
    info!(group = group.id, tasks = group.len(), workers, "dispatching parallel group");

    let mut futs: FuturesUnordered<_> = FuturesUnordered::new();
    for task in &group.tasks {
        futs.push(worker(
            ctx.clone(),
            Arc::clone(&pool),
            task.clone(),
            group_token.child_token(),
        ));
    }

    let mut run = ParallelRun::default();
    let mut outstanding: HashSet<TaskKey> = group.keys().map(|k| k.to_string()).collect();
    let deadline = deadline_after(ctx.group_timeout);

    let mut collect = |outcome: WorkerOutcome, run: &mut ParallelRun| match outcome {
        WorkerOutcome::Done(result) => {
            outstanding.remove(&result.task.key);
            run.results.push(result);
        }
        WorkerOutcome::Deferred(task) => {
            outstanding.remove(&task.key);
            run.deferred.push(task);
        }
    };

    loop {
        match tokio::time::timeout_at(deadline, futs.next()).await {
            Ok(Some(outcome)) => collect(outcome, &mut run),
            Ok(None) => break,
            Err(_) => {
                run.group_timed_out = true;
                break;
            }
        }
    }

    if run.group_timed_out {
        warn!(
            group = group.id,
            timeout_ms = ctx.group_timeout.as_millis() as u64,
            "group timed out; cancelling outstanding tasks"
        );
        group_token.cancel();

        let grace_deadline = deadline_after(ctx.grace_period);
        while let Ok(Some(outcome)) = tokio::time::timeout_at(grace_deadline, futs.next()).await {
            collect(outcome, &mut run);
        }
    }
    drop(collect);
    drop(futs);

    for task in group.tasks.iter().filter(|t| outstanding.contains(&t.key)) {
        warn!(task = %task.key, "no result after group timeout and grace period");
        run.results.push(TaskResult::timed_out(
            task.clone(),
            ExecMode::Parallel,
            format!(
                "no result within group timeout of {}ms",
                ctx.group_timeout.as_millis()
            ),
            ctx.group_timeout.saturating_add(ctx.grace_period),
        ));
    }

    run
}

/// Run tasks one at a time on the calling task, without taking locks.
pub async fn run_serial(
    ctx: &GroupContext,
    tasks: &[Task],
    mode: ExecMode,
    token: &CancellationToken,
) -> Vec<TaskResult> {
    let mut results = Vec::with_capacity(tasks.len());

    for task in tasks {
        let result = run_one(
            Arc::clone(&ctx.runner),
            task.clone(),
            mode,
            ctx.task_timeout,
            token.child_token(),
        )
        .await;
        results.push(result);
    }

    results
}
