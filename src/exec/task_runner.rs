// src/exec/task_runner.rs

//! Single task dispatch with a timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dag::Task;
use crate::engine::{ExecMode, TaskResult};
use crate::exec::backend::TaskRunner;

/// Run `task` on its own Tokio task and wait at most `timeout` for it.
///
/// Every outcome becomes a [`TaskResult`]: runner errors and panics are
/// failures, and a timeout cancels `cancel` and records a timed-out failure.
/// A runner that errors out after `cancel` fired (for instance because its
/// group timed out) is recorded as timed out too. The spawned runner is
/// detached, not aborted, on timeout.
pub async fn run_one(
    runner: Arc<dyn TaskRunner>,
    task: Task,
    mode: ExecMode,
    timeout: Duration,
    cancel: CancellationToken,
) -> TaskResult {
    let started = Instant::now();
    info!(task = %task.key, mode = %mode, "starting task");

    let handle = {
        let runner = Arc::clone(&runner);
        let task = task.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { runner.run(&task, cancel).await })
    };

    let result = match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(Ok(output))) => TaskResult::from_output(task, mode, output, started.elapsed()),
        Ok(Ok(Err(err))) if cancel.is_cancelled() => {
            warn!(task = %task.key, error = %err, "task gave up after cancellation");
            TaskResult::timed_out(
                task,
                mode,
                format!("task cancelled: {err:#}"),
                started.elapsed(),
            )
        }
        Ok(Ok(Err(err))) => {
            warn!(task = %task.key, error = %err, "task runner returned an error");
            TaskResult::failed(task, mode, format!("{err:#}"), started.elapsed())
        }
        Ok(Err(join_err)) => {
            let message = if join_err.is_panic() {
                "task runner panicked".to_string()
            } else {
                format!("task runner was aborted: {join_err}")
            };
            warn!(task = %task.key, error = %message, "task runner did not complete");
            TaskResult::failed(task, mode, message, started.elapsed())
        }
        Err(_elapsed) => {
            cancel.cancel();
            warn!(
                task = %task.key,
                timeout_ms = timeout.as_millis() as u64,
                "task timed out; cancellation requested"
            );
            TaskResult::timed_out(
                task,
                mode,
                format!("task timed out after {}ms", timeout.as_millis()),
                started.elapsed(),
            )
        }
    };

    debug!(
        task = %result.task.key,
        success = result.success,
        elapsed_ms = result.elapsed_ms,
        "task finished"
    );
    result
}
