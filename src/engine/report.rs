// src/engine/report.rs

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::dag::Task;
use crate::exec::TaskOutput;

/// How a task ended up being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecMode {
    /// Dispatched to the worker pool of a parallel group.
    Parallel,
    /// Member of a serial group.
    Serial,
    /// Planned as parallel, but its lock was busy; run serially afterwards.
    Fallback,
}

impl ExecMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ExecMode::Parallel => "parallel",
            ExecMode::Serial => "serial",
            ExecMode::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one task. Exactly one per task per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub task: Task,
    pub success: bool,
    pub error: Option<String>,
    pub details: BTreeMap<String, String>,
    pub mode: ExecMode,
    pub timed_out: bool,
    pub elapsed_ms: u64,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl TaskResult {
    pub fn from_output(task: Task, mode: ExecMode, output: TaskOutput, elapsed: Duration) -> Self {
        Self {
            task,
            success: output.success,
            error: output.error,
            details: output.details,
            mode,
            timed_out: false,
            elapsed_ms: millis(elapsed),
        }
    }

    pub fn failed(task: Task, mode: ExecMode, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            task,
            success: false,
            error: Some(error.into()),
            details: BTreeMap::new(),
            mode,
            timed_out: false,
            elapsed_ms: millis(elapsed),
        }
    }

    pub fn timed_out(task: Task, mode: ExecMode, error: String, elapsed: Duration) -> Self {
        Self {
            timed_out: true,
            ..Self::failed(task, mode, error, elapsed)
        }
    }

    pub fn key(&self) -> &str {
        &self.task.key
    }
}

/// Run statistics handed to a reporting layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleReport {
    pub groups_executed: usize,
    /// Tasks in groups that ran through the worker pool (fallbacks included).
    pub parallel_count: usize,
    /// Tasks in groups that ran serially.
    pub serial_count: usize,
    /// Tasks moved to serial execution because their lock was busy.
    pub fallback_count: usize,
    pub conflict_count: usize,
    pub fallback_triggered: bool,
    pub total_results: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub timed_out_count: usize,
    /// Edges dropped to break cycles.
    pub cycle_repairs: usize,
}

impl ScheduleReport {
    /// Fill in the result-derived counters from `results`.
    pub fn tally(&mut self, results: &[TaskResult]) {
        self.total_results = results.len();
        self.success_count = results.iter().filter(|r| r.success).count();
        self.failure_count = self.total_results - self.success_count;
        self.timed_out_count = results.iter().filter(|r| r.timed_out).count();
        self.fallback_count = results
            .iter()
            .filter(|r| r.mode == ExecMode::Fallback)
            .count();
    }
}

impl fmt::Display for ScheduleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "groups executed:    {}", self.groups_executed)?;
        writeln!(f, "parallel tasks:     {}", self.parallel_count)?;
        writeln!(f, "serial tasks:       {}", self.serial_count)?;
        writeln!(f, "fallback tasks:     {}", self.fallback_count)?;
        writeln!(f, "lock conflicts:     {}", self.conflict_count)?;
        writeln!(f, "fallback triggered: {}", self.fallback_triggered)?;
        writeln!(f, "cycle repairs:      {}", self.cycle_repairs)?;
        write!(
            f,
            "results:            {} total, {} passed, {} failed ({} timed out)",
            self.total_results, self.success_count, self.failure_count, self.timed_out_count
        )
    }
}
