// src/engine/mod.rs

//! Orchestration engine.
//!
//! [`ParallelExecutor`] ties together the graph builder, the sorter, the
//! partitioner and the exec layer, and folds every group's results into a
//! single [`ScheduleReport`]. [`SchedulePlan`] is the dry-run view of the
//! same pipeline.

pub mod executor;
pub mod plan;
pub mod report;

pub use executor::{ExecutionOutcome, ParallelExecutor};
pub use plan::SchedulePlan;
pub use report::{ExecMode, ScheduleReport, TaskResult};
