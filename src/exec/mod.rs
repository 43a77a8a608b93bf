// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`backend`] defines the [`TaskRunner`] capability and [`TaskOutput`].
//! - [`task_runner`] dispatches one task with a timeout and turns every
//!   outcome into a result.
//! - [`group_runner`] runs whole groups, in parallel or serially.

pub mod backend;
pub mod group_runner;
pub mod task_runner;

pub use backend::{TaskOutput, TaskRunner};
pub use group_runner::{GroupContext, ParallelRun, run_parallel, run_serial};
pub use task_runner::run_one;
