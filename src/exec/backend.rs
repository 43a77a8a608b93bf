// src/exec/backend.rs

//! Task execution capability.
//!
//! The executor never knows what a task does; it hands each task to a
//! [`TaskRunner`] and waits (bounded) for a [`TaskOutput`]. Production code
//! plugs in a browser-backed runner; tests use a fake that records calls.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::dag::Task;

/// What a runner reports for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOutput {
    pub success: bool,
    pub error: Option<String>,
    /// Free-form side-channel data (screenshots, timings, API records...).
    pub details: BTreeMap<String, String>,
}

impl TaskOutput {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Runs one task.
///
/// Called at most once per task per scheduling run. `cancel` fires when the
/// scheduler stops waiting for this task; honouring it is up to the runner.
/// A runner that ignores it keeps running on its own Tokio task and its
/// eventual result is discarded.
///
/// Returning `Err` is reported as a failed result, same as
/// `Ok(TaskOutput { success: false, .. })`.
pub trait TaskRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        task: &'a Task,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<TaskOutput>> + Send + 'a>>;
}
