// src/dag/task.rs

//! Tasks as the scheduler sees them, plus the discovery seam.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use serde::Serialize;

/// Stable identity of a task (a selector in the browser domain).
pub type TaskKey = String;

/// Kind of interactive element a task drives.
///
/// Only the classification rules look at this; the scheduler itself treats
/// tasks as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Button,
    Link,
    Input,
    Select,
    Checkbox,
    Radio,
    Textarea,
    Other,
}

impl TaskKind {
    /// Fillable form field kinds.
    pub fn is_field(self) -> bool {
        matches!(
            self,
            TaskKind::Input
                | TaskKind::Select
                | TaskKind::Checkbox
                | TaskKind::Radio
                | TaskKind::Textarea
        )
    }
}

/// A unit of work discovered for one scheduling run.
///
/// Immutable once scheduling begins; the executor only ever clones it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub key: TaskKey,
    pub kind: TaskKind,
    /// Display text used by the keyword rules.
    pub text: String,
    /// Logical group membership (the owning form, in the browser domain).
    pub group: Option<String>,
}

impl Task {
    pub fn new(key: impl Into<TaskKey>, kind: TaskKind, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            text: text.into(),
            group: None,
        }
    }

    /// Builder-style setter for the group tag.
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether both tasks carry the same, non-empty group tag.
    pub fn shares_group_with(&self, other: &Task) -> bool {
        match (&self.group, &other.group) {
            (Some(a), Some(b)) => !a.is_empty() && a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} '{}' ({})", self.kind, self.text, self.key)
    }
}

/// Discovery capability: produces the task list for one scheduling run.
///
/// Called exactly once per run, before graph construction. A failure here is
/// the only error that aborts a run.
pub trait TaskSource: Send + Sync {
    fn discover(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Task>>> + Send + '_>>;
}

/// Fixed task list, for callers that already hold the tasks.
#[derive(Debug, Clone, Default)]
pub struct StaticTaskSource {
    tasks: Vec<Task>,
}

impl StaticTaskSource {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }
}

impl TaskSource for StaticTaskSource {
    fn discover(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Task>>> + Send + '_>> {
        let tasks = self.tasks.clone();
        Box::pin(async move { Ok(tasks) })
    }
}
