use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use depsched::dag::Task;
use depsched::exec::{TaskOutput, TaskRunner};
use tokio_util::sync::CancellationToken;

/// What the fake does for one task once its delay is over.
#[derive(Debug, Clone, Default)]
enum Outcome {
    #[default]
    Succeed,
    Fail(String),
    Error(String),
    Panic,
}

#[derive(Debug, Clone, Default)]
struct Script {
    delay: Option<Duration>,
    outcome: Outcome,
    ignore_cancel: bool,
}

#[derive(Debug, Default)]
struct Inner {
    scripts: Mutex<HashMap<String, Script>>,
    default_delay: Mutex<Duration>,
    started: Mutex<Vec<String>>,
    finished: Mutex<Vec<String>>,
    cancelled: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// A fake task runner that:
/// - records the order in which tasks start and finish
/// - tracks the peak number of tasks running at once
/// - sleeps for a configurable delay, honouring cancellation unless told not to
/// - succeeds unless scripted to fail, error or panic.
#[derive(Debug, Clone, Default)]
pub struct FakeRunner {
    inner: Arc<Inner>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay applied to every task without its own delay.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.inner.default_delay.lock().unwrap() = delay;
        self
    }

    fn script(&self, key: &str, f: impl FnOnce(&mut Script)) {
        let mut scripts = self.inner.scripts.lock().unwrap();
        f(scripts.entry(key.to_string()).or_default());
    }

    pub fn delay_for(self, key: &str, delay: Duration) -> Self {
        self.script(key, |s| s.delay = Some(delay));
        self
    }

    /// Report `Ok(TaskOutput { success: false, .. })`.
    pub fn fail(self, key: &str, message: &str) -> Self {
        self.script(key, |s| s.outcome = Outcome::Fail(message.to_string()));
        self
    }

    /// Return `Err(..)` from the runner.
    pub fn error(self, key: &str, message: &str) -> Self {
        self.script(key, |s| s.outcome = Outcome::Error(message.to_string()));
        self
    }

    pub fn panic_on(self, key: &str) -> Self {
        self.script(key, |s| s.outcome = Outcome::Panic);
        self
    }

    /// Keep sleeping even after the cancellation token fires.
    pub fn ignore_cancel(self, key: &str) -> Self {
        self.script(key, |s| s.ignore_cancel = true);
        self
    }

    pub fn started(&self) -> Vec<String> {
        self.inner.started.lock().unwrap().clone()
    }

    pub fn finished(&self) -> Vec<String> {
        self.inner.finished.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.inner.cancelled.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn runs_of(&self, key: &str) -> usize {
        self.started().iter().filter(|k| k.as_str() == key).count()
    }
}

impl TaskRunner for FakeRunner {
    fn run<'a>(
        &'a self,
        task: &'a Task,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<TaskOutput>> + Send + 'a>> {
        Box::pin(async move {
            let script = self
                .inner
                .scripts
                .lock()
                .unwrap()
                .get(&task.key)
                .cloned()
                .unwrap_or_default();
            let delay = script
                .delay
                .unwrap_or_else(|| *self.inner.default_delay.lock().unwrap());

            self.inner.started.lock().unwrap().push(task.key.clone());
            let now = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.inner.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let was_cancelled = if script.ignore_cancel {
                tokio::time::sleep(delay).await;
                false
            } else {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => false,
                    _ = cancel.cancelled() => true,
                }
            };

            self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);

            if was_cancelled {
                self.inner.cancelled.lock().unwrap().push(task.key.clone());
                return Err(anyhow!("cancelled"));
            }

            self.inner.finished.lock().unwrap().push(task.key.clone());

            match script.outcome {
                Outcome::Succeed => Ok(TaskOutput::ok().with_detail("runner", "fake")),
                Outcome::Fail(message) => Ok(TaskOutput::failed(message)),
                Outcome::Error(message) => Err(anyhow!(message)),
                Outcome::Panic => panic!("scripted panic for task {}", task.key),
            }
        })
    }
}
