// src/guard/conflict.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::GuardConfig;
use crate::dag::TaskKey;

/// Tunables for [`ConflictGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardSettings {
    /// Sleep between non-blocking grab attempts.
    pub poll_interval: Duration,
    /// Fallback flips once the conflict count goes above this.
    pub conflict_threshold: usize,
    /// Minimum spacing between sweeps; zero disables them.
    pub cleanup_interval: Duration,
}

impl From<&GuardConfig> for GuardSettings {
    fn from(cfg: &GuardConfig) -> Self {
        Self {
            poll_interval: cfg.poll_interval,
            conflict_threshold: cfg.conflict_threshold,
            cleanup_interval: cfg.cleanup_interval,
        }
    }
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self::from(&GuardConfig::default())
    }
}

/// Point-in-time view of the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuardStats {
    pub conflict_count: usize,
    pub active_locks: usize,
    pub tracked_keys: usize,
    pub fallback_triggered: bool,
}

#[derive(Debug, Clone, Copy)]
struct LockRecord {
    held: bool,
    last_touched: Instant,
}

#[derive(Debug)]
struct LockTable {
    records: HashMap<TaskKey, LockRecord>,
    last_sweep: Instant,
}

/// Table of per-key locks.
///
/// The meta-lock is only held for map lookups and flag flips, never across
/// an `.await` or while a task runs. Records are created lazily on the first
/// acquisition attempt for a key.
#[derive(Debug)]
pub struct ConflictGuard {
    table: Mutex<LockTable>,
    conflicts: AtomicUsize,
    fallback: AtomicBool,
    settings: GuardSettings,
}

impl ConflictGuard {
    pub fn new(settings: GuardSettings) -> Self {
        Self {
            table: Mutex::new(LockTable {
                records: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            conflicts: AtomicUsize::new(0),
            fallback: AtomicBool::new(false),
            settings,
        }
    }

    pub fn settings(&self) -> &GuardSettings {
        &self.settings
    }

    // Records are plain values, so a panic while the table was locked cannot
    // leave it half-updated.
    fn table(&self) -> MutexGuard<'_, LockTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Grab the lock for `key` without waiting.
    pub fn try_acquire(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut table = self.table();
        let record = table
            .records
            .entry(key.to_string())
            .or_insert(LockRecord {
                held: false,
                last_touched: now,
            });

        if record.held {
            return false;
        }
        record.held = true;
        record.last_touched = now;
        true
    }

    /// Poll for the lock on `key` until it is obtained or `timeout` elapses.
    ///
    /// A timeout counts as one conflict and may flip the fallback flag.
    pub async fn acquire(&self, key: &str, timeout: Duration) -> bool {
        // `None` when the timeout does not fit in an `Instant`: wait forever.
        let deadline = Instant::now().checked_add(timeout);

        loop {
            if self.try_acquire(key) {
                debug!(task = %key, "lock acquired");
                return true;
            }

            let now = Instant::now();
            let wait = match deadline {
                Some(deadline) if now >= deadline => {
                    self.record_conflict(key, timeout);
                    return false;
                }
                Some(deadline) => self.settings.poll_interval.min(deadline - now),
                None => self.settings.poll_interval,
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// Like [`acquire`](Self::acquire), but returns a lease that releases the
    /// lock when dropped.
    pub async fn acquire_lease(self: &Arc<Self>, key: &str, timeout: Duration) -> Option<KeyLease> {
        if self.acquire(key, timeout).await {
            Some(KeyLease {
                guard: Arc::clone(self),
                key: key.to_string(),
            })
        } else {
            None
        }
    }

    /// Unlock `key`. Releasing a key that is not held does nothing.
    pub fn release(&self, key: &str) {
        let now = Instant::now();
        let mut table = self.table();

        match table.records.get_mut(key) {
            Some(record) if record.held => {
                record.held = false;
                record.last_touched = now;
                debug!(task = %key, "lock released");
            }
            _ => debug!(task = %key, "release of a lock that is not held; ignoring"),
        }
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.table().records.get(key).is_some_and(|r| r.held)
    }

    fn record_conflict(&self, key: &str, timeout: Duration) {
        let count = self.conflicts.fetch_add(1, Ordering::SeqCst) + 1;
        warn!(
            task = %key,
            timeout_ms = timeout.as_millis() as u64,
            conflicts = count,
            "lock acquisition timed out"
        );

        if count > self.settings.conflict_threshold && !self.fallback.swap(true, Ordering::SeqCst) {
            warn!(
                conflicts = count,
                threshold = self.settings.conflict_threshold,
                "too many lock conflicts; fallback to serial execution triggered"
            );
        }
    }

    pub fn conflict_count(&self) -> usize {
        self.conflicts.load(Ordering::SeqCst)
    }

    pub fn fallback_triggered(&self) -> bool {
        self.fallback.load(Ordering::SeqCst)
    }

    /// Clear the conflict counter and the fallback flag so the next run
    /// starts from a clean slate. Lock records, held or not, are untouched.
    ///
    /// [`ParallelExecutor::execute`](crate::engine::ParallelExecutor::execute)
    /// calls this on entry; a guard shared between executors is therefore
    /// reset by whichever run starts last.
    pub fn reset_run_state(&self) {
        let conflicts = self.conflicts.swap(0, Ordering::SeqCst);
        let was_triggered = self.fallback.swap(false, Ordering::SeqCst);
        if conflicts > 0 || was_triggered {
            debug!(conflicts, was_triggered, "conflict statistics reset");
        }
    }

    /// Reclaim idle records, at most once per `cleanup_interval`.
    ///
    /// Returns how many records were removed; 0 when the interval has not
    /// elapsed yet or sweeping is disabled.
    pub fn sweep_idle(&self, max_age: Duration) -> usize {
        if self.settings.cleanup_interval.is_zero() {
            return 0;
        }

        let now = Instant::now();
        let mut table = self.table();
        if now.duration_since(table.last_sweep) < self.settings.cleanup_interval {
            return 0;
        }

        sweep(&mut table, now, max_age)
    }

    /// Reclaim idle records right away, ignoring the sweep interval.
    pub fn sweep_idle_now(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut table = self.table();
        sweep(&mut table, now, max_age)
    }

    pub fn stats(&self) -> GuardStats {
        let table = self.table();
        GuardStats {
            conflict_count: self.conflict_count(),
            active_locks: table.records.values().filter(|r| r.held).count(),
            tracked_keys: table.records.len(),
            fallback_triggered: self.fallback_triggered(),
        }
    }
}

impl Default for ConflictGuard {
    fn default() -> Self {
        Self::new(GuardSettings::default())
    }
}

// Held records are never removed, whatever their age.
fn sweep(table: &mut LockTable, now: Instant, max_age: Duration) -> usize {
    table.last_sweep = now;
    let before = table.records.len();
    table
        .records
        .retain(|_, r| r.held || now.duration_since(r.last_touched) <= max_age);
    let removed = before - table.records.len();

    if removed > 0 {
        debug!(removed, remaining = table.records.len(), "swept idle lock records");
    }
    removed
}

/// Ownership of one key's lock; released on drop.
#[derive(Debug)]
pub struct KeyLease {
    guard: Arc<ConflictGuard>,
    key: TaskKey,
}

impl KeyLease {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyLease {
    fn drop(&mut self) {
        self.guard.release(&self.key);
    }
}
