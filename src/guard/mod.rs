// src/guard/mod.rs

//! Per-task mutual exclusion for the parallel executor.
//!
//! [`ConflictGuard`] keeps one lock record per task key behind a single
//! short-held mutex. Acquisition polls with a bounded wait; timeouts are
//! counted, and past a threshold a global fallback flag is raised for the
//! executor to act on.

pub mod conflict;

pub use conflict::{ConflictGuard, GuardSettings, GuardStats, KeyLease};
