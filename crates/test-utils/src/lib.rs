// crates/test-utils/src/lib.rs

//! Shared helpers for the `depsched` integration tests.
//!
//! - [`builders`]: tasks, hand-made graphs, fixed-edge rule sets and a
//!   validated-config builder.
//! - [`fake_runner`]: a scriptable [`depsched::TaskRunner`] that records
//!   what the executor asked it to do.

pub mod builders;
pub mod fake_runner;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

pub use fake_runner::FakeRunner;

/// Upper bound for one scheduling run in a test. Well above the group and
/// task timeouts `ConfigBuilder` uses, so it only fires on a hung executor.
pub const TEST_DEADLINE: Duration = Duration::from_secs(10);

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Filters come from `RUST_LOG`, defaulting to `info`; output shows only for
/// failing tests unless run with `--nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it outlives [`TEST_DEADLINE`].
///
/// Wrap `ParallelExecutor::execute` and `depsched::run` with this so a lost
/// cancellation or a stuck lock shows up as a failure instead of a hang.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_DEADLINE, f)
        .await
        .expect("scheduling run exceeded the test deadline")
}
