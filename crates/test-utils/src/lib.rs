pub mod builders;
pub mod fake_executor;

use std::sync::{Arc, Once};

use fastpipe::config::ConfigFile;
use fastpipe::engine::RunReport;
use fastpipe::errors::Result;
use fastpipe::Project;
use tracing_subscriber::{fmt, EnvFilter};

use crate::builders::ProjectFixture;
use crate::fake_executor::FakeCommandRunner;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// A project rooted at `.` of the fixture's in-memory tree.
pub fn project(fixture: &ProjectFixture, cfg: ConfigFile) -> Project {
    Project::new(fixture.fs(), ".", cfg)
}

/// Run `selection` against the fixture with `runner` standing in for the
/// external tools.
pub async fn run_pipeline(
    fixture: &ProjectFixture,
    cfg: &ConfigFile,
    runner: &FakeCommandRunner,
    selection: &[&str],
) -> Result<RunReport> {
    let selection: Vec<String> = selection.iter().map(|s| s.to_string()).collect();
    let runner: Arc<FakeCommandRunner> = Arc::new(runner.clone());
    with_timeout(project(fixture, cfg.clone()).run(runner, &selection)).await
}
