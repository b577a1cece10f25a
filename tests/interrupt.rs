mod common;

use std::sync::{Arc, Mutex};

use common::*;
use fastpipe::exec::command::RunFuture;
use fastpipe::exec::CommandRunner;
use fastpipe::tasks::{CommandSpec, Task};
use fastpipe_test_utils::builders::{ConfigFileBuilder, ProjectFixture};
use fastpipe_test_utils::{init_tracing, project};
use tokio::sync::oneshot;

/// Requests shutdown on its first call and then never finishes.
struct StallingRunner {
    trigger: Mutex<Option<oneshot::Sender<()>>>,
    calls: Mutex<Vec<String>>,
}

impl CommandRunner for StallingRunner {
    fn run<'a>(&'a self, task: &'a Task, _spec: &'a CommandSpec) -> RunFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(task.name.clone());
            if let Some(tx) = self.trigger.lock().unwrap().take() {
                let _ = tx.send(());
            }
            std::future::pending::<()>().await;
            Ok(0)
        })
    }
}

#[tokio::test]
async fn shutdown_abandons_the_run_and_skips_later_phases() -> TestResult {
    init_tracing();

    let fixture = ProjectFixture::standard();
    let cfg = ConfigFileBuilder::new().build();

    let (tx, rx) = oneshot::channel();
    let runner = Arc::new(StallingRunner {
        trigger: Mutex::new(Some(tx)),
        calls: Mutex::new(Vec::new()),
    });

    let project = project(&fixture, cfg);
    let report = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        project.run_until(runner.clone(), &[], async move {
            let _ = rx.await;
        }),
    )
    .await
    .expect("run did not stop after shutdown")?;

    assert!(report.was_interrupted(), "{report:?}");
    assert!(!report.is_success());

    let calls = runner.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1, "only one command may start with one job");
    assert!(report.interrupted.contains(&calls[0]));

    // The simulation phase never started.
    assert!(report
        .interrupted
        .iter()
        .chain(report.executed.iter())
        .all(|n| !n.starts_with("openfast:") && !n.starts_with("turbsim:")));
    assert!(!fixture.exists("runs/steady_wind/ws8.0/main.out"));
    Ok(())
}
