use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use fastpipe::dag::ScheduledTask;
use fastpipe::engine::{RuntimeEvent, TaskOutcome};
use fastpipe::errors::Result;
use fastpipe::exec::command::RunFuture;
use fastpipe::exec::{CommandRunner, ExecutorBackend};
use fastpipe::fs::FileSystem;
use fastpipe::tasks::{CommandSpec, Task};

/// A fake executor that:
/// - records which tasks were "run"
/// - immediately reports `TaskCompleted` for each scheduled task, failing
///   the ones it was told to fail.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    failing: HashMap<String, i32>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashMap::new(),
        }
    }

    pub fn failing(mut self, task: &str, code: i32) -> Self {
        self.failing.insert(task.to_string(), code);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for t in tasks {
                let name = t.name().to_string();
                executed.lock().unwrap().push(name.clone());

                let outcome = match failing.get(&name) {
                    Some(code) => TaskOutcome::Failed(*code),
                    None => TaskOutcome::Success,
                };
                tx.send(RuntimeEvent::TaskCompleted {
                    task: name,
                    outcome,
                })
                .await
                .map_err(|e| anyhow::anyhow!("runtime gone: {e}"))?;
            }
            Ok(())
        })
    }
}

/// One call to [`FakeCommandRunner`].
#[derive(Debug, Clone)]
pub struct Invocation {
    pub task: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// File dependencies of the task that did not exist at call time.
    pub missing_deps: Vec<PathBuf>,
}

/// Stands in for the external simulation tools.
///
/// Every call is recorded. Unless the program is configured to fail, the
/// calling task's targets are written, as the real tool would.
#[derive(Clone)]
pub struct FakeCommandRunner {
    fs: Arc<dyn FileSystem>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
    failing_programs: Arc<Mutex<HashMap<String, i32>>>,
}

impl FakeCommandRunner {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            invocations: Arc::new(Mutex::new(Vec::new())),
            failing_programs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Make every call of `program` exit with `code` without writing anything.
    pub fn fail_program(&self, program: &str, code: i32) {
        self.failing_programs
            .lock()
            .unwrap()
            .insert(program.to_string(), code);
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Names of the tasks that ran a command, in call order.
    pub fn tasks_run(&self) -> Vec<String> {
        self.invocations().into_iter().map(|i| i.task).collect()
    }

    pub fn calls_of(&self, program: &str) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(|i| i.program == program)
            .collect()
    }

    pub fn clear(&self) {
        self.invocations.lock().unwrap().clear();
    }

    fn produce_targets(&self, task: &Task) -> anyhow::Result<()> {
        for target in &task.targets {
            let content = format!("written by {}\n", task.name);
            self.fs.write(target, content.as_bytes())?;
        }
        Ok(())
    }
}

impl CommandRunner for FakeCommandRunner {
    fn run<'a>(&'a self, task: &'a Task, spec: &'a CommandSpec) -> RunFuture<'a> {
        Box::pin(async move {
            let missing_deps = task
                .file_deps
                .iter()
                .filter(|p| !self.fs.exists(p))
                .cloned()
                .collect();

            self.invocations.lock().unwrap().push(Invocation {
                task: task.name.clone(),
                program: spec.program.clone(),
                args: spec.args.clone(),
                cwd: spec.cwd.clone(),
                missing_deps,
            });

            let failing = self.failing_programs.lock().unwrap().get(&spec.program).copied();
            if let Some(code) = failing {
                return Ok(code);
            }

            self.produce_targets(task)?;
            Ok(0)
        })
    }
}

/// Whether `arg` names an existing path, resolved against `cwd` if given.
pub fn arg_exists(fs: &dyn FileSystem, cwd: Option<&Path>, arg: &str) -> bool {
    match cwd {
        Some(dir) => fs.exists(&dir.join(arg)),
        None => fs.exists(Path::new(arg)),
    }
}
