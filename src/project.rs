// src/project.rs

//! A simulation project on disk and the wiring that runs it.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::check::UpToDateChecker;
use crate::config::ConfigFile;
use crate::dag::Scheduler;
use crate::engine::{CoreRuntime, Plan, Planner, RunReport, Runtime, RuntimeEvent};
use crate::errors::Result;
use crate::exec::{CommandRunner, ExecContext, RealExecutorBackend};
use crate::fs::{normalize_path, FileSystem};
use crate::tasks::{default_generators, GenContext, TaskName};

/// Filesystem, project root and validated configuration.
#[derive(Debug, Clone)]
pub struct Project {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    cfg: ConfigFile,
}

impl Project {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl AsRef<Path>, cfg: ConfigFile) -> Self {
        Self {
            fs,
            root: normalize_path(root.as_ref()),
            cfg,
        }
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ConfigFile {
        &self.cfg
    }

    pub fn gen_context(&self) -> GenContext<'_> {
        GenContext::new(self.fs.as_ref(), &self.root, &self.cfg)
    }

    pub fn planner(&self) -> Planner<'_> {
        Planner::new(self.gen_context(), default_generators())
    }

    /// Generate every task from the tree as it is now.
    pub fn plan(&self) -> Result<Plan> {
        self.planner().plan()
    }

    pub fn checker(&self) -> UpToDateChecker {
        let config = self.cfg.config();
        UpToDateChecker::with_storage(
            Arc::clone(&self.fs),
            config.check,
            config.hash_storage,
            &self.root,
        )
    }

    /// Run `selection` (empty: everything) with `runner` executing external
    /// programs.
    pub async fn run(
        &self,
        runner: Arc<dyn CommandRunner>,
        selection: &[TaskName],
    ) -> Result<RunReport> {
        self.run_until(runner, selection, std::future::pending::<()>())
            .await
    }

    /// Like [`Project::run`], but stops scheduling new work once `shutdown`
    /// completes. Tasks that had not finished are reported as interrupted.
    pub async fn run_until<F>(
        &self,
        runner: Arc<dyn CommandRunner>,
        selection: &[TaskName],
        shutdown: F,
    ) -> Result<RunReport>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let checker = Arc::new(self.checker());
        let ctx = ExecContext {
            fs: Arc::clone(&self.fs),
            checker: Arc::clone(&checker),
            runner,
            jobs: self.cfg.config().jobs,
        };

        // Runtime event channel.
        let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

        let executor = RealExecutorBackend::new(rt_tx.clone(), ctx);

        let shutdown_listener = {
            let tx = rt_tx.clone();
            tokio::spawn(async move {
                shutdown.await;
                let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
            })
        };

        let core = CoreRuntime::new(Scheduler::new());
        let mut runtime = Runtime::new(core, rt_rx, executor);

        let result = self.planner().run(&mut runtime, selection).await;
        shutdown_listener.abort();
        let report = result?;

        if selection.is_empty() && !runtime.shutdown_requested() {
            let names: Vec<&str> = runtime
                .core()
                .scheduler()
                .tasks()
                .map(|t| t.name.as_str())
                .collect();
            if let Err(err) = checker.prune(&names) {
                warn!(error = %err, "could not prune stored task hashes");
            }
        }

        debug!(%report, "pipeline finished");
        Ok(report.sorted())
    }
}
