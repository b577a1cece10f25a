// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::report::RunReport;
use super::{CoreCommand, RuntimeEvent, TaskName};

/// Drives the scheduler in response to `RuntimeEvent`s and delegates actual
/// task execution to an `ExecutorBackend`.
///
/// This is an IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. It can run several phases one after the other; the
/// core keeps task history between them.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    shutdown_requested: bool,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("shutdown_requested", &self.shutdown_requested)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            shutdown_requested: false,
        }
    }

    pub fn core(&self) -> &CoreRuntime {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut CoreRuntime {
        &mut self.core
    }

    /// Whether a shutdown request has been observed; no further phase
    /// should be started once this is true.
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Run `selection` (empty: every known task) to completion.
    ///
    /// - Feeds completions from `event_rx` into the core runtime.
    /// - Executes commands returned by the core.
    /// - Returns once every task of the run is terminal, or on shutdown.
    pub async fn run_phase(&mut self, selection: &[TaskName]) -> Result<RunReport> {
        if self.shutdown_requested {
            return Ok(RunReport::default());
        }

        let step = self.core.start_run(selection)?;
        let mut keep_running = step.keep_running;
        for command in step.commands {
            self.execute_command(command).await?;
        }

        while keep_running {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; stopping");
                    break;
                }
            };

            debug!(?event, "runtime received event");
            if matches!(event, RuntimeEvent::ShutdownRequested) {
                info!("shutdown requested; abandoning unfinished tasks");
                self.shutdown_requested = true;
            }

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command).await?;
            }
            keep_running = step.keep_running;
        }

        Ok(self.core.take_report())
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => {
                self.spawn_ready(tasks).await?;
            }
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name()).collect();
        debug!(?names, "dispatching ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
