// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels and sending `ScheduledTask`s to the executor.
//!
//! The core can be unit tested without Tokio, channels, filesystem, or
//! processes.

use crate::dag::Scheduler;
use crate::engine::event_handlers::{
    handle_shutdown, handle_task_completion, start_run_from_selection, CoreStep,
};
use crate::engine::report::RunReport;
use crate::engine::{RuntimeEvent, TaskName};
use crate::errors::Result;

/// Pure core runtime state: the scheduler plus the report of the current
/// run. It has no channels, no Tokio types, and does not perform any IO.
#[derive(Debug, Default)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    report: RunReport,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            report: RunReport::default(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Mutable access between runs, e.g. to add the tasks of a later phase.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Expose whether the scheduler is idle (for tests).
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Begin a run over `selection` (empty: every task). The report starts
    /// empty.
    pub fn start_run(&mut self, selection: &[TaskName]) -> Result<CoreStep> {
        self.report = RunReport::default();
        start_run_from_selection(&mut self.scheduler, &mut self.report, selection)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted { task, outcome } => {
                handle_task_completion(&mut self.scheduler, &mut self.report, task, outcome)
            }
            RuntimeEvent::ShutdownRequested => {
                handle_shutdown(&mut self.scheduler, &mut self.report)
            }
        }
    }

    /// Hand out the report of the last run.
    pub fn take_report(&mut self) -> RunReport {
        std::mem::take(&mut self.report)
    }
}
