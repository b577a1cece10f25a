// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the DAG scheduler
//! - the main runtime event loop that reacts to task completions and
//!   shutdown signals
//! - phased task generation for generators that enumerate the outputs of
//!   other generators
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]; [`planner`] drives generation and runs one
//! phase at a time.

pub use crate::tasks::TaskName;

/// Outcome of a dispatched task for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Actions ran and all succeeded.
    Success,
    /// Targets were current; nothing ran.
    UpToDate,
    /// An action failed. Carries the exit code of a failed process, or -1
    /// when the failure was not a process exit.
    Failed(i32),
}

impl TaskOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, TaskOutcome::Success | TaskOutcome::UpToDate)
    }
}

/// Events flowing into the runtime from the executor and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task finished with a concrete outcome.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod planner;
pub mod report;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use planner::{Plan, Planner};
pub use report::RunReport;
pub use runtime::Runtime;
