// src/dag/task_info.rs

//! Task metadata and per-run state management.

use std::sync::Arc;

use crate::tasks::{Task, TaskName};

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Task is part of this run but is waiting on dependencies.
    Pending,
    /// Task has been dispatched to the executor and is currently running.
    Running,
    /// Task executed successfully or was found up to date.
    DoneSuccess,
    /// Task itself failed in this run.
    DoneFailed,
    /// Task never ran because a dependency failed or was blocked.
    Blocked,
}

/// Public, read-only view of a task's per-run state.
///
/// This is exposed for tests and diagnostics without leaking the internal
/// `RunState` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not currently participating in this run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
    Blocked,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
            Some(RunState::Blocked) => TaskRunState::Blocked,
        }
    }
}

/// A generated task plus its scheduling history.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub task: Arc<Task>,
    /// Direct dependencies (explicit and implied by files).
    pub deps: Vec<TaskName>,

    /// Per-run state (None if not participating in the current run).
    pub run_state: Option<RunState>,

    /// Last run ID in which this task succeeded.
    pub last_successful_run: Option<u64>,

    /// Last run ID in which this task failed or was blocked.
    pub last_failed_run: Option<u64>,
}

impl TaskInfo {
    pub fn new(task: Arc<Task>, deps: Vec<TaskName>) -> Self {
        Self {
            task,
            deps,
            run_state: None,
            last_successful_run: None,
            last_failed_run: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.task.name
    }

    /// Whether the task already finished in an earlier run of this process.
    pub fn has_history(&self) -> bool {
        self.last_successful_run.is_some() || self.last_failed_run.is_some()
    }

    /// Outcome of the most recent finished run, if any.
    pub fn last_run_succeeded(&self) -> Option<bool> {
        match (self.last_successful_run, self.last_failed_run) {
            (None, None) => None,
            (Some(_), None) => Some(true),
            (None, Some(_)) => Some(false),
            (Some(ok), Some(failed)) => Some(ok > failed),
        }
    }
}

/// A task that the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub task: Arc<Task>,
    /// Monotonically increasing run identifier.
    ///
    /// All tasks that belong to the same run share the same `run_id`.
    pub run_id: u64,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo, run_id: u64) -> Self {
        Self {
            task: Arc::clone(&info.task),
            run_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.task.name
    }
}
