// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::task_info::ScheduledTask;
use crate::tasks::TaskName;

/// Structured result of a single scheduler "step".
///
/// Tests use it to step the DAG manually and assert on what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks whose own execution failed in this step.
    pub newly_failed: Vec<TaskName>,
    /// Tasks that can no longer run because something upstream failed.
    pub newly_blocked: Vec<TaskName>,
    /// Whether this step finished the current run (the scheduler is idle).
    pub run_just_finished: bool,
}

impl SchedulerStep {
    pub fn scheduled_names(&self) -> Vec<&str> {
        self.newly_scheduled.iter().map(|t| t.name()).collect()
    }
}
