// src/dag/state_manager.rs

//! Per-run state management for tasks in the scheduler.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::tasks::TaskName;

/// Whether a task's dependencies allow it to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepStatus {
    Satisfied,
    /// At least one dependency has not finished yet.
    Waiting,
    /// At least one dependency failed; the task can never run in this run.
    Blocked,
}

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a TaskGraph,
    tasks: &'a mut BTreeMap<TaskName, TaskInfo>,
    current_run_id: Option<u64>,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a TaskGraph,
        tasks: &'a mut BTreeMap<TaskName, TaskInfo>,
        current_run_id: Option<u64>,
    ) -> Self {
        Self {
            graph,
            tasks,
            current_run_id,
        }
    }

    /// Include the selected tasks and everything they depend on in this run.
    ///
    /// Tasks that already finished in an earlier run of this process keep
    /// their result and are not re-run; dependents consult that history.
    pub fn mark_selection_and_upstream_pending(&mut self, roots: &[TaskName]) {
        let mut stack: Vec<TaskName> = roots.to_vec();
        let mut visited: HashSet<TaskName> = HashSet::new();

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }

            match self.tasks.get_mut(&name) {
                Some(info) => {
                    if info.run_state.is_none() && !info.has_history() {
                        info.run_state = Some(RunState::Pending);
                        debug!(task = %name, "marked Pending for this run");
                    }
                    stack.extend(self.graph.dependencies_of(&name).iter().cloned());
                }
                None => {
                    warn!(task = %name, "node in DAG not present in tasks map");
                }
            }
        }
    }

    /// Mark every pending dependent of a failed task (transitively) as
    /// blocked for this run.
    ///
    /// Returns the tasks that were newly blocked, excluding the failed task.
    pub fn mark_dependents_blocked(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed_task).to_vec();
        let mut newly_blocked = Vec::new();

        while let Some(name) = stack.pop() {
            if let Some(info) = self.tasks.get_mut(&name) {
                match info.run_state {
                    Some(RunState::Pending) | Some(RunState::Running) => {
                        info.run_state = Some(RunState::Blocked);
                        info.last_failed_run = self.current_run_id;
                        debug!(
                            task = %name,
                            upstream = %failed_task,
                            "blocked by upstream failure"
                        );
                        newly_blocked.push(name.clone());
                        stack.extend(self.graph.dependents_of(&name).iter().cloned());
                    }
                    _ => {
                        // Either already terminal or not participating in this run.
                    }
                }
            }
        }

        newly_blocked
    }

    /// Collect tasks that are `Pending` and whose dependencies are satisfied,
    /// mark them as `Running`, and return them as `ScheduledTask`s.
    ///
    /// Pending tasks whose dependencies can never be satisfied (a dependency
    /// failed in this or an earlier run) are marked blocked and returned in
    /// the second vector.
    pub fn collect_new_ready_tasks(&mut self) -> (Vec<ScheduledTask>, Vec<TaskName>) {
        let mut blocked = Vec::new();

        // Blocking one task can block its pending dependents; repeat until
        // nothing changes.
        loop {
            let newly: Vec<TaskName> = self
                .tasks
                .values()
                .filter(|info| matches!(info.run_state, Some(RunState::Pending)))
                .filter(|info| self.dep_status(info) == DepStatus::Blocked)
                .map(|info| info.task.name.clone())
                .collect();

            if newly.is_empty() {
                break;
            }

            for name in newly {
                if let Some(info) = self.tasks.get_mut(&name) {
                    info.run_state = Some(RunState::Blocked);
                    info.last_failed_run = self.current_run_id;
                    debug!(task = %name, "dependency failed earlier; task blocked");
                }
                blocked.push(name);
            }
        }

        let candidates: Vec<TaskName> = self
            .tasks
            .values()
            .filter(|info| matches!(info.run_state, Some(RunState::Pending)))
            .filter(|info| self.dep_status(info) == DepStatus::Satisfied)
            .map(|info| info.task.name.clone())
            .collect();

        let mut ready = Vec::new();
        for name in candidates {
            if let Some(info) = self.tasks.get_mut(&name) {
                if !info.task.is_group() {
                    info!(
                        task = %name,
                        run_id = self.current_run_id,
                        "dependencies satisfied; scheduling task"
                    );
                }
                info.run_state = Some(RunState::Running);
                ready.push(ScheduledTask::from_task_info(
                    info,
                    self.current_run_id.unwrap_or(0),
                ));
            }
        }

        (ready, blocked)
    }

    /// Dependency status of a task for the *current run*.
    pub fn dep_status(&self, info: &TaskInfo) -> DepStatus {
        ReadOnlyStateManager::new(self.tasks).dep_status(info)
    }

    /// Check if all tasks are in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        !self.tasks.values().any(|info| {
            matches!(
                info.run_state,
                Some(RunState::Pending) | Some(RunState::Running)
            )
        })
    }
}

/// A read-only view for checking dependency satisfaction.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a BTreeMap<TaskName, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a BTreeMap<TaskName, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// Checks the current run state for tasks participating in this run and
    /// falls back to history for tasks that are not.
    pub fn dep_status(&self, info: &TaskInfo) -> DepStatus {
        let mut status = DepStatus::Satisfied;

        for dep_name in &info.deps {
            let dep = match self.tasks.get(dep_name) {
                Some(d) => d,
                None => {
                    warn!(
                        task = %info.name(),
                        dep = %dep_name,
                        "dependency missing from tasks map"
                    );
                    return DepStatus::Blocked;
                }
            };

            match dep.run_state {
                Some(RunState::DoneSuccess) => {}
                Some(RunState::DoneFailed) | Some(RunState::Blocked) => {
                    return DepStatus::Blocked;
                }
                Some(RunState::Pending) | Some(RunState::Running) => {
                    status = DepStatus::Waiting;
                }
                None => match dep.last_run_succeeded() {
                    Some(true) => {}
                    // Failed earlier, or never part of any run.
                    Some(false) | None => return DepStatus::Blocked,
                },
            }
        }

        status
    }
}
