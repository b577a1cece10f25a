// src/dag/scheduler.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::dag::task_info::{RunState, TaskInfo, TaskRunState};
use crate::engine::TaskOutcome;
use crate::errors::{PipelineError, Result};
use crate::tasks::{Task, TaskName};

/// Scheduler holds the task graph plus mutable per-run state.
///
/// It is responsible for:
/// - remembering which tasks are part of the current run
/// - deciding when a task is ready to run (deps satisfied)
/// - marking tasks as succeeded or failed
/// - blocking dependents when a task fails
///
/// Tasks can be added between runs with [`Scheduler::extend`]; results of
/// earlier runs are kept, so a task never runs twice in one process.
#[derive(Debug, Default)]
pub struct Scheduler {
    graph: TaskGraph,
    tasks: BTreeMap<TaskName, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a scheduler from a set of generated tasks.
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self> {
        let mut scheduler = Self::new();
        scheduler.extend(tasks)?;
        Ok(scheduler)
    }

    /// Add tasks, rebuilding the graph over old and new tasks together.
    ///
    /// Must not be called while a run is active.
    pub fn extend(&mut self, tasks: Vec<Task>) -> Result<()> {
        if self.current_run_id.is_some() {
            return Err(anyhow::anyhow!("cannot add tasks while a run is active").into());
        }

        let mut all: Vec<Task> = self.tasks.values().map(|i| (*i.task).clone()).collect();
        all.extend(tasks);

        let graph = TaskGraph::build(&all)?;

        let mut infos = BTreeMap::new();
        for task in all {
            let name = task.name.clone();
            let deps = graph.dependencies_of(&name).to_vec();
            let info = match self.tasks.remove(&name) {
                Some(mut existing) => {
                    existing.deps = deps;
                    existing
                }
                None => TaskInfo::new(Arc::new(task), deps),
            };
            infos.insert(name, info);
        }

        debug!(tasks = infos.len(), "scheduler: task graph rebuilt");
        self.graph = graph;
        self.tasks = infos;
        Ok(())
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn task(&self, name: &str) -> Option<&Arc<Task>> {
        self.tasks.get(name).map(|i| &i.task)
    }

    /// All known tasks in name order.
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.tasks.values().map(|i| &i.task)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Current run ID, if any.
    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        Some(info.run_state.into())
    }

    /// Outcome of the task's most recent finished run, if any.
    pub fn last_run_succeeded(&self, task: &str) -> Option<bool> {
        self.tasks.get(task)?.last_run_succeeded()
    }

    /// Names of tasks that are participating in the *active* run.
    pub fn tasks_in_current_run(&self) -> Vec<TaskName> {
        if self.current_run_id.is_none() {
            return Vec::new();
        }

        self.tasks
            .values()
            .filter(|info| info.run_state.is_some())
            .map(|info| info.task.name.clone())
            .collect()
    }

    /// Start a new run over `selection` plus everything it depends on. An
    /// empty selection means every task.
    ///
    /// Unknown names are rejected before any state changes.
    pub fn start_run(&mut self, selection: &[TaskName]) -> Result<SchedulerStep> {
        if let Some(unknown) = selection.iter().find(|n| !self.tasks.contains_key(*n)) {
            return Err(PipelineError::TaskNotFound(unknown.clone()));
        }

        if let Some(active) = self.current_run_id {
            warn!(run_id = active, "starting a new run while another is active");
        }

        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);
        for info in self.tasks.values_mut() {
            info.run_state = None;
        }

        let roots: Vec<TaskName> = if selection.is_empty() {
            self.tasks.keys().cloned().collect()
        } else {
            selection.to_vec()
        };

        debug!(
            run_id = self.run_counter,
            roots = roots.len(),
            "scheduler: starting new run"
        );

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        manager.mark_selection_and_upstream_pending(&roots);
        let (newly_scheduled, newly_blocked) = manager.collect_new_ready_tasks();
        let run_just_finished = self.maybe_finish_run();

        Ok(SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            newly_blocked,
            run_just_finished,
        })
    }

    /// Record a task outcome and return everything that changed.
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let run_id = match self.current_run_id {
            Some(id) => id,
            None => {
                warn!(task = %task, "completion with no active run; ignoring");
                return SchedulerStep::default();
            }
        };

        let mut step = SchedulerStep::default();

        match self.tasks.get_mut(task) {
            Some(info) if info.run_state == Some(RunState::Running) => {
                if outcome.is_success() {
                    info.run_state = Some(RunState::DoneSuccess);
                    info.last_successful_run = Some(run_id);
                    debug!(task = %task, run_id, ?outcome, "task completed");
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    let (ready, blocked) = manager.collect_new_ready_tasks();
                    step.newly_scheduled = ready;
                    step.newly_blocked = blocked;
                } else {
                    info.run_state = Some(RunState::DoneFailed);
                    info.last_failed_run = Some(run_id);
                    warn!(task = %task, run_id, ?outcome, "task failed; blocking dependents");
                    step.newly_failed.push(task.to_string());
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
                    step.newly_blocked = manager.mark_dependents_blocked(task);
                }
            }
            Some(info) => {
                warn!(
                    task = %task,
                    state = ?info.run_state,
                    "completion for task that is not running; ignoring"
                );
            }
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
            }
        }

        step.run_just_finished = self.maybe_finish_run();
        step
    }

    /// Abandon the active run. Tasks that had not finished lose their run
    /// state and gain no history; their names are returned.
    pub fn abort_run(&mut self) -> Vec<TaskName> {
        let mut unfinished = Vec::new();
        for info in self.tasks.values_mut() {
            if matches!(
                info.run_state,
                Some(RunState::Pending) | Some(RunState::Running)
            ) {
                info.run_state = None;
                unfinished.push(info.task.name.clone());
            }
        }
        if let Some(run_id) = self.current_run_id.take() {
            info!(run_id, unfinished = unfinished.len(), "scheduler: run aborted");
        }
        unfinished
    }

    /// Determine whether all tasks are in a terminal state and clear
    /// `current_run_id` if so.
    ///
    /// Returns `true` if this call transitioned the scheduler from running
    /// to idle.
    fn maybe_finish_run(&mut self) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }

        let manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);

        if manager.all_tasks_terminal() {
            debug!(
                run_id = self.current_run_id,
                "scheduler: all tasks terminal; run finished"
            );
            self.current_run_id = None;
            true
        } else {
            false
        }
    }
}
