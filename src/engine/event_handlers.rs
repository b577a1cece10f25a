// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use crate::dag::{ScheduledTask, Scheduler, SchedulerStep};
use crate::engine::report::RunReport;
use crate::engine::{TaskName, TaskOutcome};
use crate::errors::Result;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// The run is over; the shell should stop reading events.
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Start a run over `selection` (empty: every task) and return the tasks
/// that can be dispatched right away.
pub fn start_run_from_selection(
    scheduler: &mut Scheduler,
    report: &mut RunReport,
    selection: &[TaskName],
) -> Result<CoreStep> {
    let step = scheduler.start_run(selection)?;
    Ok(apply_scheduler_step(scheduler, report, step))
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    report: &mut RunReport,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    if !is_group(scheduler, &task) {
        match outcome {
            TaskOutcome::Success => report.executed.push(task.clone()),
            TaskOutcome::UpToDate => report.up_to_date.push(task.clone()),
            TaskOutcome::Failed(_) => {}
        }
    }

    let step = scheduler.step_completion(&task, outcome);
    apply_scheduler_step(scheduler, report, step)
}

/// Handle a shutdown request: abandon the run and record what never
/// finished.
pub fn handle_shutdown(scheduler: &mut Scheduler, report: &mut RunReport) -> CoreStep {
    let unfinished = scheduler.abort_run();
    let scheduler: &Scheduler = scheduler;
    report.interrupted.extend(
        unfinished
            .into_iter()
            .filter(|name| !is_group(scheduler, name)),
    );

    CoreStep {
        commands: vec![CoreCommand::RequestExit],
        keep_running: false,
    }
}

/// Fold a scheduler step into the report and turn it into commands.
///
/// Group tasks have nothing to execute, so they are completed here instead
/// of round-tripping through the executor; completing one may make more
/// tasks ready, hence the loop.
fn apply_scheduler_step(
    scheduler: &mut Scheduler,
    report: &mut RunReport,
    first: SchedulerStep,
) -> CoreStep {
    let mut dispatch: Vec<ScheduledTask> = Vec::new();
    let mut pending_steps = vec![first];
    let mut finished = false;

    while let Some(step) = pending_steps.pop() {
        record_step(scheduler, report, &step);
        finished |= step.run_just_finished;

        for scheduled in step.newly_scheduled {
            if scheduled.task.is_group() {
                let name = scheduled.name().to_string();
                pending_steps.push(scheduler.step_completion(&name, TaskOutcome::UpToDate));
            } else {
                dispatch.push(scheduled);
            }
        }
    }

    let mut commands = Vec::new();
    if !dispatch.is_empty() {
        commands.push(CoreCommand::DispatchTasks(dispatch));
    }

    let keep_running = !(finished && scheduler.is_idle());
    if !keep_running {
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

fn record_step(scheduler: &Scheduler, report: &mut RunReport, step: &SchedulerStep) {
    report.failed.extend(step.newly_failed.iter().cloned());
    report.blocked.extend(
        step.newly_blocked
            .iter()
            .filter(|name| !is_group(scheduler, name))
            .cloned(),
    );
}

fn is_group(scheduler: &Scheduler, name: &str) -> bool {
    scheduler.task(name).map(|t| t.is_group()).unwrap_or(false)
}
