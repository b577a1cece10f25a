// src/exec/task_runner.rs

//! Individual task runner.

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::check::Staleness;
use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::{PipelineError, Result};
use crate::exec::ExecContext;
use crate::rewrite::copy_with_substitutions;
use crate::tasks::{Action, Task};

/// Run a single task and emit its `TaskCompleted` event.
///
/// Errors (template drift, missing dependency, a program that cannot be
/// started) fail the task; they are logged here together with the task
/// name and never abort the run.
pub async fn run_task(
    task: ScheduledTask,
    ctx: ExecContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let name = task.name().to_string();
    let run_id = task.run_id;

    let outcome = match execute(&task.task, &ctx).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(task = %name, run_id, error = %err, "task failed");
            TaskOutcome::Failed(-1)
        }
    };

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: name.clone(),
            outcome,
        })
        .await
        .is_err()
    {
        debug!(task = %name, "runtime gone; dropping completion");
    }
}

/// Check, then run the actions of `task` in order.
pub async fn execute(task: &Task, ctx: &ExecContext) -> Result<TaskOutcome> {
    if let Some(reason) = task.generation_error() {
        return Err(unresolved(task, reason));
    }

    match ctx.checker.check(task)? {
        Staleness::UpToDate => {
            info!(task = %task.name, "up to date");
            return Ok(TaskOutcome::UpToDate);
        }
        Staleness::Stale(reason) => {
            debug!(task = %task.name, %reason, "task is stale");
        }
    }

    info!(task = %task.name, "running task");

    for action in &task.actions {
        match action {
            Action::Command(spec) => {
                info!(task = %task.name, command = %spec, "running command");
                let code = ctx.runner.run(task, spec).await?;
                if code != 0 {
                    error!(
                        task = %task.name,
                        command = %spec,
                        exit_code = code,
                        "command failed"
                    );
                    return Ok(TaskOutcome::Failed(code));
                }
            }
            Action::Rewrite {
                source,
                target,
                rules,
            } => {
                copy_with_substitutions(ctx.fs.as_ref(), source, target, rules)?;
            }
            Action::EnsureDir(dir) => {
                ctx.fs.create_dir_all(dir)?;
            }
            Action::Fail(reason) => return Err(unresolved(task, reason)),
        }
    }

    if let Err(err) = ctx.checker.record_success(task) {
        warn!(task = %task.name, error = %err, "could not record task state");
    }

    info!(task = %task.name, "task succeeded");
    Ok(TaskOutcome::Success)
}

fn unresolved(task: &Task, reason: &str) -> PipelineError {
    PipelineError::Unresolved {
        task: task.name.clone(),
        reason: reason.to_string(),
    }
}
