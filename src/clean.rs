// src/clean.rs

//! Clean mode: undo what tasks produced.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::check::UpToDateChecker;
use crate::engine::Plan;
use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::tasks::{CleanAction, TaskName};

/// One thing clean removed (or would remove in a dry run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removed {
    File(PathBuf),
    Dir(PathBuf),
}

/// Run the clean actions of `selection` (empty: every task).
///
/// Group tasks stand for everything they aggregate. Tasks are cleaned in
/// reverse execution order; files or directories that do not exist are
/// skipped. With `dry_run` nothing is touched and the would-be removals are
/// returned.
pub fn clean(
    fs: &dyn FileSystem,
    plan: &Plan,
    selection: &[TaskName],
    checker: Option<&UpToDateChecker>,
    dry_run: bool,
) -> Result<Vec<Removed>> {
    let wanted = expand_selection(plan, selection)?;

    let mut order = plan.graph().topological_order()?;
    order.reverse();

    let mut removed = Vec::new();
    for name in order {
        if !selection.is_empty() && !wanted.contains(&name) {
            continue;
        }
        let Some(task) = plan.task(&name) else {
            continue;
        };
        if task.clean.is_empty() {
            continue;
        }

        debug!(task = %name, "cleaning");
        for action in &task.clean {
            match action {
                CleanAction::RemoveTargets => {
                    for target in &task.targets {
                        if !fs.is_file(target) {
                            continue;
                        }
                        if !dry_run {
                            fs.remove_file(target)?;
                            info!(task = %name, path = ?target, "removed file");
                        }
                        removed.push(Removed::File(target.clone()));
                    }
                }
                CleanAction::RemoveDir(dir) => {
                    if !fs.is_dir(dir) {
                        continue;
                    }
                    if !dry_run {
                        fs.remove_dir_all(dir)?;
                        info!(task = %name, path = ?dir, "removed directory");
                    }
                    removed.push(Removed::Dir(dir.clone()));
                }
            }
        }

        if !dry_run {
            if let Some(checker) = checker {
                if let Err(err) = checker.forget(&name) {
                    warn!(task = %name, error = %err, "could not forget task state");
                }
            }
        }
    }

    Ok(removed)
}

/// Selected task names with group tasks replaced by their members,
/// recursively.
fn expand_selection(plan: &Plan, selection: &[TaskName]) -> Result<HashSet<TaskName>> {
    let mut wanted = HashSet::new();
    let mut stack: Vec<TaskName> = Vec::new();

    for name in selection {
        if plan.task(name).is_none() {
            return Err(PipelineError::TaskNotFound(name.clone()));
        }
        stack.push(name.clone());
    }

    while let Some(name) = stack.pop() {
        if !wanted.insert(name.clone()) {
            continue;
        }
        if let Some(task) = plan.task(&name) {
            if task.is_group() {
                stack.extend(task.task_deps.iter().cloned());
            }
        }
    }

    Ok(wanted)
}
