// src/tasks/openfast.rs

//! Simulator runs: one task per prepared run file, grouped per variant and
//! per scenario.

use tracing::{debug, warn};

use crate::errors::Result;
use crate::fs::{file_name_str, file_stem_str};
use crate::resolve::resolve_dependencies;
use crate::tasks::{
    scan, task_name, Action, CommandSpec, GenContext, Task, TaskGenerator, TaskName,
};

/// `openfast:<scenario>:<variant>:<run>` for every `runs/*/*/*.fst`, plus
/// `openfast:<scenario>:<variant>` and `openfast:<scenario>` group tasks.
///
/// Each run task depends on its run file and on everything the run file
/// references, transitively (see [`crate::resolve`]).
pub struct OpenFast;

impl TaskGenerator for OpenFast {
    fn basename(&self) -> &'static str {
        "openfast"
    }

    fn created_after(&self) -> Option<&'static str> {
        Some("prepare_fast_input")
    }

    fn generate(&self, ctx: &GenContext<'_>) -> Result<Vec<Task>> {
        let program = &ctx.cfg.commands().openfast;
        let mut tasks = Vec::new();

        for scenario_dir in scan::subdirs(ctx.fs, &ctx.runs_dir())? {
            let scenario = file_name_str(&scenario_dir).to_string();

            let mut variants = Vec::new();
            for variant_dir in scan::subdirs(ctx.fs, &scenario_dir)? {
                let runs = scan::glob_files(ctx.fs, &variant_dir, "*.fst")?;
                if !runs.is_empty() {
                    variants.push((file_name_str(&variant_dir).to_string(), runs));
                }
            }
            if variants.is_empty() {
                continue;
            }

            let mut variant_groups: Vec<TaskName> = Vec::with_capacity(variants.len());

            for (variant, runs) in variants {
                let mut leaves: Vec<TaskName> = Vec::with_capacity(runs.len());

                for run in runs {
                    let name = task_name([self.basename(), &scenario, &variant, file_stem_str(&run)]);
                    let task = Task::new(name.clone())
                        .file_dep(&run)
                        .target(run.with_extension("out"));

                    // A broken run file only fails its own task.
                    let task = match resolve_dependencies(ctx.fs, &run) {
                        Ok(deps) => {
                            debug!(task = %name, deps = deps.len(), "generated simulation task");
                            task.file_deps(&deps)
                                .command(CommandSpec::new(program).path_arg(&run))
                        }
                        Err(err) => {
                            warn!(task = %name, error = %err, "cannot resolve run file references");
                            task.action(Action::Fail(err.to_string()))
                        }
                    };

                    tasks.push(task);
                    leaves.push(name);
                }

                let group = task_name([self.basename(), &scenario, &variant]);
                tasks.push(Task::group(group.clone(), leaves));
                variant_groups.push(group);
            }

            tasks.push(Task::group(
                task_name([self.basename(), &scenario]),
                variant_groups,
            ));
        }

        Ok(tasks)
    }
}
