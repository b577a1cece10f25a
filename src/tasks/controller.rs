// src/tasks/controller.rs

//! Two-stage controller build per controller directory: configure with CMake
//! into `build/`, then compile the shared library with make.

use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::fs::file_name_str;
use crate::tasks::{scan, task_name, Action, CleanAction, CommandSpec, GenContext, Task, TaskGenerator};

/// Build directory inside each controller directory.
pub const BUILD_DIR: &str = "build";

/// Generated build configuration inside the build directory.
pub const BUILD_CONFIGURATION: &str = "Makefile";

pub fn build_dir(controller: &Path) -> PathBuf {
    controller.join(BUILD_DIR)
}

/// `prepare_discon_compilation:<controller>`: `cmake ..` in `build/`.
pub struct PrepareDisconCompilation;

impl TaskGenerator for PrepareDisconCompilation {
    fn basename(&self) -> &'static str {
        "prepare_discon_compilation"
    }

    fn generate(&self, ctx: &GenContext<'_>) -> Result<Vec<Task>> {
        let layout = ctx.cfg.controller();
        let cmake = &ctx.cfg.commands().cmake;
        let mut tasks = Vec::new();

        for controller in scan::subdirs(ctx.fs, &ctx.controller_dir())? {
            let build = build_dir(&controller);
            tasks.push(
                Task::new(task_name([self.basename(), file_name_str(&controller)]))
                    .file_dep(controller.join(&layout.build_description))
                    .target(build.join(BUILD_CONFIGURATION))
                    .action(Action::EnsureDir(build.clone()))
                    .command(CommandSpec::new(cmake).arg("..").cwd(&build))
                    .clean_with(vec![CleanAction::RemoveDir(build)]),
            );
        }

        Ok(tasks)
    }
}

/// `compile_discon:<controller>`: `make` in `build/`.
///
/// Depends on the generated `Makefile`, so it is ordered after
/// `prepare_discon_compilation` for the same controller.
pub struct CompileDiscon;

impl TaskGenerator for CompileDiscon {
    fn basename(&self) -> &'static str {
        "compile_discon"
    }

    fn generate(&self, ctx: &GenContext<'_>) -> Result<Vec<Task>> {
        let layout = ctx.cfg.controller();
        let make = &ctx.cfg.commands().make;
        let mut tasks = Vec::new();

        for controller in scan::subdirs(ctx.fs, &ctx.controller_dir())? {
            let build = build_dir(&controller);
            tasks.push(
                Task::new(task_name([self.basename(), file_name_str(&controller)]))
                    .file_dep(build.join(BUILD_CONFIGURATION))
                    .file_dep(controller.join(&layout.source))
                    .target(build.join(&layout.library))
                    .command(CommandSpec::new(make).cwd(&build)),
            );
        }

        Ok(tasks)
    }
}
