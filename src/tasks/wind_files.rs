// src/tasks/wind_files.rs

//! Uniform wind files with a sinusoidal gust, written by a script that lives
//! next to the scenario templates.

use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::fs::{file_name_str, FileSystem};
use crate::tasks::{scan, task_name, CommandSpec, GenContext, Task, TaskGenerator};

/// File name of the per-scenario wind generator script.
pub const GENERATOR_SCRIPT: &str = "generate_inflow_gust.py";

/// The wind files a generator script in `dir` is expected to write: one
/// `.wnd` per `wind*.fst` run file.
pub fn expected_wind_files(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(scan::glob_files(fs, dir, "wind*.fst")?
        .into_iter()
        .map(|p| p.with_extension("wnd"))
        .collect())
}

/// `sinusoidal_wind_files:<dir name>` for every generator script under
/// `simulations/`.
pub struct SinusoidalWindFiles;

impl TaskGenerator for SinusoidalWindFiles {
    fn basename(&self) -> &'static str {
        "sinusoidal_wind_files"
    }

    fn generate(&self, ctx: &GenContext<'_>) -> Result<Vec<Task>> {
        let python = &ctx.cfg.commands().python;
        let mut tasks = Vec::new();

        for script in scan::find_recursive(ctx.fs, &ctx.simulations_dir(), GENERATOR_SCRIPT)? {
            let Some(dir) = script.parent() else {
                continue;
            };
            let dir_name = file_name_str(dir).to_string();

            tasks.push(
                Task::new(task_name([self.basename(), &dir_name]))
                    .file_dep(&script)
                    .targets(expected_wind_files(ctx.fs, dir)?)
                    .command(
                        CommandSpec::new(python)
                            .arg(file_name_str(&script))
                            .cwd(dir),
                    ),
            );
        }

        Ok(tasks)
    }
}
