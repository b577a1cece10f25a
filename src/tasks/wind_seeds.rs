// src/tasks/wind_seeds.rs

//! Turbulent wind: one turbulence generator input per seed, then one
//! generator run per input.

use tracing::debug;

use crate::errors::Result;
use crate::fs::file_stem_str;
use crate::rewrite::rules;
use crate::tasks::scenario::{seed_label, seed_number};
use crate::tasks::{scan, task_name, CommandSpec, GenContext, Task, TaskGenerator};

/// Subdirectory of `runs/` holding seed-specific turbulence files.
pub const WIND_SEEDS_DIR: &str = "wind_seeds";

/// `<stem>_seedNN.<ext>`.
pub fn seed_output_name(stem: &str, seed: u32, ext: &str) -> String {
    format!("{stem}_seed{}.{ext}", seed_label(seed))
}

/// `prepare_wind_input:<stem>` for every `wind/*.inp`.
///
/// Writes `runs/wind_seeds/<stem>_seedNN.inp` for each seed with `RandSeed1`
/// set to `seed_base_offset + NN`.
pub struct PrepareWindInput;

impl TaskGenerator for PrepareWindInput {
    fn basename(&self) -> &'static str {
        "prepare_wind_input"
    }

    fn generate(&self, ctx: &GenContext<'_>) -> Result<Vec<Task>> {
        let sweep = ctx.cfg.sweep();
        let out_dir = ctx.wind_seeds_dir();
        let mut tasks = Vec::new();

        for input in scan::glob_files(ctx.fs, &ctx.wind_dir(), "*.inp")? {
            let stem = file_stem_str(&input).to_string();
            let mut task = Task::new(task_name([self.basename(), &stem])).file_dep(&input);

            for seed in 0..sweep.num_seeds {
                let target = out_dir.join(seed_output_name(&stem, seed, "inp"));
                let rule = rules::rand_seed(seed_number(sweep, seed));
                task = task.target(&target).rewrite(&input, &target, vec![rule]);
            }

            debug!(task = %task.name, seeds = sweep.num_seeds, "generated seed preparation task");
            tasks.push(task);
        }

        Ok(tasks)
    }
}

/// `turbsim:<stem>` for every prepared `runs/wind_seeds/*.inp`.
pub struct Turbsim;

impl TaskGenerator for Turbsim {
    fn basename(&self) -> &'static str {
        "turbsim"
    }

    fn created_after(&self) -> Option<&'static str> {
        Some("prepare_wind_input")
    }

    fn generate(&self, ctx: &GenContext<'_>) -> Result<Vec<Task>> {
        let program = &ctx.cfg.commands().turbsim;
        let mut tasks = Vec::new();

        for input in scan::glob_files(ctx.fs, &ctx.wind_seeds_dir(), "*.inp")? {
            let stem = file_stem_str(&input).to_string();
            tasks.push(
                Task::new(task_name([self.basename(), &stem]))
                    .file_dep(&input)
                    .target(input.with_extension("bts"))
                    .command(CommandSpec::new(program).path_arg(&input)),
            );
        }

        Ok(tasks)
    }
}
