// src/tasks/fast_input.rs

//! Per-variant copies of each scenario's template files.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::Result;
use crate::fs::file_name_str;
use crate::tasks::scenario::Scenario;
use crate::tasks::wind_files::{expected_wind_files, GENERATOR_SCRIPT};
use crate::tasks::{scan, task_name, CleanAction, GenContext, Task, TaskGenerator};

/// `prepare_fast_input:<scenario>` for every directory under `simulations/`.
///
/// Targets are the full cross product `runs/<scenario>/<variant>/<template>`.
/// Each variant gets one rewrite action per template; the scenario kind
/// decides which template carries the variant's parameter.
pub struct PrepareFastInput;

impl TaskGenerator for PrepareFastInput {
    fn basename(&self) -> &'static str {
        "prepare_fast_input"
    }

    fn generate(&self, ctx: &GenContext<'_>) -> Result<Vec<Task>> {
        let sweep = ctx.cfg.sweep();
        let runs_dir = ctx.runs_dir();
        let mut tasks = Vec::new();

        for scenario in Scenario::discover(ctx.fs, &ctx.simulations_dir(), sweep)? {
            let templates = scenario_templates(ctx, &scenario)?;
            let variants = scenario.variants(sweep);

            let mut task = Task::new(task_name([self.basename(), &scenario.name]))
                .file_deps(&templates);
            let mut clean = Vec::with_capacity(variants.len());

            for variant in &variants {
                let variant_dir = scenario.variant_dir(&runs_dir, variant);
                for template in &templates {
                    let target = variant_dir.join(file_name_str(template));
                    let rules = variant.rules_for(template, sweep);
                    task = task.target(&target).rewrite(template, &target, rules);
                }
                clean.push(CleanAction::RemoveDir(variant_dir));
            }

            debug!(
                task = %task.name,
                kind = ?scenario.kind,
                variants = variants.len(),
                templates = templates.len(),
                "generated input preparation task"
            );
            tasks.push(task.clean_with(clean));
        }

        Ok(tasks)
    }
}

/// Template files of a scenario: every file in its directory, plus the wind
/// files its generator script will write even if they do not exist yet.
fn scenario_templates(ctx: &GenContext<'_>, scenario: &Scenario) -> Result<Vec<PathBuf>> {
    let mut templates: BTreeSet<PathBuf> = scan::files(ctx.fs, &scenario.dir)?.into_iter().collect();

    if ctx.fs.is_file(&scenario.dir.join(GENERATOR_SCRIPT)) {
        templates.extend(expected_wind_files(ctx.fs, &scenario.dir)?);
    }

    Ok(templates.into_iter().collect())
}
