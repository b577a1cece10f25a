// src/engine/planner.rs

//! Phased task generation.
//!
//! Some generators enumerate files that other generators' tasks produce
//! (`openfast` looks at `runs/`, which `prepare_fast_input` fills). Such a
//! generator declares `created_after`, and is only asked for its tasks once
//! the phase holding that basename has executed. Phase 0 holds every
//! generator without `created_after`.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::dag::{Scheduler, TaskGraph};
use crate::engine::report::RunReport;
use crate::engine::runtime::Runtime;
use crate::errors::{PipelineError, Result};
use crate::exec::ExecutorBackend;
use crate::tasks::{basename_of, generate_with_group, GenContext, Task, TaskGenerator, TaskName};

/// Generates tasks phase by phase and runs them.
pub struct Planner<'a> {
    ctx: GenContext<'a>,
    generators: Vec<Box<dyn TaskGenerator>>,
}

impl<'a> Planner<'a> {
    pub fn new(ctx: GenContext<'a>, generators: Vec<Box<dyn TaskGenerator>>) -> Self {
        Self { ctx, generators }
    }

    /// Generators grouped by phase, each phase in declaration order.
    pub fn phases(&self) -> Result<Vec<Vec<&dyn TaskGenerator>>> {
        let by_name: HashMap<&str, &dyn TaskGenerator> = self
            .generators
            .iter()
            .map(|g| (g.basename(), g.as_ref()))
            .collect();

        let mut phases: Vec<Vec<&dyn TaskGenerator>> = Vec::new();
        for generator in &self.generators {
            let phase = phase_of(generator.as_ref(), &by_name)?;
            if phases.len() <= phase {
                phases.resize_with(phase + 1, Vec::new);
            }
            phases[phase].push(generator.as_ref());
        }
        Ok(phases)
    }

    /// Generate every phase from the tree as it is now, without executing
    /// anything.
    pub fn plan(&self) -> Result<Plan> {
        let mut tasks = Vec::new();
        for phase in self.phases()? {
            for generator in phase {
                tasks.extend(generate_with_group(generator, &self.ctx)?);
            }
        }
        debug!(tasks = tasks.len(), "planned tasks");
        Ok(Plan {
            scheduler: Scheduler::from_tasks(tasks)?,
        })
    }

    /// Run `selection` (empty: everything), generating each phase right
    /// before it executes.
    ///
    /// Selecting a task of a deferred generator also runs the whole
    /// `created_after` family of that generator (and of the generator that
    /// one is created after, and so on), so the tree it enumerates is
    /// complete. A selected name that no
    /// generator produces is `TaskNotFound`.
    pub async fn run<E: ExecutorBackend>(
        &self,
        runtime: &mut Runtime<E>,
        selection: &[TaskName],
    ) -> Result<RunReport> {
        let phases = self.phases()?;
        let phase_by_basename: HashMap<&str, usize> = phases
            .iter()
            .enumerate()
            .flat_map(|(i, gens)| gens.iter().map(move |g| (g.basename(), i)))
            .collect();

        let mut selected_phases: Vec<usize> = Vec::new();
        for name in selection {
            match phase_by_basename.get(basename_of(name)) {
                Some(phase) => selected_phases.push(*phase),
                None => return Err(PipelineError::TaskNotFound(name.clone())),
            }
        }

        let last_phase = match selected_phases.iter().max() {
            Some(max) => *max,
            None => phases.len().saturating_sub(1),
        };

        let by_basename: HashMap<&str, &dyn TaskGenerator> = phases
            .iter()
            .flatten()
            .map(|g| (g.basename(), *g))
            .collect();

        // The created_after chain of each selected task's own generator.
        let mut pulled: BTreeSet<&str> = BTreeSet::new();
        for name in selection {
            let mut current = by_basename.get(basename_of(name)).copied();
            while let Some(after) = current.and_then(|g| g.created_after()) {
                if !pulled.insert(after) {
                    break;
                }
                current = by_basename.get(after).copied();
            }
        }

        let mut report = RunReport::default();

        for (index, generators) in phases.iter().enumerate().take(last_phase + 1) {
            let mut generated: Vec<Task> = Vec::new();
            for generator in generators {
                generated.extend(generate_with_group(*generator, &self.ctx)?);
            }
            let new_names: Vec<TaskName> = generated.iter().map(|t| t.name.clone()).collect();
            info!(phase = index, tasks = new_names.len(), "generated tasks");

            runtime.core_mut().scheduler_mut().extend(generated)?;

            let phase_selection: Vec<TaskName> = if selection.is_empty() {
                new_names
            } else {
                let scheduler = runtime.core().scheduler();
                let mut chosen = Vec::new();
                for name in selection {
                    if phase_by_basename.get(basename_of(name)) != Some(&index) {
                        continue;
                    }
                    if !scheduler.contains(name) {
                        return Err(PipelineError::TaskNotFound(name.clone()));
                    }
                    chosen.push(name.clone());
                }
                chosen.extend(
                    generators
                        .iter()
                        .map(|g| g.basename())
                        .filter(|b| pulled.contains(b))
                        .map(str::to_string),
                );
                chosen
            };

            if phase_selection.is_empty() {
                debug!(phase = index, "nothing selected in phase");
                continue;
            }

            let phase_report = runtime.run_phase(&phase_selection).await?;
            info!(phase = index, %phase_report, "phase finished");
            report.merge(phase_report);

            if runtime.shutdown_requested() {
                break;
            }
        }

        Ok(report)
    }
}

/// Phase index of `generator`: one more than the generator it is created
/// after.
fn phase_of<'g>(
    generator: &'g dyn TaskGenerator,
    by_name: &HashMap<&str, &'g dyn TaskGenerator>,
) -> Result<usize> {
    let mut phase = 0;
    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = generator;
    seen.insert(current.basename());

    while let Some(after) = current.created_after() {
        let Some(next) = by_name.get(after) else {
            return Err(PipelineError::ConfigError(format!(
                "generator '{}' is created after unknown generator '{}'",
                current.basename(),
                after
            )));
        };
        if !seen.insert(after) {
            return Err(PipelineError::ConfigError(format!(
                "generators form a created_after cycle through '{}'",
                after
            )));
        }
        phase += 1;
        current = *next;
    }
    Ok(phase)
}

/// Every task of every phase, generated from the current tree.
#[derive(Debug)]
pub struct Plan {
    scheduler: Scheduler,
}

impl Plan {
    pub fn graph(&self) -> &TaskGraph {
        self.scheduler.graph()
    }

    pub fn task(&self, name: &str) -> Option<&Arc<Task>> {
        self.scheduler.task(name)
    }

    /// All tasks in name order.
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.scheduler.tasks()
    }

    /// `selection` plus everything it depends on, in execution order. An
    /// empty selection means every task.
    pub fn select(&self, selection: &[TaskName]) -> Result<Vec<Arc<Task>>> {
        for name in selection {
            if !self.scheduler.contains(name) {
                return Err(PipelineError::TaskNotFound(name.clone()));
            }
        }

        let graph = self.graph();
        let mut wanted: HashSet<TaskName> = HashSet::new();
        let mut stack: Vec<TaskName> = selection.to_vec();
        while let Some(name) = stack.pop() {
            if wanted.insert(name.clone()) {
                stack.extend(graph.dependencies_of(&name).iter().cloned());
            }
        }

        Ok(graph
            .topological_order()?
            .into_iter()
            .filter(|name| selection.is_empty() || wanted.contains(name))
            .filter_map(|name| self.scheduler.task(&name).cloned())
            .collect())
    }
}
