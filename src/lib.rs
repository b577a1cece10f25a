// src/lib.rs

pub mod check;
pub mod clean;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod project;
pub mod resolve;
pub mod rewrite;
pub mod tasks;
pub mod types;

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::check::{Staleness, UpToDateChecker};
use crate::clean::Removed;
use crate::cli::{CliArgs, Command};
use crate::config::loader::load_for_project;
use crate::engine::Plan;
use crate::exec::ProcessRunner;
use crate::fs::RealFileSystem;
use crate::tasks::{basename_of, TaskName};

pub use crate::project::Project;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - task generation
/// - scheduler / runtime / executor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_for_project(&args.root, args.config.as_deref())?;
    if let Some(jobs) = args.jobs {
        if jobs == 0 {
            bail!("--jobs must be at least 1");
        }
        cfg.set_jobs(jobs);
    }

    let project = Project::new(Arc::new(RealFileSystem), &args.root, cfg);

    match args.command() {
        Command::Run { tasks } => {
            if args.dry_run {
                let plan = project.plan()?;
                print_dry_run(&plan, &project.checker(), &tasks)?;
                return Ok(());
            }

            // Ctrl-C → graceful shutdown.
            let ctrl_c = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                    std::future::pending::<()>().await;
                }
            };

            let report = project
                .run_until(Arc::new(ProcessRunner), &tasks, ctrl_c)
                .await?;
            info!(%report, "run finished");

            if !report.is_success() {
                for name in &report.failed {
                    eprintln!("failed: {name}");
                }
                for name in &report.blocked {
                    eprintln!("blocked: {name}");
                }
                bail!("{report}");
            }
            Ok(())
        }
        Command::Clean { tasks } => {
            let plan = project.plan()?;
            let checker = project.checker();
            let removed = clean::clean(
                project.fs().as_ref(),
                &plan,
                &tasks,
                Some(&checker),
                args.dry_run,
            )?;
            let verb = if args.dry_run { "would remove" } else { "removed" };
            for item in &removed {
                match item {
                    Removed::File(p) => println!("{verb} {}", p.display()),
                    Removed::Dir(p) => println!("{verb} {}/", p.display()),
                }
            }
            debug!(count = removed.len(), "clean complete");
            Ok(())
        }
        Command::List { all, status } => {
            let plan = project.plan()?;
            let checker = project.checker();
            print_list(&plan, status.then_some(&checker), all)?;
            Ok(())
        }
    }
}

/// Print what `run` would do: every selected task in execution order with
/// its staleness.
fn print_dry_run(plan: &Plan, checker: &UpToDateChecker, selection: &[TaskName]) -> Result<()> {
    println!("fastpipe dry-run (check = {:?})", checker.mode());
    for task in plan.select(selection)? {
        if task.is_group() {
            continue;
        }
        println!("  {:<10} {}", status_label(checker, &task), task.name);
        for action in &task.actions {
            println!("      {action}");
        }
    }
    println!();
    println!("tasks created after others run are listed only once their inputs exist");

    debug!("dry-run complete (no execution)");
    Ok(())
}

/// Print generator families (or every task), optionally with staleness.
fn print_list(plan: &Plan, checker: Option<&UpToDateChecker>, all: bool) -> Result<()> {
    if all {
        for task in plan.tasks() {
            match checker {
                Some(checker) if !task.is_group() => {
                    println!("{:<10} {}", status_label(checker, task), task.name)
                }
                Some(_) => println!("{:<10} {}", "", task.name),
                None => println!("{}", task.name),
            }
        }
        return Ok(());
    }

    for group in plan.tasks().filter(|t| t.is_group() && !t.name.contains(':')) {
        let members: Vec<_> = plan
            .tasks()
            .filter(|t| !t.is_group() && basename_of(&t.name) == group.name)
            .collect();

        match checker {
            Some(checker) => {
                let current = members
                    .iter()
                    .filter(|t| matches!(checker.check(t), Ok(Staleness::UpToDate)))
                    .count();
                println!(
                    "{:<28} {:>4} task(s), {} up to date",
                    group.name,
                    members.len(),
                    current
                );
            }
            None => println!("{:<28} {:>4} task(s)", group.name, members.len()),
        }
    }
    Ok(())
}

fn status_label(checker: &UpToDateChecker, task: &tasks::Task) -> &'static str {
    match checker.check(task) {
        Ok(Staleness::UpToDate) => "up-to-date",
        Ok(Staleness::Stale(_)) => "stale",
        Err(_) => "waiting",
    }
}
