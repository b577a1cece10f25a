// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `fastpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fastpipe",
    version,
    about = "Incrementally prepare and run wind turbine simulation campaigns.",
    long_about = None
)]
pub struct CliArgs {
    /// Project root holding `simulations/`, `wind/`, `controller/` and `runs/`.
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    pub root: PathBuf,

    /// Path to the config file (TOML).
    ///
    /// Default: `Fastpipe.toml` in the project root, if present.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FASTPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Number of tasks to execute in parallel (overrides `[config] jobs`).
    #[arg(long, short = 'j', value_name = "N", global = true)]
    pub jobs: Option<usize>,

    /// Show what would happen without running or removing anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run every task, or the named tasks and what they depend on.
    Run {
        #[arg(value_name = "TASK")]
        tasks: Vec<String>,
    },
    /// Remove what the named tasks (default: all) produced.
    Clean {
        #[arg(value_name = "TASK")]
        tasks: Vec<String>,
    },
    /// List tasks.
    List {
        /// List every task instead of one line per generator.
        #[arg(long)]
        all: bool,
        /// Show whether each task is up to date.
        #[arg(long)]
        status: bool,
    },
}

impl CliArgs {
    /// The subcommand, defaulting to `run` with no task names.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Run { tasks: Vec::new() })
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
