// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Duplicate task name: {0}")]
    DuplicateTask(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error(
        "target {} is claimed by both '{first}' and '{second}'",
        .target.display()
    )]
    DuplicateTarget {
        target: PathBuf,
        first: String,
        second: String,
    },

    /// A substitution rule matched a different number of times than the
    /// template promised. No output is written for the file.
    #[error(
        "template drift in {}: pattern `{pattern}` matched {found} time(s), expected {expected}",
        .file.display()
    )]
    TemplateDrift {
        file: PathBuf,
        pattern: String,
        found: usize,
        expected: usize,
    },

    #[error("Cyclic file reference: {0}")]
    DependencyCycle(String),

    /// The task's inputs could not be worked out when it was generated.
    #[error("task '{task}' cannot run: {reason}")]
    Unresolved { task: String, reason: String },

    #[error("task '{task}' depends on missing file {}", .path.display())]
    MissingDependency { task: String, path: PathBuf },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
