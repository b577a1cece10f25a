// src/exec/mod.rs

//! Task execution layer.
//!
//! Runs the actions of dispatched tasks and reports back to the runtime via
//! `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the loop that receives scheduled tasks and
//!   bounds how many execute at once.
//! - [`task_runner`] runs a single task: up-to-date check, then actions.
//! - [`command`] runs external programs behind the [`CommandRunner`] trait.
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod command;
pub mod executor_loop;
pub mod task_runner;

use std::fmt;
use std::sync::Arc;

use crate::check::UpToDateChecker;
use crate::fs::FileSystem;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use command::{CommandRunner, ProcessRunner};
pub use executor_loop::spawn_executor;

/// Everything a running task needs, shared by all of them.
#[derive(Clone)]
pub struct ExecContext {
    pub fs: Arc<dyn FileSystem>,
    pub checker: Arc<UpToDateChecker>,
    pub runner: Arc<dyn CommandRunner>,
    /// Maximum number of tasks executing at once (at least 1).
    pub jobs: usize,
}

impl fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecContext")
            .field("checker", &self.checker)
            .field("jobs", &self.jobs)
            .finish_non_exhaustive()
    }
}
