// src/check/mod.rs

//! Up-to-date checks.
//!
//! Decides, right before a task would execute, whether its targets still
//! reflect its file dependencies. Two strategies exist (see [`CheckMode`]):
//! modification times, or blake3 content hashes recorded after the last
//! successful execution.

pub mod hash;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use anyhow::anyhow;
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::tasks::Task;
use crate::types::{CheckMode, HashStorageMode};

pub use hash::{compute_hash_for_paths, FileHashStore, HashStore, MemoryHashStore, HASH_FILE_PATH};

/// Why a task has to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// A task without targets can never be shown to be current.
    NoTargets,
    MissingTarget(PathBuf),
    /// This dependency is newer than the oldest target.
    NewerDependency(PathBuf),
    /// No hash has been recorded for the task yet.
    NeverRecorded,
    HashChanged,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::NoTargets => write!(f, "task declares no targets"),
            StaleReason::MissingTarget(p) => write!(f, "target {} is missing", p.display()),
            StaleReason::NewerDependency(p) => {
                write!(f, "dependency {} is newer than the targets", p.display())
            }
            StaleReason::NeverRecorded => write!(f, "no recorded dependency hash"),
            StaleReason::HashChanged => write!(f, "dependency contents changed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    UpToDate,
    Stale(StaleReason),
}

impl Staleness {
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, Staleness::UpToDate)
    }
}

/// Staleness oracle shared by all concurrently running tasks.
pub struct UpToDateChecker {
    fs: Arc<dyn FileSystem>,
    mode: CheckMode,
    store: Mutex<Box<dyn HashStore>>,
}

impl fmt::Debug for UpToDateChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpToDateChecker")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl UpToDateChecker {
    pub fn new(fs: Arc<dyn FileSystem>, mode: CheckMode, store: Box<dyn HashStore>) -> Self {
        Self {
            fs,
            mode,
            store: Mutex::new(store),
        }
    }

    /// Checker with the hash store selected by `storage`, rooted at `root`.
    pub fn with_storage(
        fs: Arc<dyn FileSystem>,
        mode: CheckMode,
        storage: HashStorageMode,
        root: &Path,
    ) -> Self {
        let store: Box<dyn HashStore> = match storage {
            HashStorageMode::File => Box::new(FileHashStore::new(Arc::clone(&fs), root)),
            HashStorageMode::Memory => Box::new(MemoryHashStore::new()),
        };
        Self::new(fs, mode, store)
    }

    pub fn mode(&self) -> CheckMode {
        self.mode
    }

    /// Decide whether `task` needs to execute.
    ///
    /// A file dependency that does not exist is an error: nothing can produce
    /// it any more at this point, since producing tasks run first.
    pub fn check(&self, task: &Task) -> Result<Staleness> {
        if task.is_group() {
            return Ok(Staleness::UpToDate);
        }

        for dep in &task.file_deps {
            if !self.fs.exists(dep) {
                return Err(PipelineError::MissingDependency {
                    task: task.name.clone(),
                    path: dep.clone(),
                });
            }
        }

        if task.targets.is_empty() {
            return Ok(Staleness::Stale(StaleReason::NoTargets));
        }

        if let Some(missing) = task.targets.iter().find(|t| !self.fs.exists(t)) {
            return Ok(Staleness::Stale(StaleReason::MissingTarget(missing.clone())));
        }

        let staleness = match self.mode {
            CheckMode::Mtime => self.check_mtime(task)?,
            CheckMode::Hash => self.check_hash(task)?,
        };
        debug!(task = %task.name, ?staleness, "up-to-date check");
        Ok(staleness)
    }

    /// Remember the state of the task's dependencies after it succeeded.
    pub fn record_success(&self, task: &Task) -> Result<()> {
        if self.mode != CheckMode::Hash || task.is_group() {
            return Ok(());
        }
        let hash = compute_hash_for_paths(self.fs.as_ref(), &task.file_deps)?;
        self.lock_store()?.save(&task.name, &hash)?;
        Ok(())
    }

    /// Forget what was recorded for `task` (after its targets were cleaned).
    pub fn forget(&self, task: &str) -> Result<()> {
        if self.mode != CheckMode::Hash {
            return Ok(());
        }
        self.lock_store()?.remove(task)?;
        Ok(())
    }

    /// Drop stored hashes of tasks that no longer exist.
    pub fn prune(&self, active_tasks: &[&str]) -> Result<()> {
        if self.mode != CheckMode::Hash {
            return Ok(());
        }
        self.lock_store()?.prune(active_tasks)?;
        Ok(())
    }

    fn check_mtime(&self, task: &Task) -> Result<Staleness> {
        let mut oldest_target: Option<SystemTime> = None;
        for target in &task.targets {
            let mtime = self.fs.modified(target)?;
            oldest_target = Some(match oldest_target {
                Some(t) if t <= mtime => t,
                _ => mtime,
            });
        }

        let Some(oldest_target) = oldest_target else {
            return Ok(Staleness::Stale(StaleReason::NoTargets));
        };

        for dep in &task.file_deps {
            // Directories carry no meaningful modification time here.
            if !self.fs.is_file(dep) {
                continue;
            }
            if self.fs.modified(dep)? > oldest_target {
                return Ok(Staleness::Stale(StaleReason::NewerDependency(dep.clone())));
            }
        }

        Ok(Staleness::UpToDate)
    }

    fn check_hash(&self, task: &Task) -> Result<Staleness> {
        let current = compute_hash_for_paths(self.fs.as_ref(), &task.file_deps)?;
        let stored = self.lock_store()?.load(&task.name)?;

        Ok(match stored {
            None => Staleness::Stale(StaleReason::NeverRecorded),
            Some(h) if h == current => Staleness::UpToDate,
            Some(_) => Staleness::Stale(StaleReason::HashChanged),
        })
    }

    fn lock_store(&self) -> Result<std::sync::MutexGuard<'_, Box<dyn HashStore>>> {
        self.store
            .lock()
            .map_err(|_| anyhow!("hash store lock poisoned").into())
    }
}
