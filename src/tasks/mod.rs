// src/tasks/mod.rs

//! Task model and task generators.
//!
//! A [`Task`] is rebuilt from the directory tree on every invocation; nothing
//! about it is persisted except the files it reads and writes. Each
//! [`TaskGenerator`] produces the tasks of one family (wind files, seeds,
//! controller build, input preparation, simulation runs).
//!
//! - [`scan`] lists directories the way the generators need them.
//! - [`scenario`] classifies scenario directories and their variants.

pub mod controller;
pub mod fast_input;
pub mod openfast;
pub mod scan;
pub mod scenario;
pub mod wind_files;
pub mod wind_seeds;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::fs::{normalize_path, FileSystem};
use crate::rewrite::SubstitutionRule;

/// Canonical task name type: `basename:sub[:sub...]`.
pub type TaskName = String;

/// Separator between the levels of a task name.
pub const NAME_SEPARATOR: char = ':';

/// Build a hierarchical task name from its parts.
pub fn task_name<I, S>(parts: I) -> TaskName
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|p| p.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(&NAME_SEPARATOR.to_string())
}

/// Generator basename of a task name (`openfast` for `openfast:a:b`).
pub fn basename_of(name: &str) -> &str {
    name.split(NAME_SEPARATOR).next().unwrap_or(name)
}

/// An external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; the process inherits ours when `None`.
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(normalize_path(dir.as_ref()));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        if let Some(cwd) = &self.cwd {
            write!(f, " (in {})", cwd.display())?;
        }
        Ok(())
    }
}

/// One step of a task. Actions run in order; the first failure fails the task.
#[derive(Debug, Clone)]
pub enum Action {
    /// Run an external program.
    Command(CommandSpec),
    /// Copy `source` to `target` applying substitution rules.
    Rewrite {
        source: PathBuf,
        target: PathBuf,
        rules: Vec<SubstitutionRule>,
    },
    /// Create a directory (and parents) if missing.
    EnsureDir(PathBuf),
    /// Fail without running anything; the task's inputs could not be
    /// resolved while generating it.
    Fail(String),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Command(spec) => write!(f, "{spec}"),
            Action::Rewrite { source, target, rules } => write!(
                f,
                "rewrite {} -> {} ({} rule(s))",
                source.display(),
                target.display(),
                rules.len()
            ),
            Action::EnsureDir(dir) => write!(f, "mkdir -p {}", dir.display()),
            Action::Fail(reason) => write!(f, "fail: {reason}"),
        }
    }
}

/// What `clean` does for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanAction {
    /// Delete every declared target that exists.
    RemoveTargets,
    /// Delete a directory tree.
    RemoveDir(PathBuf),
}

/// A unit of work for the engine.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: TaskName,
    /// Files whose change makes the task stale.
    pub file_deps: Vec<PathBuf>,
    /// Files the task produces. No two tasks may share a target.
    pub targets: Vec<PathBuf>,
    pub actions: Vec<Action>,
    pub clean: Vec<CleanAction>,
    /// Tasks that must succeed first, independent of files.
    pub task_deps: Vec<TaskName>,
}

impl Task {
    pub fn new(name: impl Into<TaskName>) -> Self {
        Self {
            name: name.into(),
            file_deps: Vec::new(),
            targets: Vec::new(),
            actions: Vec::new(),
            clean: vec![CleanAction::RemoveTargets],
            task_deps: Vec::new(),
        }
    }

    /// A task without actions that only waits for `children`.
    pub fn group<I>(name: impl Into<TaskName>, children: I) -> Self
    where
        I: IntoIterator<Item = TaskName>,
    {
        let mut task = Self::new(name);
        task.task_deps = children.into_iter().collect();
        task.clean.clear();
        task
    }

    pub fn file_dep(mut self, path: impl AsRef<Path>) -> Self {
        self.file_deps.push(normalize_path(path.as_ref()));
        self
    }

    pub fn file_deps<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.file_deps
            .extend(paths.into_iter().map(|p| normalize_path(p.as_ref())));
        self
    }

    pub fn target(mut self, path: impl AsRef<Path>) -> Self {
        self.targets.push(normalize_path(path.as_ref()));
        self
    }

    pub fn targets<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.targets
            .extend(paths.into_iter().map(|p| normalize_path(p.as_ref())));
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn command(self, spec: CommandSpec) -> Self {
        self.action(Action::Command(spec))
    }

    pub fn rewrite(
        self,
        source: impl AsRef<Path>,
        target: impl AsRef<Path>,
        rules: Vec<SubstitutionRule>,
    ) -> Self {
        self.action(Action::Rewrite {
            source: normalize_path(source.as_ref()),
            target: normalize_path(target.as_ref()),
            rules,
        })
    }

    /// Replace the default clean behaviour (remove targets).
    pub fn clean_with(mut self, clean: Vec<CleanAction>) -> Self {
        self.clean = clean;
        self
    }

    pub fn task_dep(mut self, name: impl Into<TaskName>) -> Self {
        self.task_deps.push(name.into());
        self
    }

    /// Group tasks have nothing to execute.
    pub fn is_group(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn basename(&self) -> &str {
        basename_of(&self.name)
    }

    /// Reason recorded by an [`Action::Fail`], if any.
    pub fn generation_error(&self) -> Option<&str> {
        self.actions.iter().find_map(|action| match action {
            Action::Fail(reason) => Some(reason.as_str()),
            _ => None,
        })
    }
}

/// Everything a generator may look at.
#[derive(Debug, Clone, Copy)]
pub struct GenContext<'a> {
    pub fs: &'a dyn FileSystem,
    pub root: &'a Path,
    pub cfg: &'a ConfigFile,
}

impl<'a> GenContext<'a> {
    pub fn new(fs: &'a dyn FileSystem, root: &'a Path, cfg: &'a ConfigFile) -> Self {
        Self { fs, root, cfg }
    }

    pub fn simulations_dir(&self) -> PathBuf {
        normalize_path(&self.root.join(&self.cfg.paths().simulations))
    }

    pub fn wind_dir(&self) -> PathBuf {
        normalize_path(&self.root.join(&self.cfg.paths().wind))
    }

    pub fn controller_dir(&self) -> PathBuf {
        normalize_path(&self.root.join(&self.cfg.paths().controller))
    }

    pub fn runs_dir(&self) -> PathBuf {
        normalize_path(&self.root.join(&self.cfg.paths().runs))
    }

    /// `runs/wind_seeds`: seed-specific turbulence inputs and their output.
    pub fn wind_seeds_dir(&self) -> PathBuf {
        self.runs_dir().join(wind_seeds::WIND_SEEDS_DIR)
    }
}

/// Produces the tasks of one family from the current directory tree.
pub trait TaskGenerator: Send + Sync {
    /// First component of every task name this generator produces.
    fn basename(&self) -> &'static str;

    /// Basename of a generator whose tasks must have been processed before
    /// this one looks at the tree, because it enumerates what they produce.
    fn created_after(&self) -> Option<&'static str> {
        None
    }

    fn generate(&self, ctx: &GenContext<'_>) -> Result<Vec<Task>>;
}

/// Generate tasks and append the basename group task that depends on all of
/// them.
pub fn generate_with_group(
    generator: &dyn TaskGenerator,
    ctx: &GenContext<'_>,
) -> Result<Vec<Task>> {
    let mut tasks = generator.generate(ctx)?;
    let children: Vec<TaskName> = tasks.iter().map(|t| t.name.clone()).collect();
    tasks.push(Task::group(generator.basename(), children));
    Ok(tasks)
}

/// The generators of the simulation campaign, in declaration order.
pub fn default_generators() -> Vec<Box<dyn TaskGenerator>> {
    vec![
        Box::new(wind_files::SinusoidalWindFiles),
        Box::new(wind_seeds::PrepareWindInput),
        Box::new(wind_seeds::Turbsim),
        Box::new(controller::PrepareDisconCompilation),
        Box::new(controller::CompileDiscon),
        Box::new(fast_input::PrepareFastInput),
        Box::new(openfast::OpenFast),
    ]
}
