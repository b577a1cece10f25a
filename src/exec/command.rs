// src/exec/command.rs

//! External program invocation.
//!
//! Every `Action::Command` goes through a [`CommandRunner`]. Production uses
//! [`ProcessRunner`] (tokio::process); tests substitute a runner that only
//! records invocations and produces targets.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::tasks::{CommandSpec, Task};

/// Number of trailing stderr lines kept for the failure log.
const STDERR_TAIL_LINES: usize = 20;

pub type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>>;

/// Runs one external program to completion and yields its exit code.
///
/// An `Err` means the program could not be run at all (e.g. not found);
/// a program that ran and failed is `Ok` with a non-zero code.
pub trait CommandRunner: Send + Sync {
    fn run<'a>(&'a self, task: &'a Task, spec: &'a CommandSpec) -> RunFuture<'a>;
}

/// Runs programs as child processes. Output is logged line by line at debug
/// level; the tail of stderr is logged again as a warning on failure.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run<'a>(&'a self, task: &'a Task, spec: &'a CommandSpec) -> RunFuture<'a> {
        Box::pin(async move {
            let mut cmd = Command::new(&spec.program);
            cmd.args(&spec.args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            if let Some(cwd) = &spec.cwd {
                cmd.current_dir(cwd);
            }

            let mut child = cmd
                .spawn()
                .with_context(|| format!("spawning `{}` for task '{}'", spec, task.name))?;

            let stdout = child.stdout.take();
            let stderr = child.stderr.take();

            let stdout_task = stdout.map(|out| {
                let name = task.name.clone();
                tokio::spawn(async move {
                    drain_lines(out, &name, "stdout", 0).await;
                })
            });
            let stderr_task = stderr.map(|err| {
                let name = task.name.clone();
                tokio::spawn(async move { drain_lines(err, &name, "stderr", STDERR_TAIL_LINES).await })
            });

            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for `{}` of task '{}'", spec, task.name))?;

            if let Some(handle) = stdout_task {
                let _ = handle.await;
            }
            let tail = match stderr_task {
                Some(handle) => handle.await.unwrap_or_default(),
                None => Vec::new(),
            };

            let code = status.code().unwrap_or(-1);
            if !status.success() {
                for line in &tail {
                    warn!(task = %task.name, "stderr: {}", line);
                }
            }
            Ok(code)
        })
    }
}

/// Read `reader` to the end, logging every line, and return the last
/// `keep` lines.
async fn drain_lines<R>(reader: R, task: &str, stream: &str, keep: usize) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut tail = VecDeque::with_capacity(keep);

    while let Ok(Some(line)) = lines.next_line().await {
        debug!(task = %task, "{}: {}", stream, line);
        if keep > 0 {
            if tail.len() == keep {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    }

    tail.into()
}
