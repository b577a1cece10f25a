// src/exec/executor_loop.rs

//! Main executor loop that manages running tasks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_task;
use crate::exec::ExecContext;

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ScheduledTask>` is what `RealExecutorBackend`
/// forwards scheduled tasks to. Each task runs in its own Tokio task, but
/// at most `ctx.jobs` of them execute at the same time. A task name that is
/// still running is never started a second time.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    ctx: ExecContext,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(64);

    tokio::spawn(async move {
        info!(jobs = ctx.jobs, "executor loop started");

        let permits = Arc::new(Semaphore::new(ctx.jobs.max(1)));
        let mut active: HashMap<String, JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            active.retain(|_, handle| !handle.is_finished());

            let name = task.name().to_string();
            if active.contains_key(&name) {
                warn!(
                    task = %name,
                    run_id = task.run_id,
                    "task already running; ignoring new scheduling request"
                );
                continue;
            }

            let permits = Arc::clone(&permits);
            let ctx = ctx.clone();
            let rt_tx = runtime_tx.clone();
            let spawn_name = name.clone();

            let handle = tokio::spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => {
                        debug!(task = %spawn_name, "executor shutting down; task not started");
                        return;
                    }
                };
                run_task(task, ctx, rt_tx).await;
                debug!(task = %spawn_name, "task runner future finished");
            });

            active.insert(name, handle);
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
