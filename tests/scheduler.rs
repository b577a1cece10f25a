use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fastpipe::dag::{Scheduler, TaskRunState};
use fastpipe::engine::{CoreRuntime, Runtime, RuntimeEvent, TaskOutcome};
use fastpipe::errors::PipelineError;
use fastpipe::tasks::{CommandSpec, Task};
use fastpipe_test_utils::fake_executor::FakeExecutor;
use fastpipe_test_utils::init_tracing;
use proptest::prelude::*;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn task(name: &str, deps: &[&str]) -> Task {
    deps.iter().fold(
        Task::new(name).command(CommandSpec::new("echo").arg(name)),
        |t, d| t.task_dep(*d),
    )
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn chain_runs_one_task_at_a_time() {
    let mut s = Scheduler::from_tasks(vec![task("a", &[]), task("b", &["a"]), task("c", &["b"])]).unwrap();

    let step = s.start_run(&[]).unwrap();
    assert_eq!(step.scheduled_names(), vec!["a"]);
    assert_eq!(s.run_state_of("b"), Some(TaskRunState::Pending));

    let step = s.step_completion("a", TaskOutcome::Success);
    assert_eq!(step.scheduled_names(), vec!["b"]);

    // Up-to-date counts as success for dependents.
    let step = s.step_completion("b", TaskOutcome::UpToDate);
    assert_eq!(step.scheduled_names(), vec!["c"]);

    let step = s.step_completion("c", TaskOutcome::Success);
    assert!(step.run_just_finished);
    assert!(s.is_idle());
}

#[test]
fn failure_blocks_transitive_dependents_only() {
    let mut s = Scheduler::from_tasks(vec![
        task("a", &[]),
        task("b", &["a"]),
        task("c", &["b"]),
        task("x", &[]),
    ])
    .unwrap();

    let step = s.start_run(&[]).unwrap();
    assert_eq!(step.scheduled_names(), vec!["a", "x"]);

    let step = s.step_completion("a", TaskOutcome::Failed(3));
    assert_eq!(step.newly_failed, names(&["a"]));
    let mut blocked = step.newly_blocked.clone();
    blocked.sort();
    assert_eq!(blocked, names(&["b", "c"]));
    assert!(!step.run_just_finished);

    let step = s.step_completion("x", TaskOutcome::Success);
    assert!(step.run_just_finished);
    assert_eq!(s.last_run_succeeded("a"), Some(false));
    assert_eq!(s.last_run_succeeded("x"), Some(true));
}

#[test]
fn selection_pulls_in_upstream_but_not_siblings() {
    let mut s = Scheduler::from_tasks(vec![
        task("a", &[]),
        task("b", &["a"]),
        task("sibling", &["a"]),
    ])
    .unwrap();

    s.start_run(&names(&["b"])).unwrap();
    let mut in_run = s.tasks_in_current_run();
    in_run.sort();
    assert_eq!(in_run, names(&["a", "b"]));
    assert_eq!(s.run_state_of("sibling"), Some(TaskRunState::NotInRun));
}

#[test]
fn unknown_selection_is_rejected_before_anything_changes() {
    let mut s = Scheduler::from_tasks(vec![task("a", &[])]).unwrap();
    let err = s.start_run(&names(&["missing"])).unwrap_err();
    assert!(matches!(err, PipelineError::TaskNotFound(ref n) if n == "missing"));
    assert!(s.is_idle());
}

#[test]
fn history_survives_extension() {
    let mut s = Scheduler::from_tasks(vec![task("a", &[]), task("bad", &[])]).unwrap();
    s.start_run(&[]).unwrap();
    s.step_completion("a", TaskOutcome::Success);
    s.step_completion("bad", TaskOutcome::Failed(1));
    assert!(s.is_idle());

    s.extend(vec![task("b", &["a"]), task("c", &["bad"])]).unwrap();

    let step = s.start_run(&names(&["b", "c"])).unwrap();
    assert_eq!(step.scheduled_names(), vec!["b"]);
    assert_eq!(step.newly_blocked, names(&["c"]));
    assert_eq!(s.run_state_of("a"), Some(TaskRunState::NotInRun));
}

#[test]
fn extending_during_a_run_is_refused() {
    let mut s = Scheduler::from_tasks(vec![task("a", &[])]).unwrap();
    s.start_run(&[]).unwrap();
    assert!(s.extend(vec![task("b", &[])]).is_err());
}

#[test]
fn completion_of_a_task_that_is_not_running_is_ignored() {
    let mut s = Scheduler::from_tasks(vec![task("a", &[]), task("b", &["a"])]).unwrap();
    s.start_run(&[]).unwrap();

    let step = s.step_completion("b", TaskOutcome::Success);
    assert!(step.newly_scheduled.is_empty());
    assert_eq!(s.run_state_of("b"), Some(TaskRunState::Pending));
}

#[test]
fn abort_returns_unfinished_tasks() {
    let mut s = Scheduler::from_tasks(vec![task("a", &[]), task("b", &["a"])]).unwrap();
    s.start_run(&[]).unwrap();

    let mut unfinished = s.abort_run();
    unfinished.sort();
    assert_eq!(unfinished, names(&["a", "b"]));
    assert!(s.is_idle());
    assert_eq!(s.last_run_succeeded("a"), None);
}

async fn run_with_fake(tasks: Vec<Task>, failing: &[(&str, i32)]) -> (fastpipe::engine::RunReport, Vec<String>) {
    let scheduler = Scheduler::from_tasks(tasks).unwrap();
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = failing
        .iter()
        .fold(FakeExecutor::new(rt_tx, Arc::clone(&executed)), |e, (t, c)| e.failing(t, *c));

    let mut runtime = Runtime::new(CoreRuntime::new(scheduler), rt_rx, executor);

    let report = match timeout(Duration::from_secs(3), runtime.run_phase(&[])).await {
        Ok(result) => result.unwrap(),
        Err(_) => panic!("runtime did not finish within 3 seconds"),
    };

    let executed = executed.lock().unwrap().clone();
    (report.sorted(), executed)
}

#[tokio::test]
async fn runtime_with_fake_executor_runs_diamond() {
    init_tracing();

    let (report, executed) = run_with_fake(
        vec![
            task("a", &[]),
            task("b", &["a"]),
            task("c", &["a"]),
            task("d", &["b", "c"]),
        ],
        &[],
    )
    .await;

    assert_eq!(executed.first().map(String::as_str), Some("a"));
    assert_eq!(executed.last().map(String::as_str), Some("d"));
    assert_eq!(report.executed, names(&["a", "b", "c", "d"]));
    assert!(report.is_success());
}

#[tokio::test]
async fn runtime_completes_groups_without_dispatching_them() {
    init_tracing();

    let (report, executed) = run_with_fake(
        vec![
            task("a:1", &[]),
            task("a:2", &[]),
            Task::group("a", names(&["a:1", "a:2"])),
            task("after", &["a"]),
        ],
        &[],
    )
    .await;

    assert!(!executed.iter().any(|n| n == "a"));
    assert_eq!(executed.last().map(String::as_str), Some("after"));
    assert_eq!(report.executed, names(&["a:1", "a:2", "after"]));
}

#[tokio::test]
async fn runtime_reports_failures_and_blocked_tasks() {
    init_tracing();

    let (report, executed) = run_with_fake(
        vec![task("a", &[]), task("b", &["a"]), task("x", &[])],
        &[("a", 4)],
    )
    .await;

    assert_eq!(report.failed, names(&["a"]));
    assert_eq!(report.blocked, names(&["b"]));
    assert_eq!(report.executed, names(&["x"]));
    assert!(!executed.iter().any(|n| n == "b"));
    assert!(!report.is_success());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn scheduler_always_terminates_and_respects_dependencies(
        num_tasks in 1usize..12,
        edge_bits in proptest::collection::vec(any::<bool>(), 66),
        failing_bits in proptest::collection::vec(any::<bool>(), 12),
    ) {
        let task_names: Vec<String> = (0..num_tasks).map(|i| format!("t{i:02}")).collect();

        // Edges only point from lower to higher index, so the graph is acyclic.
        let mut bit = 0;
        let mut tasks = Vec::new();
        for (j, name) in task_names.iter().enumerate() {
            let mut t = Task::new(name.clone()).command(CommandSpec::new("echo"));
            for dep in task_names.iter().take(j) {
                if edge_bits[bit % edge_bits.len()] {
                    t = t.task_dep(dep.clone());
                }
                bit += 1;
            }
            tasks.push(t);
        }
        let deps_of: Vec<Vec<String>> = tasks.iter().map(|t| t.task_deps.clone()).collect();

        let failing: HashSet<String> = task_names
            .iter()
            .enumerate()
            .filter(|(i, _)| failing_bits[*i])
            .map(|(_, n)| n.clone())
            .collect();

        let mut scheduler = Scheduler::from_tasks(tasks).unwrap();
        let mut executing: Vec<String> = scheduler
            .start_run(&[])
            .unwrap()
            .newly_scheduled
            .into_iter()
            .map(|t| t.name().to_string())
            .collect();

        let mut finished_ok: HashSet<String> = HashSet::new();
        let mut steps = 0;

        while let Some(name) = executing.pop() {
            steps += 1;
            prop_assert!(steps <= num_tasks, "a task was scheduled twice");

            let index = task_names.iter().position(|n| *n == name).unwrap();
            for dep in &deps_of[index] {
                prop_assert!(finished_ok.contains(dep), "{} ran before {}", name, dep);
            }

            let outcome = if failing.contains(&name) {
                TaskOutcome::Failed(1)
            } else {
                finished_ok.insert(name.clone());
                TaskOutcome::Success
            };

            for st in scheduler.step_completion(&name, outcome).newly_scheduled {
                executing.push(st.name().to_string());
            }
        }

        prop_assert!(scheduler.is_idle(), "run did not finish: {:?}", scheduler.tasks_in_current_run());

        for name in &task_names {
            let state = scheduler.last_run_succeeded(name);
            prop_assert!(state.is_some(), "{} never reached a terminal state", name);
        }
    }
}
