use std::path::{Path, PathBuf};
use std::sync::Arc;

use fastpipe::check::hash::compute_file_hash;
use fastpipe::check::{
    compute_hash_for_paths, FileHashStore, HashStore, MemoryHashStore, StaleReason, Staleness,
    UpToDateChecker,
};
use fastpipe::errors::PipelineError;
use fastpipe::fs::mock::MockFileSystem;
use fastpipe::fs::FileSystem;
use fastpipe::tasks::{CommandSpec, Task};
use fastpipe::types::{CheckMode, HashStorageMode};

fn sim_task() -> Task {
    Task::new("openfast:a:ws8.0:main")
        .file_dep("runs/a/main.fst")
        .file_dep("runs/a/inflow.dat")
        .target("runs/a/main.out")
        .command(CommandSpec::new("openfast").arg("runs/a/main.fst"))
}

fn checker(fs: &MockFileSystem, mode: CheckMode) -> UpToDateChecker {
    UpToDateChecker::new(Arc::new(fs.clone()), mode, Box::new(MemoryHashStore::new()))
}

#[test]
fn mock_fs_hashing_matches_blake3() {
    let fs = MockFileSystem::new();
    fs.add_file("test.txt", b"hello world".to_vec());

    let hash = compute_file_hash(&fs, Path::new("test.txt")).unwrap();
    assert_eq!(hash, "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24");
}

#[test]
fn aggregate_hash_ignores_order_but_not_names() {
    let fs = MockFileSystem::new();
    fs.add_file("a", "1");
    fs.add_file("b", "2");
    fs.add_file("c", "1");

    let ab = compute_hash_for_paths(&fs, ["a", "b"]).unwrap();
    let ba = compute_hash_for_paths(&fs, ["b", "a", "a"]).unwrap();
    let cb = compute_hash_for_paths(&fs, ["c", "b"]).unwrap();
    assert_eq!(ab, ba);
    assert_ne!(ab, cb);
}

#[test]
fn missing_target_is_stale_and_missing_dependency_is_an_error() {
    let fs = MockFileSystem::new();
    fs.add_file("runs/a/main.fst", "run");
    fs.add_file("runs/a/inflow.dat", "wind");
    let checker = checker(&fs, CheckMode::Mtime);

    assert_eq!(
        checker.check(&sim_task()).unwrap(),
        Staleness::Stale(StaleReason::MissingTarget(PathBuf::from("runs/a/main.out")))
    );

    fs.remove_file(Path::new("runs/a/inflow.dat")).unwrap();
    match checker.check(&sim_task()) {
        Err(PipelineError::MissingDependency { task, path }) => {
            assert_eq!(task, "openfast:a:ws8.0:main");
            assert_eq!(path, PathBuf::from("runs/a/inflow.dat"));
        }
        other => panic!("expected MissingDependency, got {other:?}"),
    }
}

#[test]
fn mtime_mode_compares_against_the_oldest_target() {
    let fs = MockFileSystem::new();
    fs.add_file("runs/a/main.fst", "run");
    fs.add_file("runs/a/inflow.dat", "wind");
    fs.add_file("runs/a/main.out", "result");
    let checker = checker(&fs, CheckMode::Mtime);

    assert_eq!(checker.check(&sim_task()).unwrap(), Staleness::UpToDate);

    fs.touch("runs/a/inflow.dat");
    assert_eq!(
        checker.check(&sim_task()).unwrap(),
        Staleness::Stale(StaleReason::NewerDependency(PathBuf::from("runs/a/inflow.dat")))
    );
}

#[test]
fn hash_mode_needs_a_recorded_success() {
    let fs = MockFileSystem::new();
    fs.add_file("runs/a/main.fst", "run");
    fs.add_file("runs/a/inflow.dat", "wind");
    fs.add_file("runs/a/main.out", "result");
    let checker = checker(&fs, CheckMode::Hash);
    let task = sim_task();

    assert_eq!(
        checker.check(&task).unwrap(),
        Staleness::Stale(StaleReason::NeverRecorded)
    );

    checker.record_success(&task).unwrap();
    assert_eq!(checker.check(&task).unwrap(), Staleness::UpToDate);

    fs.touch("runs/a/inflow.dat");
    assert_eq!(checker.check(&task).unwrap(), Staleness::UpToDate);

    fs.add_file("runs/a/inflow.dat", "gusty wind");
    assert_eq!(
        checker.check(&task).unwrap(),
        Staleness::Stale(StaleReason::HashChanged)
    );

    checker.record_success(&task).unwrap();
    checker.forget(&task.name).unwrap();
    assert_eq!(
        checker.check(&task).unwrap(),
        Staleness::Stale(StaleReason::NeverRecorded)
    );
}

#[test]
fn tasks_without_targets_always_run_and_groups_never_do() {
    let fs = MockFileSystem::new();
    let checker = checker(&fs, CheckMode::Mtime);

    let no_targets = Task::new("echo:x").command(CommandSpec::new("echo"));
    assert_eq!(
        checker.check(&no_targets).unwrap(),
        Staleness::Stale(StaleReason::NoTargets)
    );

    let group = Task::group("echo", vec!["echo:x".to_string()]);
    assert!(checker.check(&group).unwrap().is_up_to_date());
}

#[test]
fn file_store_persists_through_the_filesystem() {
    let fs = MockFileSystem::new();
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());

    let mut store = FileHashStore::new(Arc::clone(&shared), Path::new("."));
    store.save("b:task", "bbb").unwrap();
    store.save("a:task", "aaa").unwrap();

    assert_eq!(
        fs.read_to_string(Path::new(".fastpipe/hashes")).unwrap(),
        "a:task aaa\nb:task bbb\n"
    );

    let reopened = FileHashStore::new(shared, Path::new("."));
    assert_eq!(reopened.load("a:task").unwrap().as_deref(), Some("aaa"));
    assert_eq!(reopened.load("c:task").unwrap(), None);

    store.prune(&["b:task"]).unwrap();
    assert_eq!(store.load("a:task").unwrap(), None);
    assert_eq!(store.load("b:task").unwrap().as_deref(), Some("bbb"));

    store.remove("b:task").unwrap();
    assert_eq!(fs.read_to_string(Path::new(".fastpipe/hashes")).unwrap(), "");
}

#[test]
fn file_store_keeps_task_names_with_spaces() {
    let fs = MockFileSystem::new();
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());

    let mut store = FileHashStore::new(Arc::clone(&shared), Path::new("."));
    store.save("prepare_fast_input:steady_wind calm", "abc123").unwrap();
    store.save("openfast:steady_wind calm:ws8.0:main", "def456").unwrap();

    let reopened = FileHashStore::new(shared, Path::new("."));
    assert_eq!(
        reopened.load("prepare_fast_input:steady_wind calm").unwrap().as_deref(),
        Some("abc123")
    );
    assert_eq!(
        reopened.load("openfast:steady_wind calm:ws8.0:main").unwrap().as_deref(),
        Some("def456")
    );
    assert_eq!(reopened.load("prepare_fast_input:steady_wind").unwrap(), None);
}

#[test]
fn storage_mode_selects_the_store() {
    let fs = MockFileSystem::new();
    fs.add_file("in.dat", "x");
    fs.add_file("out.dat", "y");
    let task = Task::new("t:1")
        .file_dep("in.dat")
        .target("out.dat")
        .command(CommandSpec::new("true"));

    let memory = UpToDateChecker::with_storage(
        Arc::new(fs.clone()),
        CheckMode::Hash,
        HashStorageMode::Memory,
        Path::new("."),
    );
    memory.record_success(&task).unwrap();
    assert!(!fs.exists(Path::new(".fastpipe/hashes")));

    let file = UpToDateChecker::with_storage(
        Arc::new(fs.clone()),
        CheckMode::Hash,
        HashStorageMode::File,
        Path::new("."),
    );
    file.record_success(&task).unwrap();
    assert!(fs.exists(Path::new(".fastpipe/hashes")));
    assert_eq!(file.mode(), CheckMode::Hash);
}
