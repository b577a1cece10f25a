mod common;

use std::path::PathBuf;

use common::*;
use fastpipe::clean::{clean, Removed};
use fastpipe::errors::PipelineError;
use fastpipe::types::{CheckMode, HashStorageMode};
use fastpipe_test_utils::builders::{ConfigFileBuilder, ProjectFixture};
use fastpipe_test_utils::fake_executor::FakeCommandRunner;
use fastpipe_test_utils::{init_tracing, project, run_pipeline};

async fn built_fixture() -> (ProjectFixture, FakeCommandRunner) {
    let fixture = ProjectFixture::standard();
    let cfg = ConfigFileBuilder::new().build();
    let runner = FakeCommandRunner::new(fixture.fs());
    let report = run_pipeline(&fixture, &cfg, &runner, &[]).await.unwrap();
    assert!(report.is_success(), "{report:?}");
    runner.clear();
    (fixture, runner)
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn clean_all_removes_generated_files_and_keeps_templates() -> TestResult {
    init_tracing();
    let (fixture, runner) = built_fixture().await;
    let cfg = ConfigFileBuilder::new().build();

    let project = project(&fixture, cfg.clone());
    let plan = project.plan()?;
    let removed = clean(project.fs().as_ref(), &plan, &[], None, false)?;
    assert!(!removed.is_empty());

    assert!(!fixture.exists("runs/steady_wind/ws8.0"));
    assert!(!fixture.exists("runs/wind_seeds/90m_12mps_twr_seed00.inp"));
    assert!(!fixture.exists("runs/wind_seeds/90m_12mps_twr_seed00.bts"));
    assert!(!fixture.exists("controller/ROSCO/build"));
    assert!(!fixture.exists("simulations/sinusoidal_gust/wind_8ms_1ms_1rads.wnd"));

    assert!(fixture.exists("simulations/steady_wind/main.fst"));
    assert!(fixture.exists("simulations/sinusoidal_gust/generate_inflow_gust.py"));
    assert!(fixture.exists("wind/90m_12mps_twr.inp"));
    assert!(fixture.exists("controller/ROSCO/CMakeLists.txt"));

    // Everything has to be rebuilt afterwards.
    let report = run_pipeline(&fixture, &cfg, &runner, &[]).await?;
    assert_eq!(report.executed.len(), 15);
    assert!(report.up_to_date.is_empty());
    Ok(())
}

#[tokio::test]
async fn dry_run_only_reports() -> TestResult {
    init_tracing();
    let (fixture, _runner) = built_fixture().await;

    let project = project(&fixture, ConfigFileBuilder::new().build());
    let plan = project.plan()?;
    let before = fixture.mock().files();

    let removed = clean(project.fs().as_ref(), &plan, &[], None, true)?;

    assert!(removed.contains(&Removed::Dir(PathBuf::from("runs/steady_wind/ws8.0"))));
    assert!(removed.contains(&Removed::File(PathBuf::from("runs/steady_wind/ws8.0/main.out"))));
    assert!(removed.contains(&Removed::Dir(PathBuf::from("controller/ROSCO/build"))));
    assert_eq!(fixture.mock().files(), before);
    Ok(())
}

#[tokio::test]
async fn simulations_are_cleaned_before_their_inputs() -> TestResult {
    init_tracing();
    let (fixture, _runner) = built_fixture().await;

    let project = project(&fixture, ConfigFileBuilder::new().build());
    let plan = project.plan()?;
    let removed = clean(project.fs().as_ref(), &plan, &[], None, true)?;

    let pos = |r: Removed| removed.iter().position(|x| *x == r).unwrap();
    assert!(
        pos(Removed::File(PathBuf::from("runs/steady_wind/ws8.0/main.out")))
            < pos(Removed::Dir(PathBuf::from("runs/steady_wind/ws8.0")))
    );
    assert!(
        pos(Removed::File(PathBuf::from("controller/ROSCO/build/DISCON.dll")))
            < pos(Removed::Dir(PathBuf::from("controller/ROSCO/build")))
    );
    Ok(())
}

#[tokio::test]
async fn cleaning_a_group_touches_only_its_members() -> TestResult {
    init_tracing();
    let (fixture, runner) = built_fixture().await;
    let cfg = ConfigFileBuilder::new().build();

    let project = project(&fixture, cfg.clone());
    let plan = project.plan()?;
    let removed = clean(project.fs().as_ref(), &plan, &names(&["openfast"]), None, false)?;

    assert_eq!(removed.len(), 6);
    assert!(removed.iter().all(|r| matches!(r, Removed::File(p) if p.extension().is_some_and(|e| e == "out"))));
    assert!(fixture.exists("runs/steady_wind/ws8.0/main.fst"));
    assert!(!fixture.exists("runs/steady_wind/ws8.0/main.out"));

    let report = run_pipeline(&fixture, &cfg, &runner, &[]).await?;
    assert_eq!(runner.calls_of("openfast").len(), 6);
    assert_eq!(runner.invocations().len(), 6);
    assert_eq!(report.executed.len(), 6);
    Ok(())
}

#[tokio::test]
async fn clean_forgets_recorded_hashes() -> TestResult {
    init_tracing();

    let fixture = ProjectFixture::standard();
    let cfg = ConfigFileBuilder::new()
        .check(CheckMode::Hash)
        .hash_storage(HashStorageMode::File)
        .build();
    let runner = FakeCommandRunner::new(fixture.fs());
    run_pipeline(&fixture, &cfg, &runner, &[]).await?;

    let project = project(&fixture, cfg.clone());
    let plan = project.plan()?;
    let checker = project.checker();
    clean(
        project.fs().as_ref(),
        &plan,
        &names(&["prepare_wind_input:90m_12mps_twr"]),
        Some(&checker),
        false,
    )?;

    let hashes = fixture.read(".fastpipe/hashes");
    assert!(!hashes.contains("prepare_wind_input:90m_12mps_twr "));
    assert!(hashes.contains("turbsim:90m_12mps_twr_seed00 "));
    Ok(())
}

#[tokio::test]
async fn unknown_task_cannot_be_cleaned() -> TestResult {
    init_tracing();
    let fixture = ProjectFixture::standard();
    let project = project(&fixture, ConfigFileBuilder::new().build());
    let plan = project.plan()?;

    let err = clean(project.fs().as_ref(), &plan, &names(&["nope"]), None, false).unwrap_err();
    assert!(matches!(err, PipelineError::TaskNotFound(_)));
    Ok(())
}
