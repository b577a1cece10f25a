use std::io::Write;

use clap::Parser;
use fastpipe::cli::{CliArgs, Command, LogLevel};
use fastpipe::config::{load_and_validate, load_for_project, ConfigFile, RawConfigFile, DEFAULT_CONFIG_FILE};
use fastpipe::errors::PipelineError;
use fastpipe::logging::effective_level;
use fastpipe::types::{CheckMode, HashStorageMode};
use tempfile::{tempdir, NamedTempFile};

fn write_config(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{text}").unwrap();
    file
}

#[test]
fn empty_file_gives_the_campaign_defaults() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.config().check, CheckMode::Mtime);
    assert_eq!(cfg.config().hash_storage, HashStorageMode::File);
    assert_eq!(cfg.config().jobs, 1);
    assert_eq!(cfg.sweep().num_seeds, 1);
    assert_eq!(cfg.sweep().seed_base_offset, 13420);
    assert_eq!(
        cfg.sweep().steady_wind_speeds,
        vec![4.0, 6.0, 8.0, 10.0, 11.5, 12.5, 14.0, 16.0]
    );
    assert_eq!(cfg.sweep().linearised_wind_speeds, vec![8.0]);
    assert_eq!(cfg.sweep().linearised_rotor_speeds, vec![8.5, 9.0, 9.5, 10.0, 10.5]);
    assert_eq!(cfg.paths().runs, "runs");
    assert_eq!(cfg.commands().openfast, "openfast");
    assert_eq!(cfg.controller().library, "DISCON.dll");
}

#[test]
fn sections_override_defaults() {
    let file = write_config(
        r#"
[config]
check = "hash"
hash_storage = "memory"
jobs = 8

[paths]
runs = "output"

[sweep]
num_seeds = 6
steady_wind_speeds = [5, 7.5]

[commands]
openfast = "/opt/openfast/bin/openfast"
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.config().check, CheckMode::Hash);
    assert_eq!(cfg.config().hash_storage, HashStorageMode::Memory);
    assert_eq!(cfg.config().jobs, 8);
    assert_eq!(cfg.paths().runs, "output");
    assert_eq!(cfg.paths().simulations, "simulations");
    assert_eq!(cfg.sweep().num_seeds, 6);
    assert_eq!(cfg.sweep().steady_wind_speeds, vec![5.0, 7.5]);
    assert_eq!(cfg.commands().openfast, "/opt/openfast/bin/openfast");
    assert_eq!(cfg.commands().turbsim, "turbsim");
}

#[test]
fn zero_jobs_is_a_config_error() {
    let file = write_config("[config]\njobs = 0\n");
    match load_and_validate(file.path()) {
        Err(PipelineError::ConfigError(msg)) => assert!(msg.contains("jobs")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn unknown_check_mode_is_a_toml_error() {
    let file = write_config("[config]\ncheck = \"timestamp\"\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(PipelineError::TomlError(_))
    ));
}

#[test]
fn speeds_that_share_a_label_are_rejected() {
    let file = write_config("[sweep]\nsteady_wind_speeds = [8.0, 8.04]\n");
    match load_and_validate(file.path()) {
        Err(PipelineError::ConfigError(msg)) => {
            assert!(msg.contains("steady_wind_speeds"));
            assert!(msg.contains("8.0"));
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn non_positive_speed_is_rejected() {
    let mut raw = RawConfigFile::default();
    raw.sweep.linearised_rotor_speeds = vec![0.0];
    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(PipelineError::ConfigError(_))
    ));
}

#[test]
fn absolute_paths_and_empty_names_are_rejected() {
    let mut raw = RawConfigFile::default();
    raw.paths.runs = "/tmp/runs".to_string();
    assert!(ConfigFile::try_from(raw).is_err());

    let mut raw = RawConfigFile::default();
    raw.commands.make = "  ".to_string();
    assert!(ConfigFile::try_from(raw).is_err());
}

#[test]
fn seed_offset_overflow_is_rejected() {
    let mut raw = RawConfigFile::default();
    raw.sweep.seed_base_offset = u64::MAX;
    raw.sweep.num_seeds = 1;
    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(PipelineError::ConfigError(_))
    ));
}

#[test]
fn project_config_is_optional_but_explicit_config_is_not() {
    let dir = tempdir().unwrap();

    let cfg = load_for_project(dir.path(), None).unwrap();
    assert_eq!(cfg.config().jobs, 1);

    std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[config]\njobs = 3\n").unwrap();
    let cfg = load_for_project(dir.path(), None).unwrap();
    assert_eq!(cfg.config().jobs, 3);

    let missing = dir.path().join("elsewhere.toml");
    assert!(matches!(
        load_for_project(dir.path(), Some(&missing)),
        Err(PipelineError::IoError(_))
    ));
}

#[test]
fn jobs_override_never_drops_below_one() {
    let mut cfg = ConfigFile::default();
    cfg.set_jobs(0);
    assert_eq!(cfg.config().jobs, 1);
    cfg.set_jobs(6);
    assert_eq!(cfg.config().jobs, 6);
}

#[test]
fn cli_defaults_to_running_everything() {
    let args = CliArgs::try_parse_from(["fastpipe"]).unwrap();
    assert!(matches!(args.command(), Command::Run { tasks } if tasks.is_empty()));
    assert_eq!(args.root, std::path::PathBuf::from("."));
    assert!(!args.dry_run);
}

#[test]
fn cli_global_flags_after_subcommand() {
    let args = CliArgs::try_parse_from([
        "fastpipe",
        "clean",
        "openfast:steady_wind",
        "--dry-run",
        "-j",
        "4",
        "--log-level",
        "debug",
    ])
    .unwrap();

    assert!(args.dry_run);
    assert_eq!(args.jobs, Some(4));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(matches!(args.command(), Command::Clean { tasks } if tasks == vec!["openfast:steady_wind".to_string()]));
}

#[test]
fn cli_list_flags() {
    let args = CliArgs::try_parse_from(["fastpipe", "list", "--all", "--status"]).unwrap();
    assert!(matches!(args.command(), Command::List { all: true, status: true }));
}

#[test]
fn log_level_prefers_flag_then_environment() {
    assert_eq!(effective_level(Some(LogLevel::Warn), Some("trace")), tracing::Level::WARN);
    assert_eq!(effective_level(None, Some("debug")), tracing::Level::DEBUG);
    assert_eq!(effective_level(None, Some(" WARNING ")), tracing::Level::WARN);
    assert_eq!(effective_level(None, Some("chatty")), tracing::Level::INFO);
    assert_eq!(effective_level(None, None), tracing::Level::INFO);
}
