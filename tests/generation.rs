mod common;

use std::path::{Path, PathBuf};

use common::*;
use fastpipe::dag::TaskGraph;
use fastpipe::errors::PipelineError;
use fastpipe::tasks::openfast::OpenFast;
use fastpipe::tasks::scenario::{ScenarioKind, Variant};
use fastpipe::tasks::{Action, CleanAction, CommandSpec, GenContext, Task, TaskGenerator};
use fastpipe_test_utils::builders::{ConfigFileBuilder, ProjectFixture};
use fastpipe_test_utils::project;

fn names(plan: &fastpipe::engine::Plan) -> Vec<String> {
    plan.tasks().map(|t| t.name.clone()).collect()
}

#[test]
fn one_task_per_item_plus_basename_groups() {
    let fixture = ProjectFixture::standard();
    let plan = project(&fixture, ConfigFileBuilder::new().build()).plan().unwrap();
    let names = names(&plan);

    for expected in [
        "sinusoidal_wind_files:sinusoidal_gust",
        "prepare_wind_input:90m_12mps_twr",
        "prepare_discon_compilation:ROSCO",
        "compile_discon:ROSCO",
        "prepare_fast_input:steady_wind",
        "prepare_fast_input:turbulent",
        "prepare_fast_input:linearised_fixed_rotor_speed",
        "prepare_fast_input:sinusoidal_gust",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
    }

    for group in [
        "sinusoidal_wind_files",
        "prepare_wind_input",
        "turbsim",
        "prepare_discon_compilation",
        "compile_discon",
        "prepare_fast_input",
        "openfast",
    ] {
        let task = plan.task(group).unwrap_or_else(|| panic!("missing group {group}"));
        assert!(task.is_group());
    }

    // Nothing has been prepared yet, so the deferred generators see nothing.
    assert!(with_prefix(&names, "openfast:").is_empty());
    assert!(with_prefix(&names, "turbsim:").is_empty());
}

#[test]
fn input_preparation_targets_the_full_cross_product() {
    let fixture = ProjectFixture::standard();
    let plan = project(&fixture, ConfigFileBuilder::new().build()).plan().unwrap();

    let steady = plan.task("prepare_fast_input:steady_wind").unwrap();
    // 2 wind speeds x 5 template files.
    assert_eq!(steady.targets.len(), 10);
    assert!(steady
        .targets
        .contains(&PathBuf::from("runs/steady_wind/ws12.0/NREL5MW_ServoDyn.dat")));
    assert_eq!(steady.file_deps.len(), 5);

    let rotor = plan.task("prepare_fast_input:linearised_fixed_rotor_speed").unwrap();
    assert_eq!(rotor.targets.len(), 8);
    assert!(rotor
        .targets
        .contains(&PathBuf::from("runs/linearised_fixed_rotor_speed/rotor10.0/main.fst")));

    let turbulent = plan.task("prepare_fast_input:turbulent").unwrap();
    assert!(turbulent
        .targets
        .contains(&PathBuf::from("runs/turbulent/seed00/NREL5MW_InflowWind.dat")));

    assert_eq!(
        steady.clean,
        vec![
            CleanAction::RemoveDir(PathBuf::from("runs/steady_wind/ws8.0")),
            CleanAction::RemoveDir(PathBuf::from("runs/steady_wind/ws12.0")),
        ]
    );
}

#[test]
fn only_the_parameter_file_gets_a_rule() {
    let fixture = ProjectFixture::standard();
    let plan = project(&fixture, ConfigFileBuilder::new().build()).plan().unwrap();

    let task = plan.task("prepare_fast_input:linearised_fixed_rotor_speed").unwrap();
    for action in &task.actions {
        let Action::Rewrite { source, rules, .. } = action else {
            panic!("unexpected action {action}");
        };
        let name = source.file_name().unwrap().to_str().unwrap();
        if name == "NREL5MW_ElastoDyn.dat" {
            assert_eq!(rules.len(), 1, "{name}");
        } else {
            assert!(rules.is_empty(), "{name} should be copied verbatim");
        }
    }
}

#[test]
fn sinusoidal_scenario_waits_for_its_wind_files() {
    let fixture = ProjectFixture::standard();
    let plan = project(&fixture, ConfigFileBuilder::new().build()).plan().unwrap();

    let wind = plan.task("sinusoidal_wind_files:sinusoidal_gust").unwrap();
    assert_eq!(
        wind.targets,
        vec![PathBuf::from("simulations/sinusoidal_gust/wind_8ms_1ms_1rads.wnd")]
    );
    assert_eq!(
        wind.actions.len(),
        1,
        "the generator script is the only action"
    );
    let Action::Command(spec) = &wind.actions[0] else {
        panic!("expected a command");
    };
    assert_eq!(
        spec,
        &CommandSpec::new("python")
            .arg("generate_inflow_gust.py")
            .cwd("simulations/sinusoidal_gust")
    );

    let deps = plan.graph().dependencies_of("prepare_fast_input:sinusoidal_gust");
    assert_eq!(deps, &["sinusoidal_wind_files:sinusoidal_gust".to_string()]);
}

#[test]
fn controller_build_is_two_ordered_stages() {
    let fixture = ProjectFixture::standard();
    let plan = project(&fixture, ConfigFileBuilder::new().build()).plan().unwrap();

    let configure = plan.task("prepare_discon_compilation:ROSCO").unwrap();
    assert_eq!(
        configure.targets,
        vec![PathBuf::from("controller/ROSCO/build/Makefile")]
    );
    assert_eq!(
        configure.clean,
        vec![CleanAction::RemoveDir(PathBuf::from("controller/ROSCO/build"))]
    );

    let compile = plan.task("compile_discon:ROSCO").unwrap();
    assert_eq!(
        compile.targets,
        vec![PathBuf::from("controller/ROSCO/build/DISCON.dll")]
    );
    assert_eq!(
        plan.graph().dependencies_of("compile_discon:ROSCO"),
        &["prepare_discon_compilation:ROSCO".to_string()]
    );
}

#[test]
fn seed_inputs_are_one_per_seed() {
    let fixture = ProjectFixture::standard();
    let cfg = ConfigFileBuilder::new().num_seeds(3).build();
    let plan = project(&fixture, cfg).plan().unwrap();

    let task = plan.task("prepare_wind_input:90m_12mps_twr").unwrap();
    assert_eq!(
        task.targets,
        vec![
            PathBuf::from("runs/wind_seeds/90m_12mps_twr_seed00.inp"),
            PathBuf::from("runs/wind_seeds/90m_12mps_twr_seed01.inp"),
            PathBuf::from("runs/wind_seeds/90m_12mps_twr_seed02.inp"),
        ]
    );

    let turbulent = plan.task("prepare_fast_input:turbulent").unwrap();
    // 3 seeds x 4 template files.
    assert_eq!(turbulent.targets.len(), 12);
}

#[test]
fn missing_directories_generate_nothing() {
    let fixture = ProjectFixture::empty();
    let plan = project(&fixture, ConfigFileBuilder::new().build()).plan().unwrap();

    // Only the seven basename groups.
    assert_eq!(plan.tasks().count(), 7);
    assert!(plan.tasks().all(|t| t.is_group() && t.task_deps.is_empty()));
}

#[test]
fn scenario_kinds_follow_directory_names() {
    let sweep = ConfigFileBuilder::new().build().sweep().clone();

    assert_eq!(ScenarioKind::classify("steady_wind", &sweep), ScenarioKind::SteadyWind);
    assert_eq!(ScenarioKind::classify("steady_wind_yaw", &sweep), ScenarioKind::SteadyWind);
    assert_eq!(
        ScenarioKind::classify("linearised_fixed_rotor_speed", &sweep),
        ScenarioKind::FixedRotorSpeed
    );
    assert_eq!(ScenarioKind::classify("linearised", &sweep), ScenarioKind::FixedWindSpeed);
    assert_eq!(ScenarioKind::classify("sinusoidal_gust", &sweep), ScenarioKind::FixedWindSpeed);
    assert_eq!(ScenarioKind::classify("turbulent", &sweep), ScenarioKind::Turbulent);
    assert_eq!(ScenarioKind::classify("dlc_1_2", &sweep), ScenarioKind::Turbulent);
}

#[test]
fn variant_labels() {
    assert_eq!(Variant::WindSpeed(8.0).label(), "ws8.0");
    assert_eq!(Variant::WindSpeed(11.5).label(), "ws11.5");
    assert_eq!(Variant::RotorSpeed(9.0).label(), "rotor9.0");
    assert_eq!(Variant::Seed(0).label(), "seed00");
    assert_eq!(Variant::Seed(12).label(), "seed12");
}

#[test]
fn two_tasks_claiming_one_target_is_an_error() {
    let tasks = vec![
        Task::new("a:x").target("runs/out.dat"),
        Task::new("b:x").target("./runs/out.dat"),
    ];

    match TaskGraph::build(&tasks) {
        Err(PipelineError::DuplicateTarget { target, first, second }) => {
            assert_eq!(target, PathBuf::from("runs/out.dat"));
            assert_eq!(first, "a:x");
            assert_eq!(second, "b:x");
        }
        other => panic!("expected DuplicateTarget, got {other:?}"),
    }
}

#[test]
fn producer_of_a_file_dependency_becomes_a_dependency() {
    let tasks = vec![
        Task::new("make:lib").target("build/lib.so"),
        Task::new("use:lib").file_dep("build/lib.so").target("out.txt"),
        Task::new("use:src").file_dep("src/main.c"),
    ];
    let graph = TaskGraph::build(&tasks).unwrap();

    assert_eq!(graph.dependencies_of("use:lib"), &["make:lib".to_string()]);
    assert!(graph.dependencies_of("use:src").is_empty());
    assert_eq!(graph.owner_of(std::path::Path::new("build/lib.so")), Some("make:lib"));

    let order = graph.topological_order().unwrap();
    let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
    assert!(pos("make:lib") < pos("use:lib"));
}

#[test]
fn unknown_task_dependency_and_cycles_are_rejected() {
    let unknown = vec![Task::group("all", vec!["nope".to_string()])];
    assert!(matches!(
        TaskGraph::build(&unknown),
        Err(PipelineError::TaskNotFound(_))
    ));

    let cyclic = vec![
        Task::new("a").file_dep("b.out").target("a.out"),
        Task::new("b").file_dep("a.out").target("b.out"),
    ];
    assert!(matches!(
        TaskGraph::build(&cyclic),
        Err(PipelineError::DagCycle(_))
    ));

    let duplicate = vec![Task::new("a"), Task::new("a")];
    assert!(matches!(
        TaskGraph::build(&duplicate),
        Err(PipelineError::DuplicateTask(_))
    ));
}

#[test]
fn run_file_with_cyclic_references_becomes_a_failing_task() {
    let fixture = ProjectFixture::empty()
        .file("runs/broken/v1/main.fst", "\"a.dat\"    EDFile\n")
        .file("runs/broken/v1/a.dat", "\"b.dat\"    TwrFile\n")
        .file("runs/broken/v1/b.dat", "\"a.dat\"    EDFile\n")
        .file("runs/fine/v1/main.fst", "\"a.dat\"    EDFile\n")
        .file("runs/fine/v1/a.dat", "1   RotSpeed\n");
    let cfg = ConfigFileBuilder::new().build();
    let fs = fixture.fs();
    let ctx = GenContext::new(fs.as_ref(), Path::new("."), &cfg);

    let tasks = OpenFast.generate(&ctx).unwrap();
    let task = |name: &str| tasks.iter().find(|t| t.name == name).unwrap();

    let broken = task("openfast:broken:v1:main");
    let reason = broken.generation_error().expect("broken run records its error");
    assert!(reason.contains("runs/broken/v1/a.dat"), "{reason}");
    assert!(!broken.actions.iter().any(|a| matches!(a, Action::Command(_))));
    assert_eq!(broken.targets, vec![PathBuf::from("runs/broken/v1/main.out")]);

    let fine = task("openfast:fine:v1:main");
    assert!(fine.generation_error().is_none());
    assert!(fine.file_deps.contains(&PathBuf::from("runs/fine/v1/a.dat")));
}
