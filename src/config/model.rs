// src/config/model.rs

use serde::Deserialize;

use crate::types::{CheckMode, HashStorageMode};

/// Top-level configuration as read from `Fastpipe.toml`.
///
/// ```toml
/// [config]
/// check = "mtime"
/// jobs = 4
///
/// [sweep]
/// num_seeds = 6
/// steady_wind_speeds = [4, 8, 12]
///
/// [commands]
/// openfast = "/opt/openfast/bin/openfast"
/// ```
///
/// All sections are optional and default to the values the simulation
/// campaign was set up with.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Engine behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Directory layout from `[paths]`.
    #[serde(default)]
    pub paths: PathsSection,

    /// Scenario parameter sweeps from `[sweep]`.
    #[serde(default)]
    pub sweep: SweepSection,

    /// External programs from `[commands]`.
    #[serde(default)]
    pub commands: CommandsSection,

    /// Controller build layout from `[controller]`.
    #[serde(default)]
    pub controller: ControllerSection,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see
/// `config::validate`), so holders can rely on the invariants checked there.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    paths: PathsSection,
    sweep: SweepSection,
    commands: CommandsSection,
    controller: ControllerSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            paths: raw.paths,
            sweep: raw.sweep,
            commands: raw.commands,
            controller: raw.controller,
        }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn paths(&self) -> &PathsSection {
        &self.paths
    }

    pub fn sweep(&self) -> &SweepSection {
        &self.sweep
    }

    pub fn commands(&self) -> &CommandsSection {
        &self.commands
    }

    pub fn controller(&self) -> &ControllerSection {
        &self.controller
    }

    /// Override the number of concurrently executing tasks (`--jobs`).
    pub fn set_jobs(&mut self, jobs: usize) {
        self.config.jobs = jobs.max(1);
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"mtime"` (default) or `"hash"`.
    #[serde(default)]
    pub check: CheckMode,

    /// Where `"hash"` mode keeps its per-task hashes.
    #[serde(default)]
    pub hash_storage: HashStorageMode,

    /// Maximum number of tasks executing at the same time.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

fn default_jobs() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            check: CheckMode::default(),
            hash_storage: HashStorageMode::default(),
            jobs: default_jobs(),
        }
    }
}

/// `[paths]` section. All entries are relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    /// Scenario template directories, one per experiment family.
    #[serde(default = "default_simulations_dir")]
    pub simulations: String,

    /// Turbulence generator input templates (`*.inp`).
    #[serde(default = "default_wind_dir")]
    pub wind: String,

    /// One subdirectory per controller variant.
    #[serde(default = "default_controller_dir")]
    pub controller: String,

    /// Generated inputs and simulator outputs.
    #[serde(default = "default_runs_dir")]
    pub runs: String,
}

fn default_simulations_dir() -> String {
    "simulations".to_string()
}

fn default_wind_dir() -> String {
    "wind".to_string()
}

fn default_controller_dir() -> String {
    "controller".to_string()
}

fn default_runs_dir() -> String {
    "runs".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            simulations: default_simulations_dir(),
            wind: default_wind_dir(),
            controller: default_controller_dir(),
            runs: default_runs_dir(),
        }
    }
}

/// `[sweep]` section: the parameters each scenario kind is swept over.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepSection {
    /// Number of turbulence seeds per turbulent scenario.
    #[serde(default = "default_num_seeds")]
    pub num_seeds: u32,

    /// `RandSeed1` written for seed `i` is `seed_base_offset + i`.
    #[serde(default = "default_seed_base_offset")]
    pub seed_base_offset: u64,

    /// Hub-height wind speeds (m/s) for `steady_wind*` scenarios.
    #[serde(default = "default_steady_wind_speeds")]
    pub steady_wind_speeds: Vec<f64>,

    /// Wind speeds (m/s) for `linearised*` / `sinusoidal*` scenarios.
    #[serde(default = "default_linearised_wind_speeds")]
    pub linearised_wind_speeds: Vec<f64>,

    /// Rotor speeds (rpm) for the fixed-rotor-speed linearisation.
    #[serde(default = "default_linearised_rotor_speeds")]
    pub linearised_rotor_speeds: Vec<f64>,

    /// Scenario directory name that sweeps rotor speed instead of wind speed.
    #[serde(default = "default_fixed_rotor_speed_scenario")]
    pub fixed_rotor_speed_scenario: String,

    /// Stem of the turbulence input whose seeds turbulent scenarios use.
    #[serde(default = "default_turbulent_wind_stem")]
    pub turbulent_wind_stem: String,
}

fn default_num_seeds() -> u32 {
    1
}

fn default_seed_base_offset() -> u64 {
    13420
}

fn default_steady_wind_speeds() -> Vec<f64> {
    vec![4.0, 6.0, 8.0, 10.0, 11.5, 12.5, 14.0, 16.0]
}

fn default_linearised_wind_speeds() -> Vec<f64> {
    vec![8.0]
}

fn default_linearised_rotor_speeds() -> Vec<f64> {
    vec![8.5, 9.0, 9.5, 10.0, 10.5]
}

fn default_fixed_rotor_speed_scenario() -> String {
    "linearised_fixed_rotor_speed".to_string()
}

fn default_turbulent_wind_stem() -> String {
    "90m_12mps_twr".to_string()
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            num_seeds: default_num_seeds(),
            seed_base_offset: default_seed_base_offset(),
            steady_wind_speeds: default_steady_wind_speeds(),
            linearised_wind_speeds: default_linearised_wind_speeds(),
            linearised_rotor_speeds: default_linearised_rotor_speeds(),
            fixed_rotor_speed_scenario: default_fixed_rotor_speed_scenario(),
            turbulent_wind_stem: default_turbulent_wind_stem(),
        }
    }
}

/// `[commands]` section: programs looked up on `PATH` unless absolute.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandsSection {
    #[serde(default = "default_openfast")]
    pub openfast: String,
    #[serde(default = "default_turbsim")]
    pub turbsim: String,
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default = "default_cmake")]
    pub cmake: String,
    #[serde(default = "default_make")]
    pub make: String,
}

fn default_openfast() -> String {
    "openfast".to_string()
}

fn default_turbsim() -> String {
    "turbsim".to_string()
}

fn default_python() -> String {
    "python".to_string()
}

fn default_cmake() -> String {
    "cmake".to_string()
}

fn default_make() -> String {
    "make".to_string()
}

impl Default for CommandsSection {
    fn default() -> Self {
        Self {
            openfast: default_openfast(),
            turbsim: default_turbsim(),
            python: default_python(),
            cmake: default_cmake(),
            make: default_make(),
        }
    }
}

/// `[controller]` section: file names inside each controller directory.
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerSection {
    #[serde(default = "default_build_description")]
    pub build_description: String,
    #[serde(default = "default_controller_source")]
    pub source: String,
    #[serde(default = "default_controller_library")]
    pub library: String,
}

fn default_build_description() -> String {
    "CMakeLists.txt".to_string()
}

fn default_controller_source() -> String {
    "DISCON.F90".to_string()
}

fn default_controller_library() -> String {
    "DISCON.dll".to_string()
}

impl Default for ControllerSection {
    fn default() -> Self {
        Self {
            build_description: default_build_description(),
            source: default_controller_source(),
            library: default_controller_library(),
        }
    }
}
