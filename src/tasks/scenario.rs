// src/tasks/scenario.rs

//! Scenario directories and their parameter variants.
//!
//! The kind of a scenario follows from its directory name and is decided
//! once, when the scenario is discovered. The kind fixes which parameter is
//! swept, how variant directories are labelled, and which template file gets
//! which substitution.

use std::path::{Path, PathBuf};

use crate::config::SweepSection;
use crate::errors::Result;
use crate::fs::{file_name_str, FileSystem};
use crate::rewrite::rules::{self, format_speed, seed_value};
use crate::rewrite::SubstitutionRule;
use crate::tasks::scan;
use crate::tasks::wind_seeds::{seed_output_name, WIND_SEEDS_DIR};

const STEADY_WIND_PREFIX: &str = "steady_wind";
const FIXED_WIND_PREFIXES: &[&str] = &["linearised", "sinusoidal"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// `steady_wind*`: sweep hub-height wind speed.
    SteadyWind,
    /// `linearised*` / `sinusoidal*`: the steady-wind strategy at the
    /// linearisation wind speeds.
    FixedWindSpeed,
    /// The named fixed-rotor-speed linearisation: sweep rotor speed.
    FixedRotorSpeed,
    /// Anything else: one variant per turbulence seed.
    Turbulent,
}

impl ScenarioKind {
    pub fn classify(name: &str, sweep: &SweepSection) -> Self {
        if name.starts_with(STEADY_WIND_PREFIX) {
            ScenarioKind::SteadyWind
        } else if FIXED_WIND_PREFIXES.iter().any(|p| name.starts_with(p)) {
            if name == sweep.fixed_rotor_speed_scenario {
                ScenarioKind::FixedRotorSpeed
            } else {
                ScenarioKind::FixedWindSpeed
            }
        } else {
            ScenarioKind::Turbulent
        }
    }

    /// The variants this kind sweeps over.
    pub fn variants(self, sweep: &SweepSection) -> Vec<Variant> {
        match self {
            ScenarioKind::SteadyWind => sweep
                .steady_wind_speeds
                .iter()
                .map(|&s| Variant::WindSpeed(s))
                .collect(),
            ScenarioKind::FixedWindSpeed => sweep
                .linearised_wind_speeds
                .iter()
                .map(|&s| Variant::WindSpeed(s))
                .collect(),
            ScenarioKind::FixedRotorSpeed => sweep
                .linearised_rotor_speeds
                .iter()
                .map(|&s| Variant::RotorSpeed(s))
                .collect(),
            ScenarioKind::Turbulent => (0..sweep.num_seeds).map(Variant::Seed).collect(),
        }
    }
}

/// One parameterisation of a scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Variant {
    /// Hub-height wind speed in m/s.
    WindSpeed(f64),
    /// Rotor speed in rpm.
    RotorSpeed(f64),
    /// Turbulence seed index.
    Seed(u32),
}

impl Variant {
    /// Directory name of the variant: `ws8.0`, `rotor9.5`, `seed03`.
    pub fn label(&self) -> String {
        match self {
            Variant::WindSpeed(s) => format!("ws{}", format_speed(*s)),
            Variant::RotorSpeed(s) => format!("rotor{}", format_speed(*s)),
            Variant::Seed(i) => format!("seed{}", seed_label(*i)),
        }
    }

    /// Substitutions to apply when copying `template` into this variant.
    ///
    /// Only one template per variant is rewritten; every other file is copied
    /// verbatim.
    pub fn rules_for(&self, template: &Path, sweep: &SweepSection) -> Vec<SubstitutionRule> {
        match self {
            Variant::WindSpeed(s) if is_inflow_wind_file(template) => {
                vec![rules::hub_wind_speed(*s)]
            }
            Variant::RotorSpeed(s) if is_structural_file(template) => {
                vec![rules::rotor_speed(*s)]
            }
            Variant::Seed(i) if is_inflow_wind_file(template) => {
                let bts = seed_output_name(&sweep.turbulent_wind_stem, *i, "bts");
                vec![rules::turbulence_file(&format!("../../{WIND_SEEDS_DIR}/{bts}"))]
            }
            _ => Vec::new(),
        }
    }
}

/// Two-digit seed label used in file and directory names.
pub fn seed_label(seed: u32) -> String {
    format!("{seed:02}")
}

/// The seed value written into generator inputs for `seed`.
pub fn seed_number(sweep: &SweepSection, seed: u32) -> u64 {
    seed_value(sweep.seed_base_offset, seed)
}

fn is_dat(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("dat")
}

/// The InflowWind module input of a scenario.
pub fn is_inflow_wind_file(path: &Path) -> bool {
    is_dat(path) && file_name_str(path).contains("InflowWind")
}

/// The ElastoDyn input that is not the tower file.
pub fn is_structural_file(path: &Path) -> bool {
    let name = file_name_str(path);
    is_dat(path) && name.contains("ElastoDyn") && !name.contains("Tower")
}

/// A scenario template directory under `simulations/`.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub dir: PathBuf,
    pub kind: ScenarioKind,
}

impl Scenario {
    /// Every subdirectory of `simulations_dir`, classified.
    pub fn discover(
        fs: &dyn FileSystem,
        simulations_dir: &Path,
        sweep: &SweepSection,
    ) -> Result<Vec<Scenario>> {
        Ok(scan::subdirs(fs, simulations_dir)?
            .into_iter()
            .map(|dir| {
                let name = file_name_str(&dir).to_string();
                let kind = ScenarioKind::classify(&name, sweep);
                Scenario { name, dir, kind }
            })
            .collect())
    }

    pub fn variants(&self, sweep: &SweepSection) -> Vec<Variant> {
        self.kind.variants(sweep)
    }

    /// `runs/<scenario>`.
    pub fn output_dir(&self, runs_dir: &Path) -> PathBuf {
        runs_dir.join(&self.name)
    }

    /// `runs/<scenario>/<variant label>`.
    pub fn variant_dir(&self, runs_dir: &Path, variant: &Variant) -> PathBuf {
        self.output_dir(runs_dir).join(variant.label())
    }
}
