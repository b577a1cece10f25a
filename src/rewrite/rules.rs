// src/rewrite/rules.rs

//! Substitution rules for the fields the pipeline rewrites.
//!
//! Each pattern anchors on the field label and captures the label (with its
//! leading whitespace) so the replacement can put a new value in front of it.

use std::sync::LazyLock;

use regex::Regex;

use super::SubstitutionRule;

static RAND_SEED1: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[0-9]+([ \t]+RandSeed1)").expect("RandSeed1 pattern is valid")
});

static HWIND_SPEED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*[0-9.]+([ \t]+HWindSpeed )").expect("HWindSpeed pattern is valid")
});

static ROT_SPEED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*[0-9.]+([ \t]+RotSpeed )").expect("RotSpeed pattern is valid")
});

static FILENAME_BTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^"[^"]+"([ \t]+FileName_BTS )"#).expect("FileName_BTS pattern is valid")
});

/// Seed value for seed index `seed`.
///
/// Distinct per index; whether the value is inside the range the turbulence
/// generator accepts is not checked here.
pub fn seed_value(base_offset: u64, seed: u32) -> u64 {
    base_offset + u64::from(seed)
}

/// `RandSeed1` of a turbulence generator input, exactly one per file.
pub fn rand_seed(value: u64) -> SubstitutionRule {
    SubstitutionRule::new(RAND_SEED1.clone(), format!("{value}${{1}}"), 1)
}

/// `HWindSpeed` of an InflowWind input (m/s), exactly one per file.
pub fn hub_wind_speed(speed: f64) -> SubstitutionRule {
    SubstitutionRule::new(HWIND_SPEED.clone(), format!("{}${{1}}", format_speed(speed)), 1)
}

/// `RotSpeed` initial condition of an ElastoDyn input (rpm), exactly one per file.
pub fn rotor_speed(speed: f64) -> SubstitutionRule {
    SubstitutionRule::new(ROT_SPEED.clone(), format!("{}${{1}}", format_speed(speed)), 1)
}

/// `FileName_BTS` of an InflowWind input, exactly one per file.
///
/// `path` is written verbatim between quotes; it is interpreted by the
/// simulator relative to the input file's directory.
pub fn turbulence_file(path: &str) -> SubstitutionRule {
    let escaped = path.replace('$', "$$");
    SubstitutionRule::new(FILENAME_BTS.clone(), format!("\"{escaped}\"${{1}}"), 1)
}

/// One decimal, the layout used in both the input files and variant labels.
pub fn format_speed(speed: f64) -> String {
    format!("{speed:.1}")
}
