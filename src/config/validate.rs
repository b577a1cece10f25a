// src/config/validate.rs

use std::collections::HashSet;
use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_paths(cfg)?;
    validate_sweep(cfg)?;
    validate_names(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    // check / hash_storage are strongly typed and validated during
    // deserialization.
    if cfg.config.jobs == 0 {
        return Err(PipelineError::ConfigError(
            "[config].jobs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let entries = [
        ("simulations", &cfg.paths.simulations),
        ("wind", &cfg.paths.wind),
        ("controller", &cfg.paths.controller),
        ("runs", &cfg.paths.runs),
    ];

    for (key, value) in entries {
        if value.trim().is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "[paths].{key} must not be empty"
            )));
        }
        if Path::new(value).is_absolute() {
            return Err(PipelineError::ConfigError(format!(
                "[paths].{key} must be relative to the project root (got '{value}')"
            )));
        }
    }
    Ok(())
}

fn validate_sweep(cfg: &RawConfigFile) -> Result<()> {
    let sweep = &cfg.sweep;
    validate_speeds("steady_wind_speeds", &sweep.steady_wind_speeds)?;
    validate_speeds("linearised_wind_speeds", &sweep.linearised_wind_speeds)?;
    validate_speeds("linearised_rotor_speeds", &sweep.linearised_rotor_speeds)?;

    if sweep
        .seed_base_offset
        .checked_add(u64::from(sweep.num_seeds))
        .is_none()
    {
        return Err(PipelineError::ConfigError(format!(
            "[sweep].seed_base_offset + num_seeds overflows ({} + {})",
            sweep.seed_base_offset, sweep.num_seeds
        )));
    }
    Ok(())
}

/// Every speed must be usable as a physical value, and the one-decimal labels
/// used for variant directories (`ws8.0`, `rotor9.5`) must not collide, or two
/// variants would write into the same directory.
fn validate_speeds(key: &str, speeds: &[f64]) -> Result<()> {
    let mut labels = HashSet::new();
    for &speed in speeds {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(PipelineError::ConfigError(format!(
                "[sweep].{key} entries must be finite and > 0 (got {speed})"
            )));
        }
        let label = format!("{speed:.1}");
        if !labels.insert(label.clone()) {
            return Err(PipelineError::ConfigError(format!(
                "[sweep].{key} has two entries that both map to the variant label '{label}'"
            )));
        }
    }
    Ok(())
}

fn validate_names(cfg: &RawConfigFile) -> Result<()> {
    let entries = [
        ("commands.openfast", &cfg.commands.openfast),
        ("commands.turbsim", &cfg.commands.turbsim),
        ("commands.python", &cfg.commands.python),
        ("commands.cmake", &cfg.commands.cmake),
        ("commands.make", &cfg.commands.make),
        ("controller.build_description", &cfg.controller.build_description),
        ("controller.source", &cfg.controller.source),
        ("controller.library", &cfg.controller.library),
        ("sweep.fixed_rotor_speed_scenario", &cfg.sweep.fixed_rotor_speed_scenario),
        ("sweep.turbulent_wind_stem", &cfg.sweep.turbulent_wind_stem),
    ];

    for (key, value) in entries {
        if value.trim().is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "[{key}] must not be empty"
            )));
        }
    }
    Ok(())
}
