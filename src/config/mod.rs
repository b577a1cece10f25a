// src/config/mod.rs

//! Configuration: the `Fastpipe.toml` model, loading and validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_for_project, DEFAULT_CONFIG_FILE};
pub use model::{
    CommandsSection, ConfigFile, ConfigSection, ControllerSection, PathsSection, RawConfigFile,
    SweepSection,
};
