// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - `model.rs` defines the TOML-backed raw model and the validated one.
//! - `loader.rs` reads files and applies environment overrides.
//! - `validate.rs` turns the raw model into [`SchedulerConfig`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{apply_overrides, load_and_validate, load_from_env, load_from_path, load_from_str};
pub use model::{
    CounterPairConfig, ExecutorConfig, GuardConfig, RawConfigFile, RulesConfig, SchedulerConfig,
};
pub use validate::parse_duration;
