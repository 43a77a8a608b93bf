// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{RawConfigFile, SchedulerConfig};
use crate::config::validate::parse_duration;
use crate::errors::{Result, SchedulerError};

pub const ENV_MAX_WORKERS: &str = "DEPSCHED_MAX_WORKERS";
pub const ENV_TASK_TIMEOUT: &str = "DEPSCHED_TASK_TIMEOUT";
pub const ENV_LOCK_TIMEOUT: &str = "DEPSCHED_LOCK_TIMEOUT";
pub const ENV_ENABLE_PARALLEL: &str = "DEPSCHED_ENABLE_PARALLEL";
pub const ENV_LOCK_CLEANUP_INTERVAL: &str = "DEPSCHED_LOCK_CLEANUP_INTERVAL";

/// Load a configuration file and return the raw, unvalidated model.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] for
/// the full pipeline.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Read TOML, apply `DEPSCHED_*` environment overrides, then validate.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<SchedulerConfig> {
    let mut raw = load_from_path(&path)?;
    apply_overrides(&mut raw, |key| std::env::var(key).ok())?;
    SchedulerConfig::try_from(raw)
}

/// Built-in defaults plus environment overrides, for callers without a file.
pub fn load_from_env() -> Result<SchedulerConfig> {
    let mut raw = RawConfigFile::default();
    apply_overrides(&mut raw, |key| std::env::var(key).ok())?;
    SchedulerConfig::try_from(raw)
}

/// Apply environment-style overrides to a raw config.
///
/// `lookup` maps a variable name to its value. Durations accept the usual
/// suffixed form or a bare number of seconds.
pub fn apply_overrides<F>(raw: &mut RawConfigFile, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_MAX_WORKERS) {
        raw.executor.max_workers = value.trim().parse().map_err(|e| {
            SchedulerError::ConfigError(format!("{ENV_MAX_WORKERS}={value:?}: {e}"))
        })?;
        debug!(max_workers = raw.executor.max_workers, "override from environment");
    }

    if let Some(value) = lookup(ENV_TASK_TIMEOUT) {
        raw.executor.task_timeout = override_duration(ENV_TASK_TIMEOUT, &value)?;
    }

    if let Some(value) = lookup(ENV_LOCK_TIMEOUT) {
        raw.guard.lock_timeout = override_duration(ENV_LOCK_TIMEOUT, &value)?;
    }

    if let Some(value) = lookup(ENV_LOCK_CLEANUP_INTERVAL) {
        raw.guard.cleanup_interval = override_duration(ENV_LOCK_CLEANUP_INTERVAL, &value)?;
    }

    if let Some(value) = lookup(ENV_ENABLE_PARALLEL) {
        raw.executor.enable_parallel = match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => {
                return Err(SchedulerError::ConfigError(format!(
                    "{ENV_ENABLE_PARALLEL}={value:?}: expected true or false"
                )));
            }
        };
    }

    Ok(())
}

fn override_duration(var: &str, value: &str) -> Result<String> {
    let value = value.trim();
    let normalized = if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        format!("{value}s")
    } else {
        value.to_string()
    };

    parse_duration(&normalized)
        .map_err(|e| SchedulerError::ConfigError(format!("{var}={value:?}: {e}")))?;
    debug!(var, value = %normalized, "override from environment");
    Ok(normalized)
}
