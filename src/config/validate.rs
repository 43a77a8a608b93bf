// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{
    ExecutorConfig, GuardConfig, RawConfigFile, RawExecutorSection, RawGuardSection, RulesConfig,
    SchedulerConfig,
};
use crate::errors::{Result, SchedulerError};
use crate::rules::RuleSet;

impl TryFrom<RawConfigFile> for SchedulerConfig {
    type Error = SchedulerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let executor = validate_executor(&raw.executor)?;
        let guard = validate_guard(&raw.guard)?;
        validate_rules(&raw.rules)?;

        Ok(SchedulerConfig {
            executor,
            guard,
            rules: raw.rules,
        })
    }
}

/// Parse strings like `"100ms"`, `"5s"`, `"2m"`, `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is out of range"))
}

fn duration_field(section: &str, key: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| SchedulerError::ConfigError(format!("[{section}].{key}: {e}")))
}

fn positive_duration(section: &str, key: &str, value: &str) -> Result<Duration> {
    let d = duration_field(section, key, value)?;
    if d.is_zero() {
        return Err(SchedulerError::ConfigError(format!(
            "[{section}].{key} must be greater than zero (got {value:?})"
        )));
    }
    Ok(d)
}

fn validate_executor(raw: &RawExecutorSection) -> Result<ExecutorConfig> {
    if raw.max_workers == 0 {
        return Err(SchedulerError::ConfigError(
            "[executor].max_workers must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(ExecutorConfig {
        max_workers: raw.max_workers,
        task_timeout: positive_duration("executor", "task_timeout", &raw.task_timeout)?,
        group_timeout: positive_duration("executor", "group_timeout", &raw.group_timeout)?,
        grace_period: duration_field("executor", "grace_period", &raw.grace_period)?,
        enable_parallel: raw.enable_parallel,
        fallback_policy: raw.fallback_policy,
    })
}

fn validate_guard(raw: &RawGuardSection) -> Result<GuardConfig> {
    if raw.conflict_threshold == 0 {
        return Err(SchedulerError::ConfigError(
            "[guard].conflict_threshold must be >= 1 (got 0)".to_string(),
        ));
    }

    let cleanup_interval = duration_field("guard", "cleanup_interval", &raw.cleanup_interval)?;
    let max_idle = match &raw.max_idle {
        Some(value) => duration_field("guard", "max_idle", value)?,
        None => cleanup_interval,
    };

    Ok(GuardConfig {
        lock_timeout: positive_duration("guard", "lock_timeout", &raw.lock_timeout)?,
        poll_interval: positive_duration("guard", "poll_interval", &raw.poll_interval)?,
        conflict_threshold: raw.conflict_threshold,
        cleanup_interval,
        max_idle,
    })
}

fn validate_rules(rules: &RulesConfig) -> Result<()> {
    if !rules.proximity_threshold.is_finite() || rules.proximity_threshold <= 0.0 {
        return Err(SchedulerError::ConfigError(format!(
            "[rules].proximity_threshold must be a positive number (got {})",
            rules.proximity_threshold
        )));
    }

    for (idx, pair) in rules.counter_pairs.iter().enumerate() {
        let blank = |words: &[String]| words.iter().all(|w| w.trim().is_empty());
        if blank(pair.increase.as_slice()) || blank(pair.decrease.as_slice()) {
            return Err(SchedulerError::ConfigError(format!(
                "[rules].counter_pairs[{idx}] needs at least one keyword on each side"
            )));
        }
    }

    // Compiling the full rule set catches any keyword the matcher rejects.
    RuleSet::from_config(rules)?;
    Ok(())
}
