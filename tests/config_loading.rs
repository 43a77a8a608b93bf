// tests/config_loading.rs

use std::collections::HashMap;
use std::error::Error;
use std::io::Write;
use std::time::Duration;

use depsched::config::{
    RawConfigFile, SchedulerConfig, apply_overrides, load_and_validate, load_from_path,
    load_from_str, parse_duration,
};
use depsched::errors::SchedulerError;
use depsched::rules::RuleSet;
use depsched::types::FallbackPolicy;
use tempfile::NamedTempFile;

type TestResult = Result<(), Box<dyn Error>>;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn validate(toml: &str) -> Result<SchedulerConfig, SchedulerError> {
    SchedulerConfig::try_from(load_from_str(toml)?)
}

#[test]
fn empty_file_validates_to_defaults() -> TestResult {
    let cfg = validate("")?;

    assert_eq!(cfg, SchedulerConfig::default());
    assert_eq!(cfg.executor.max_workers, 5);
    assert_eq!(cfg.executor.task_timeout, Duration::from_secs(30));
    assert_eq!(cfg.executor.group_timeout, Duration::from_secs(60));
    assert_eq!(cfg.executor.grace_period, Duration::from_secs(5));
    assert!(cfg.executor.enable_parallel);
    assert_eq!(cfg.executor.fallback_policy, FallbackPolicy::Advisory);
    assert_eq!(cfg.guard.lock_timeout, Duration::from_secs(5));
    assert_eq!(cfg.guard.poll_interval, Duration::from_millis(100));
    assert_eq!(cfg.guard.conflict_threshold, 5);
    assert_eq!(cfg.guard.cleanup_interval, Duration::from_secs(300));
    assert_eq!(cfg.guard.max_idle, Duration::from_secs(300));
    assert_eq!(cfg.rules.proximity_threshold, 200.0);
    assert_eq!(cfg.rules.counter_pairs.len(), 3);
    Ok(())
}

#[test]
fn file_values_override_defaults() -> TestResult {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"
[executor]
max_workers = 2
task_timeout = "1500ms"
fallback_policy = "serial"
enable_parallel = false

[guard]
lock_timeout = "1s"
cleanup_interval = "0s"
max_idle = "2m"

[rules]
proximity_threshold = 120.5
risky_keywords = ["wipe"]

[[rules.counter_pairs]]
increase = ["more"]
decrease = ["less"]
"#
    )?;

    let raw = load_from_path(file.path())?;
    assert_eq!(raw.executor.max_workers, 2);

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.executor.task_timeout, Duration::from_millis(1500));
    assert_eq!(cfg.executor.fallback_policy, FallbackPolicy::Serial);
    assert!(!cfg.executor.enable_parallel);
    assert_eq!(cfg.guard.lock_timeout, Duration::from_secs(1));
    assert_eq!(cfg.guard.cleanup_interval, Duration::ZERO);
    assert_eq!(cfg.guard.max_idle, Duration::from_secs(120));
    assert_eq!(cfg.rules.proximity_threshold, 120.5);
    assert_eq!(cfg.rules.risky_keywords, vec!["wipe"]);
    assert_eq!(cfg.rules.counter_pairs.len(), 1);
    // Tables not mentioned keep their defaults.
    assert!(cfg.rules.submit_keywords.iter().any(|w| w == "submit"));

    let rules = RuleSet::from_config(&cfg.rules)?;
    assert!(rules.is_unsafe(&depsched::Task::new("x", depsched::TaskKind::Button, "Wipe disk")));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_from_path("/definitely/not/here/depsched.toml").unwrap_err();
    assert!(matches!(err, SchedulerError::IoError(_)));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let err = load_from_str("[executor\nmax_workers = 1").unwrap_err();
    assert!(matches!(err, SchedulerError::TomlError(_)));

    let err = load_from_str("[executor]\nfallback_policy = \"sometimes\"").unwrap_err();
    assert!(matches!(err, SchedulerError::TomlError(_)));
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        "[executor]\nmax_workers = 0",
        "[executor]\ntask_timeout = \"0s\"",
        "[executor]\ngroup_timeout = \"soon\"",
        "[guard]\npoll_interval = \"10\"",
        "[guard]\nconflict_threshold = 0",
        "[guard]\nlock_timeout = \"5 fortnights\"",
        "[rules]\nproximity_threshold = -1.0",
        "[[rules.counter_pairs]]\nincrease = [\"up\"]\ndecrease = []",
    ];

    for toml in cases {
        match validate(toml) {
            Err(SchedulerError::ConfigError(msg)) => assert!(!msg.is_empty()),
            other => panic!("expected ConfigError for {toml:?}, got {other:?}"),
        }
    }
}

#[test]
fn max_idle_defaults_to_cleanup_interval() -> TestResult {
    let cfg = validate("[guard]\ncleanup_interval = \"45s\"")?;
    assert_eq!(cfg.guard.max_idle, Duration::from_secs(45));
    Ok(())
}

#[test]
fn environment_overrides_apply_before_validation() -> TestResult {
    let mut raw = RawConfigFile::default();
    apply_overrides(
        &mut raw,
        env(&[
            ("DEPSCHED_MAX_WORKERS", "3"),
            ("DEPSCHED_TASK_TIMEOUT", "12"),
            ("DEPSCHED_LOCK_TIMEOUT", "250ms"),
            ("DEPSCHED_ENABLE_PARALLEL", "FALSE"),
            ("DEPSCHED_LOCK_CLEANUP_INTERVAL", "0"),
        ]),
    )?;

    let cfg = SchedulerConfig::try_from(raw)?;
    assert_eq!(cfg.executor.max_workers, 3);
    assert_eq!(cfg.executor.task_timeout, Duration::from_secs(12));
    assert_eq!(cfg.guard.lock_timeout, Duration::from_millis(250));
    assert!(!cfg.executor.enable_parallel);
    assert_eq!(cfg.guard.cleanup_interval, Duration::ZERO);
    Ok(())
}

#[test]
fn absent_overrides_leave_config_alone() -> TestResult {
    let mut raw = load_from_str("[executor]\nmax_workers = 7")?;
    apply_overrides(&mut raw, env(&[]))?;
    assert_eq!(raw.executor.max_workers, 7);
    Ok(())
}

#[test]
fn bad_overrides_are_config_errors() {
    for (key, value) in [
        ("DEPSCHED_MAX_WORKERS", "many"),
        ("DEPSCHED_TASK_TIMEOUT", "1 week"),
        ("DEPSCHED_ENABLE_PARALLEL", "perhaps"),
    ] {
        let mut raw = RawConfigFile::default();
        let err = apply_overrides(&mut raw, env(&[(key, value)])).unwrap_err();
        assert!(
            matches!(err, SchedulerError::ConfigError(ref msg) if msg.contains(key)),
            "{key}={value}: {err}"
        );
    }
}

#[test]
fn durations_parse_with_unit_suffixes() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration(" 5s "), Ok(Duration::from_secs(5)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert_eq!(parse_duration("0s"), Ok(Duration::ZERO));

    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("s").is_err());
    assert!(parse_duration("3d").is_err());
}

#[test]
fn oversized_durations_are_rejected_not_wrapped() {
    let err = parse_duration("99999999999999999h").unwrap_err();
    assert!(err.contains("out of range"), "{err}");
    assert!(parse_duration("307445734561825861m").is_err());
    assert_eq!(
        parse_duration("18446744073709551615s"),
        Ok(Duration::from_secs(u64::MAX))
    );

    let err = validate("[executor]\ntask_timeout = \"99999999999999999h\"").unwrap_err();
    assert!(
        matches!(err, SchedulerError::ConfigError(ref msg) if msg.contains("task_timeout")),
        "{err}"
    );

    let mut raw = RawConfigFile::default();
    let err = apply_overrides(&mut raw, env(&[("DEPSCHED_TASK_TIMEOUT", "99999999999999999h")]))
        .unwrap_err();
    assert!(matches!(err, SchedulerError::ConfigError(_)), "{err}");
}
