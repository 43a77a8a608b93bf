// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::FallbackPolicy;

pub const DEFAULT_MAX_WORKERS: usize = 5;
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_GROUP_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_CONFLICT_THRESHOLD: usize = 5;
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 200.0;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [executor]
/// max_workers = 5
/// task_timeout = "30s"
///
/// [guard]
/// lock_timeout = "5s"
/// cleanup_interval = "0s"   # disable idle sweeps
///
/// [rules]
/// risky_keywords = ["delete", "pay"]
/// ```
///
/// All sections are optional. This is the unvalidated shape; it only
/// becomes a [`SchedulerConfig`] through `TryFrom` (see `validate.rs`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub executor: RawExecutorSection,

    #[serde(default)]
    pub guard: RawGuardSection,

    #[serde(default)]
    pub rules: RulesConfig,
}

/// `[executor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawExecutorSection {
    /// Absolute cap on the per-group worker pool.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-task timeout, e.g. `"30s"`.
    #[serde(default = "default_task_timeout")]
    pub task_timeout: String,

    /// Overall wait for one parallel group.
    #[serde(default = "default_group_timeout")]
    pub group_timeout: String,

    /// Extra wait after a group timeout before stragglers are written off.
    #[serde(default = "default_grace_period")]
    pub grace_period: String,

    /// `false` runs every group serially.
    #[serde(default = "default_true")]
    pub enable_parallel: bool,

    /// `"advisory"` (default) or `"serial"`.
    #[serde(default)]
    pub fallback_policy: FallbackPolicy,
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_task_timeout() -> String {
    "30s".to_string()
}

fn default_group_timeout() -> String {
    "60s".to_string()
}

fn default_grace_period() -> String {
    "5s".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RawExecutorSection {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            task_timeout: default_task_timeout(),
            group_timeout: default_group_timeout(),
            grace_period: default_grace_period(),
            enable_parallel: default_true(),
            fallback_policy: FallbackPolicy::default(),
        }
    }
}

/// `[guard]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGuardSection {
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Conflicts tolerated before the fallback flag flips.
    #[serde(default = "default_conflict_threshold")]
    pub conflict_threshold: usize,

    /// Minimum spacing between idle sweeps; `"0s"` disables sweeping.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: String,

    /// Idle age after which an unlocked record is reclaimed. Defaults to
    /// `cleanup_interval`.
    #[serde(default)]
    pub max_idle: Option<String>,
}

fn default_lock_timeout() -> String {
    "5s".to_string()
}

fn default_poll_interval() -> String {
    "100ms".to_string()
}

fn default_conflict_threshold() -> usize {
    DEFAULT_CONFLICT_THRESHOLD
}

fn default_cleanup_interval() -> String {
    "300s".to_string()
}

impl Default for RawGuardSection {
    fn default() -> Self {
        Self {
            lock_timeout: default_lock_timeout(),
            poll_interval: default_poll_interval(),
            conflict_threshold: default_conflict_threshold(),
            cleanup_interval: default_cleanup_interval(),
            max_idle: None,
        }
    }
}

/// `[rules]` section: keyword tables and thresholds for the standard rules.
///
/// Keywords are case-insensitive substrings. Any table left out of the file
/// keeps its built-in default; a table given as `[]` disables whatever
/// depends on it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RulesConfig {
    /// Maximum distance for the state-gate rule.
    #[serde(default = "default_proximity_threshold")]
    pub proximity_threshold: f64,

    #[serde(default = "default_submit_keywords")]
    pub submit_keywords: Vec<String>,

    #[serde(default = "default_state_trigger_keywords")]
    pub state_trigger_keywords: Vec<String>,

    #[serde(default = "default_dependent_action_keywords")]
    pub dependent_action_keywords: Vec<String>,

    /// Also the "unsafe to run in parallel" predicate.
    #[serde(default = "default_risky_keywords")]
    pub risky_keywords: Vec<String>,

    #[serde(default = "default_counter_pairs")]
    pub counter_pairs: Vec<CounterPairConfig>,
}

/// `[[rules.counter_pairs]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CounterPairConfig {
    pub increase: Vec<String>,
    pub decrease: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn default_proximity_threshold() -> f64 {
    DEFAULT_PROXIMITY_THRESHOLD
}

fn default_submit_keywords() -> Vec<String> {
    words(&[
        "submit", "save", "create", "register", "login", "提交", "保存", "创建", "注册", "登录",
        "发送",
    ])
}

fn default_state_trigger_keywords() -> Vec<String> {
    words(&[
        "agree", "accept", "confirm", "checkbox", "同意", "接受", "确认",
    ])
}

fn default_dependent_action_keywords() -> Vec<String> {
    words(&["register", "signup", "submit", "注册"])
}

fn default_risky_keywords() -> Vec<String> {
    words(&[
        "delete", "destroy", "remove", "pay", "checkout", "删除", "移除", "支付", "结算",
    ])
}

fn default_counter_pairs() -> Vec<CounterPairConfig> {
    vec![
        CounterPairConfig {
            increase: words(&["+", "add", "增加", "increment"]),
            decrease: words(&["-", "remove", "减少", "decrement"]),
        },
        CounterPairConfig {
            increase: words(&["up", "上", "previous"]),
            decrease: words(&["down", "下", "next"]),
        },
        CounterPairConfig {
            increase: words(&["open", "打开", "expand"]),
            decrease: words(&["close", "关闭", "collapse"]),
        },
    ]
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: default_proximity_threshold(),
            submit_keywords: default_submit_keywords(),
            state_trigger_keywords: default_state_trigger_keywords(),
            dependent_action_keywords: default_dependent_action_keywords(),
            risky_keywords: default_risky_keywords(),
            counter_pairs: default_counter_pairs(),
        }
    }
}

/// Validated executor settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    pub max_workers: usize,
    pub task_timeout: Duration,
    pub group_timeout: Duration,
    pub grace_period: Duration,
    pub enable_parallel: bool,
    pub fallback_policy: FallbackPolicy,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            task_timeout: DEFAULT_TASK_TIMEOUT,
            group_timeout: DEFAULT_GROUP_TIMEOUT,
            grace_period: DEFAULT_GRACE_PERIOD,
            enable_parallel: true,
            fallback_policy: FallbackPolicy::default(),
        }
    }
}

/// Validated conflict guard settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardConfig {
    pub lock_timeout: Duration,
    pub poll_interval: Duration,
    pub conflict_threshold: usize,
    /// `Duration::ZERO` disables idle sweeps.
    pub cleanup_interval: Duration,
    pub max_idle: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            conflict_threshold: DEFAULT_CONFLICT_THRESHOLD,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            max_idle: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

/// Validated configuration used by the rest of the crate.
///
/// `SchedulerConfig::default()` is what an empty file validates to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulerConfig {
    pub executor: ExecutorConfig,
    pub guard: GuardConfig,
    pub rules: RulesConfig,
}
