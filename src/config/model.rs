// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{DetectMode, OutputMode};

/// Default interval (ms) between two checks of a watcher's target.
pub const DEFAULT_INTERVAL_MS: u64 = 500;

/// Default capacity of the job channel between watchers and the dispatcher.
pub const DEFAULT_JOB_CAPACITY: usize = 100;

/// Largest accepted job channel capacity.
pub const MAX_JOB_CAPACITY: usize = 1_000_000;

/// Top-level configuration as read from a YAML, JSON or TOML file.
///
/// ```yaml
/// config:
///   interval_ms: 500
///   job_capacity: 100
///
/// init_tasks:
///   - command: cargo --version
///
/// watchers:
///   - name: rust
///     directory: src
///     extension: rs
///     tasks:
///       - command: cargo build
///       - command: ./target/debug/server
///         nowait: true
/// ```
///
/// This is the unchecked, freshly deserialized shape. Use
/// [`ConfigFile::try_from`] (or the loader) to get a validated config.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Global behaviour from `config:`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Tasks run once at startup, before any watcher starts.
    #[serde(default)]
    pub init_tasks: Vec<TaskConfig>,

    /// Watchers, in declared order.
    #[serde(default)]
    pub watchers: Vec<WatcherConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holding one means the
/// checks in `validate.rs` passed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    init_tasks: Vec<TaskConfig>,
    watchers: Vec<WatcherConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        init_tasks: Vec<TaskConfig>,
        watchers: Vec<WatcherConfig>,
    ) -> Self {
        Self {
            config,
            init_tasks,
            watchers,
        }
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    pub fn init_tasks(&self) -> &[TaskConfig] {
        &self.init_tasks
    }

    pub fn watchers(&self) -> &[WatcherConfig] {
        &self.watchers
    }
}

/// `config:` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Default interval between two checks, for watchers that do not set
    /// their own.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Capacity of the job channel. A watcher that finds the channel full
    /// waits until the dispatcher catches up.
    #[serde(default = "default_job_capacity")]
    pub job_capacity: usize,

    /// What to do with the stdout/stderr of executed commands.
    #[serde(default)]
    pub output: OutputMode,
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

fn default_job_capacity() -> usize {
    DEFAULT_JOB_CAPACITY
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            job_capacity: default_job_capacity(),
            output: OutputMode::default(),
        }
    }
}

/// One entry of `watchers:`.
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    /// Label used to prefix this watcher's output. Defaults to
    /// `watcher-<index>`.
    #[serde(default)]
    pub name: Option<String>,

    /// Directory to watch, relative to the working directory.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Shorthand for a `**/*.<extension>` watch pattern.
    #[serde(default)]
    pub extension: Option<String>,

    /// Glob patterns (relative to `directory`) of files to watch.
    ///
    /// If empty and no `extension` is set, every file is watched.
    #[serde(default)]
    pub watch: Vec<String>,

    /// Glob patterns of files to ignore.
    #[serde(default, alias = "excludes")]
    pub exclude: Vec<String>,

    /// Per-watcher interval override.
    #[serde(default)]
    pub interval_ms: Option<u64>,

    #[serde(default)]
    pub detect: DetectMode,

    /// Only count a file as modified when its content hash changed.
    #[serde(default)]
    pub use_hash: bool,

    /// Tasks run, in order, every time this watcher fires.
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

impl WatcherConfig {
    /// Effective watch patterns: `watch` plus the `extension` shorthand,
    /// or everything if neither is set.
    pub fn effective_watch(&self) -> Vec<String> {
        let mut patterns = self.watch.clone();
        if let Some(ext) = &self.extension {
            let ext = ext.trim_start_matches('.');
            patterns.push(format!("**/*.{ext}"));
        }
        if patterns.is_empty() {
            patterns.push("**/*".to_string());
        }
        patterns
    }
}

/// A single command of a task list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TaskConfig {
    /// Program and arguments, split on whitespace.
    pub command: String,

    /// Start the command without waiting for it to finish.
    #[serde(default)]
    pub nowait: bool,
}
