// src/context.rs

//! Process-wide, read-only state built once from the configuration.
//!
//! A [`Context`] owns every [`Watcher`] and the init task list. Watchers are
//! handed out as `Arc<Watcher>` so that jobs can point back at the watcher
//! that produced them; nothing mutates a watcher after construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::model::{ConfigFile, ConfigSection, TaskConfig, WatcherConfig};
use crate::errors::{Result, WatchjobError};
use crate::sink::{ConsoleSink, LogSink};
use crate::types::{DetectMode, OutputMode};

/// A single command plus whether to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub command: String,
    pub detached: bool,
}

impl Task {
    pub fn new(command: impl Into<String>, detached: bool) -> Self {
        Self {
            command: command.into(),
            detached,
        }
    }

    pub fn blocking(command: impl Into<String>) -> Self {
        Self::new(command, false)
    }

    pub fn detached(command: impl Into<String>) -> Self {
        Self::new(command, true)
    }
}

impl From<&TaskConfig> for Task {
    fn from(cfg: &TaskConfig) -> Self {
        Task::new(cfg.command.clone(), cfg.nowait)
    }
}

/// What a watcher looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    /// Directory walked (poll) or subscribed to (notify).
    pub directory: PathBuf,
    /// Include globs, relative to `directory`.
    pub watch: Vec<String>,
    /// Exclude globs, relative to `directory`.
    pub exclude: Vec<String>,
    pub detect: DetectMode,
    pub use_hash: bool,
}

impl WatchTarget {
    /// Watch every file under `directory` by polling.
    pub fn directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            watch: vec!["**/*".to_string()],
            exclude: Vec::new(),
            detect: DetectMode::Poll,
            use_hash: false,
        }
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.directory.display(), self.watch)?;
        if !self.exclude.is_empty() {
            write!(f, " exclude {:?}", self.exclude)?;
        }
        Ok(())
    }
}

/// An independently running unit: target, interval, task list and sink.
pub struct Watcher {
    name: String,
    target: WatchTarget,
    interval: Duration,
    tasks: Vec<Task>,
    sink: Arc<dyn LogSink>,
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("interval", &self.interval)
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl Watcher {
    pub fn new(
        name: impl Into<String>,
        target: WatchTarget,
        interval: Duration,
        tasks: Vec<Task>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            interval,
            tasks,
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    /// Write a line through this watcher's sink.
    pub fn log(&self, msg: &str) {
        self.sink.line(msg);
    }
}

/// Immutable process-wide settings derived from config and CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Interval for watchers that do not set their own.
    pub interval: Duration,
    pub job_capacity: usize,
    pub output: OutputMode,
}

impl Settings {
    /// `cli_interval_ms` (from `--interval`) overrides `config.interval_ms`.
    pub fn resolve(section: &ConfigSection, cli_interval_ms: Option<u64>) -> Result<Self> {
        let interval_ms = cli_interval_ms.unwrap_or(section.interval_ms);
        if interval_ms == 0 {
            return Err(WatchjobError::ConfigError(
                "interval must be >= 1 ms (got 0)".to_string(),
            ));
        }
        Ok(Self {
            interval: Duration::from_millis(interval_ms),
            job_capacity: section.job_capacity,
            output: section.output,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(crate::config::DEFAULT_INTERVAL_MS),
            job_capacity: crate::config::DEFAULT_JOB_CAPACITY,
            output: OutputMode::default(),
        }
    }
}

/// Everything configured: settings, watchers and init tasks.
#[derive(Debug)]
pub struct Context {
    settings: Settings,
    watchers: Vec<Arc<Watcher>>,
    init_tasks: Vec<Task>,
}

impl Context {
    pub fn new(settings: Settings, watchers: Vec<Watcher>, init_tasks: Vec<Task>) -> Self {
        Self {
            settings,
            watchers: watchers.into_iter().map(Arc::new).collect(),
            init_tasks,
        }
    }

    /// Build the context from a validated config.
    ///
    /// Relative watcher directories are resolved against `root` (normally
    /// the directory holding the config file).
    pub fn from_config(cfg: &ConfigFile, root: &Path, cli_interval_ms: Option<u64>) -> Result<Self> {
        let settings = Settings::resolve(cfg.config_section(), cli_interval_ms)?;

        let watchers = cfg
            .watchers()
            .iter()
            .enumerate()
            .map(|(idx, w)| build_watcher(idx, w, root, &settings))
            .collect();

        let init_tasks = cfg.init_tasks().iter().map(Task::from).collect();

        Ok(Self::new(settings, watchers, init_tasks))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn watchers(&self) -> &[Arc<Watcher>] {
        &self.watchers
    }

    pub fn init_tasks(&self) -> &[Task] {
        &self.init_tasks
    }
}

fn build_watcher(idx: usize, cfg: &WatcherConfig, root: &Path, settings: &Settings) -> Watcher {
    let name = cfg
        .name
        .clone()
        .unwrap_or_else(|| format!("watcher-{idx}"));

    let directory = if cfg.directory.is_absolute() {
        cfg.directory.clone()
    } else {
        root.join(&cfg.directory)
    };

    let target = WatchTarget {
        directory,
        watch: cfg.effective_watch(),
        exclude: cfg.exclude.clone(),
        detect: cfg.detect,
        use_hash: cfg.use_hash,
    };

    let interval = cfg
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or(settings.interval);

    let tasks = cfg.tasks.iter().map(Task::from).collect();
    let sink: Arc<dyn LogSink> = Arc::new(ConsoleSink::for_watcher(&name));

    Watcher::new(name, target, interval, tasks, sink)
}
