#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use watchjob::config::{ConfigFile, RawConfigFile, TaskConfig, WatcherConfig};
use watchjob::context::{Task, WatchTarget, Watcher};
use watchjob::sink::{LogSink, MemorySink};
use watchjob::types::DetectMode;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_init_task(mut self, command: &str, nowait: bool) -> Self {
        self.config.init_tasks.push(TaskConfig {
            command: command.to_string(),
            nowait,
        });
        self
    }

    pub fn with_watcher(mut self, watcher: WatcherConfig) -> Self {
        self.config.watchers.push(watcher);
        self
    }

    pub fn with_interval_ms(mut self, ms: u64) -> Self {
        self.config.config.interval_ms = ms;
        self
    }

    pub fn with_job_capacity(mut self, capacity: usize) -> Self {
        self.config.config.job_capacity = capacity;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `WatcherConfig`.
pub struct WatcherConfigBuilder {
    watcher: WatcherConfig,
}

impl WatcherConfigBuilder {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            watcher: WatcherConfig {
                name: None,
                directory: directory.into(),
                extension: None,
                watch: vec![],
                exclude: vec![],
                interval_ms: None,
                detect: DetectMode::Poll,
                use_hash: false,
                tasks: vec![],
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.watcher.name = Some(name.to_string());
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.watcher.watch.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.watcher.exclude.push(pattern.to_string());
        self
    }

    pub fn interval_ms(mut self, ms: u64) -> Self {
        self.watcher.interval_ms = Some(ms);
        self
    }

    pub fn task(mut self, command: &str) -> Self {
        self.watcher.tasks.push(TaskConfig {
            command: command.to_string(),
            nowait: false,
        });
        self
    }

    pub fn nowait_task(mut self, command: &str) -> Self {
        self.watcher.tasks.push(TaskConfig {
            command: command.to_string(),
            nowait: true,
        });
        self
    }

    pub fn build(self) -> WatcherConfig {
        self.watcher
    }
}

/// A watcher over a placeholder target whose sink records into the
/// returned `MemorySink`.
pub fn memory_watcher(name: &str, tasks: Vec<Task>) -> (Arc<Watcher>, MemorySink) {
    let mem = MemorySink::new();
    let sink: Arc<dyn LogSink> = Arc::new(mem.clone());
    let watcher = Watcher::new(
        name,
        WatchTarget::directory("."),
        Duration::from_millis(10),
        tasks,
        sink,
    );
    (Arc::new(watcher), mem)
}
