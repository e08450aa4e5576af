// src/config/validate.rs

use std::collections::HashSet;

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile, MAX_JOB_CAPACITY};
use crate::errors::{Result, WatchjobError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::WatchjobError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.config,
            raw.init_tasks,
            raw.watchers,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_work(cfg)?;
    validate_global_config(cfg)?;
    validate_watchers(cfg)?;
    Ok(())
}

fn ensure_has_work(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watchers.is_empty() && cfg.init_tasks.is_empty() {
        return Err(WatchjobError::ConfigError(
            "config must contain at least one watcher or init task".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.job_capacity == 0 {
        return Err(WatchjobError::ConfigError(
            "config.job_capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.job_capacity > MAX_JOB_CAPACITY {
        return Err(WatchjobError::ConfigError(format!(
            "config.job_capacity must be <= {MAX_JOB_CAPACITY} (got {})",
            cfg.config.job_capacity
        )));
    }
    if cfg.config.interval_ms == 0 {
        return Err(WatchjobError::ConfigError(
            "config.interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_watchers(cfg: &RawConfigFile) -> Result<()> {
    let mut names = HashSet::new();

    for (idx, watcher) in cfg.watchers.iter().enumerate() {
        let label = watcher
            .name
            .clone()
            .unwrap_or_else(|| format!("watcher-{idx}"));

        if !names.insert(label.clone()) {
            return Err(WatchjobError::ConfigError(format!(
                "duplicate watcher name '{label}'"
            )));
        }

        if watcher.interval_ms == Some(0) {
            return Err(WatchjobError::ConfigError(format!(
                "watcher '{label}': interval_ms must be >= 1 (got 0)"
            )));
        }

        for pat in watcher.effective_watch().iter().chain(watcher.exclude.iter()) {
            if let Err(e) = Glob::new(pat) {
                return Err(WatchjobError::ConfigError(format!(
                    "watcher '{label}': invalid glob pattern '{pat}': {e}"
                )));
            }
        }
    }
    Ok(())
}
