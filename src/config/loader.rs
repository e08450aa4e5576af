// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatchjobError};

/// File names tried, in order, when no `--config` is given.
pub const DEFAULT_CONFIG_FILES: [&str; 4] = [
    "watchjob.yml",
    "watchjob.yaml",
    "watchjob.json",
    "watchjob.toml",
];

/// Serialization format of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("yml") | Some("yaml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => Err(WatchjobError::ConfigError(format!(
                "unsupported config file extension for {:?} (expected .yml, .yaml, .json or .toml)",
                path
            ))),
        }
    }
}

/// Deserialize a config from a string, without semantic validation.
pub fn load_from_str(contents: &str, format: ConfigFormat) -> Result<RawConfigFile> {
    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
        ConfigFormat::Json => serde_json::from_str(contents)?,
        ConfigFormat::Toml => toml::from_str(contents)?,
    };
    Ok(config)
}

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs deserialization; use [`load_and_validate`] for the
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let contents = fs::read_to_string(path)?;
    load_from_str(&contents, format)
}

/// Load a configuration file from path and run validation.
///
/// This is the entry point for the rest of the application. Any error here
/// is fatal: nothing has been started yet.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Find the config file to use when none was given on the command line.
///
/// Looks for the names in [`DEFAULT_CONFIG_FILES`] inside `dir`.
pub fn default_config_path(dir: &Path) -> Result<PathBuf> {
    DEFAULT_CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .ok_or_else(|| {
            WatchjobError::ConfigError(format!(
                "no config file found in {:?} (looked for {})",
                dir,
                DEFAULT_CONFIG_FILES.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_picked_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/watchjob.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("watchjob.YAML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("watchjob.json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("watchjob.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(ConfigFormat::from_path(Path::new("watchjob.ini")).is_err());
        assert!(ConfigFormat::from_path(Path::new("watchjob")).is_err());
    }

    #[test]
    fn yaml_json_and_toml_parse_to_the_same_shape() {
        let yaml = r#"
init_tasks:
  - command: echo init
watchers:
  - directory: src
    excludes: ["*.tmp"]
    tasks:
      - command: echo a
      - command: sleep 5
        nowait: true
"#;
        let json = r#"{
  "init_tasks": [{"command": "echo init"}],
  "watchers": [{
    "directory": "src",
    "excludes": ["*.tmp"],
    "tasks": [{"command": "echo a"}, {"command": "sleep 5", "nowait": true}]
  }]
}"#;
        let toml_src = r#"
[[init_tasks]]
command = "echo init"

[[watchers]]
directory = "src"
excludes = ["*.tmp"]

[[watchers.tasks]]
command = "echo a"

[[watchers.tasks]]
command = "sleep 5"
nowait = true
"#;

        for (src, format) in [
            (yaml, ConfigFormat::Yaml),
            (json, ConfigFormat::Json),
            (toml_src, ConfigFormat::Toml),
        ] {
            let raw = load_from_str(src, format).unwrap();
            assert_eq!(raw.init_tasks.len(), 1, "{format:?}");
            assert_eq!(raw.watchers.len(), 1, "{format:?}");
            let w = &raw.watchers[0];
            assert_eq!(w.directory, PathBuf::from("src"));
            assert_eq!(w.exclude, vec!["*.tmp".to_string()]);
            assert_eq!(w.tasks.len(), 2);
            assert!(!w.tasks[0].nowait);
            assert!(w.tasks[1].nowait);
            assert_eq!(raw.config.job_capacity, crate::config::DEFAULT_JOB_CAPACITY);
        }
    }
}
