// src/config/mod.rs

//! Configuration loading and validation for watchjob.
//!
//! Responsibilities:
//! - Define the serde-backed data model (`model.rs`).
//! - Load a config file from disk in YAML, JSON or TOML (`loader.rs`).
//! - Validate basic invariants before anything starts (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str, ConfigFormat};
pub use model::{
    ConfigFile, ConfigSection, RawConfigFile, TaskConfig, WatcherConfig, DEFAULT_INTERVAL_MS,
    DEFAULT_JOB_CAPACITY, MAX_JOB_CAPACITY,
};
