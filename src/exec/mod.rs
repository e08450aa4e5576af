// src/exec/mod.rs

//! Process execution layer.
//!
//! The dispatcher talks to a [`TaskRunner`] instead of spawning processes
//! itself. This keeps the ordering/logging rules in `engine` testable with a
//! fake runner while [`ProcessRunner`] does the real work with
//! `tokio::process::Command`.
//!
//! - [`runner`] defines the `TaskRunner` trait and command splitting.
//! - [`process`] is the production runner.

pub mod process;
pub mod runner;

pub use process::ProcessRunner;
pub use runner::{split_command, ExecError, TaskRunner};
