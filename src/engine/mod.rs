// src/engine/mod.rs

//! Job pipeline for watchjob.
//!
//! This module ties together:
//! - the [`Job`] message produced by a watcher when its target changed
//! - the bounded job channel shared by all watchers ([`channel`])
//! - the single dispatcher loop that runs each job's task list
//!   ([`dispatcher`]), plus the init-task runner that uses the same rules
//!   before any watcher starts.

use std::fmt;
use std::sync::Arc;

use crate::context::Watcher;

/// A watcher fired: run its tasks.
///
/// Jobs carry no identity beyond their trip through the channel.
#[derive(Clone)]
pub struct Job {
    pub watcher: Arc<Watcher>,
    pub message: String,
}

impl Job {
    pub fn new(watcher: Arc<Watcher>, message: impl Into<String>) -> Self {
        Self {
            watcher,
            message: message.into(),
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("watcher", &self.watcher.name())
            .field("message", &self.message)
            .finish()
    }
}

pub mod channel;
pub mod dispatcher;

pub use channel::{job_channel, JobReceiver, JobSender};
pub use dispatcher::{execute_tasks, run_init_tasks, Dispatcher, ExecSummary};
