use std::collections::HashSet;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use watchjob::exec::{ExecError, TaskRunner};
use watchjob::sink::LogSink;

/// What the runner was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A blocking run began.
    Started(String),
    /// A blocking run ended.
    Finished(String),
    /// A detached command was started.
    Spawned(String),
}

/// A fake runner that:
/// - records every run/spawn without starting processes
/// - optionally holds each blocking run for `delay`
/// - fails the commands listed in `failing` with a spawn error.
///
/// Clones share the same record, so keep one clone after handing the runner
/// to a dispatcher.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    events: Arc<Mutex<Vec<RunEvent>>>,
    delay: Duration,
    failing: Arc<HashSet<String>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, commands: &[&str]) -> Self {
        self.failing = Arc::new(commands.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Commands in the order they were started (blocking or detached).
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RunEvent::Started(c) | RunEvent::Spawned(c) => Some(c),
                RunEvent::Finished(_) => None,
            })
            .collect()
    }

    fn push(&self, event: RunEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn outcome(&self, command: &str) -> Result<(), ExecError> {
        if command.trim().is_empty() {
            return Err(ExecError::EmptyCommand);
        }
        if self.failing.contains(command) {
            return Err(ExecError::Spawn {
                program: command.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "simulated failure"),
            });
        }
        Ok(())
    }
}

impl TaskRunner for RecordingRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
        _sink: &'a Arc<dyn LogSink>,
    ) -> Pin<Box<dyn Future<Output = Result<(), ExecError>> + Send + 'a>> {
        Box::pin(async move {
            self.push(RunEvent::Started(command.to_string()));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.push(RunEvent::Finished(command.to_string()));
            self.outcome(command)
        })
    }

    fn spawn(&self, command: &str, _sink: &Arc<dyn LogSink>) -> Result<(), ExecError> {
        self.push(RunEvent::Spawned(command.to_string()));
        self.outcome(command)
    }
}
