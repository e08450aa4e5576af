// src/sink.rs

//! Destinations for task status lines (`execute: ...`, `end: ...`).
//!
//! Every watcher owns one sink so that the lines it produces, and optionally
//! the output of the commands it runs, can be attributed to it. Init tasks
//! have no watcher and go through [`TracingSink`], the process-wide default.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

/// A line-oriented output destination.
pub trait LogSink: Send + Sync + fmt::Debug {
    /// Write one status or stdout line.
    fn line(&self, msg: &str);

    /// Write one line coming from a child's stderr.
    fn error_line(&self, msg: &str) {
        self.line(msg);
    }
}

/// Writes `"<prefix><line>"` to this process's stdout (stderr lines go to
/// stderr).
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    prefix: String,
}

impl ConsoleSink {
    /// Sink whose lines start with `"[<name>] "`.
    pub fn for_watcher(name: &str) -> Self {
        Self {
            prefix: format!("[{name}] "),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl LogSink for ConsoleSink {
    fn line(&self, msg: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}{}", self.prefix, msg);
        let _ = out.flush();
    }

    fn error_line(&self, msg: &str) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}{}", self.prefix, msg);
    }
}

/// The default logger: every line becomes a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn line(&self, msg: &str) {
        info!(target: "watchjob::task", "{msg}");
    }

    fn error_line(&self, msg: &str) {
        warn!(target: "watchjob::task", "{msg}");
    }
}

/// Keeps every line in memory. Clones share the same buffer.
///
/// Used by tests to assert on the exact sequence of status lines.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl LogSink for MemorySink {
    fn line(&self, msg: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_clones_share_lines() {
        let sink = MemorySink::new();
        let other = sink.clone();
        sink.line("a");
        other.error_line("b");
        assert_eq!(sink.lines(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn console_sink_prefix_uses_watcher_name() {
        assert_eq!(ConsoleSink::for_watcher("rust").prefix(), "[rust] ");
        assert_eq!(ConsoleSink::default().prefix(), "");
    }
}
