// src/exec/runner.rs

//! Pluggable runner abstraction.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::ExitStatus;
use std::sync::Arc;

use thiserror::Error;

use crate::sink::LogSink;

/// Why a single task failed.
///
/// The `Display` form is what ends up after `An error occurred: `.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("empty command")]
    EmptyCommand,

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for process: {0}")]
    Wait(#[source] io::Error),

    #[error("{}", describe_status(.0))]
    Exit(ExitStatus),
}

fn describe_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Split a command line into program and arguments.
///
/// Splitting is purely on whitespace: no quoting, expansion or pipes.
pub fn split_command(command: &str) -> Result<(&str, Vec<&str>), ExecError> {
    let mut tokens = command.split_whitespace();
    let program = tokens.next().ok_or(ExecError::EmptyCommand)?;
    Ok((program, tokens.collect()))
}

/// Trait abstracting how a task's command is executed.
///
/// Production code uses [`super::ProcessRunner`]; tests can provide an
/// implementation that records calls instead of spawning processes.
pub trait TaskRunner: Send + Sync {
    /// Run `command` to completion.
    ///
    /// Resolves once the process exited (and, if its output is forwarded
    /// through `sink`, once all of it has been written).
    fn run<'a>(
        &'a self,
        command: &'a str,
        sink: &'a Arc<dyn LogSink>,
    ) -> Pin<Box<dyn Future<Output = Result<(), ExecError>> + Send + 'a>>;

    /// Start `command` and return as soon as it is running.
    ///
    /// The child is never awaited by the caller.
    fn spawn(&self, command: &str, sink: &Arc<dyn LogSink>) -> Result<(), ExecError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_command_splits_on_any_whitespace() {
        let (program, args) = split_command("  echo   hello\tworld ").unwrap();
        assert_eq!(program, "echo");
        assert_eq!(args, vec!["hello", "world"]);
    }

    #[test]
    fn split_command_keeps_quotes_verbatim() {
        let (program, args) = split_command("echo 'a b'").unwrap();
        assert_eq!(program, "echo");
        assert_eq!(args, vec!["'a", "b'"]);
    }

    #[test]
    fn empty_or_blank_command_is_an_error() {
        assert!(matches!(split_command(""), Err(ExecError::EmptyCommand)));
        assert!(matches!(split_command("   "), Err(ExecError::EmptyCommand)));
        assert_eq!(ExecError::EmptyCommand.to_string(), "empty command");
    }
}
