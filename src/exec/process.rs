// src/exec/process.rs

//! Production runner backed by `tokio::process::Command`.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::exec::runner::{split_command, ExecError, TaskRunner};
use crate::sink::LogSink;
use crate::types::OutputMode;

/// How long forwarders may keep reading after the child exited.
///
/// Grandchildren that inherited the pipes keep them open after the direct
/// child is gone; their output is not waited for past this point.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Spawns each task as an OS process.
///
/// With [`OutputMode::Inherit`] the child shares this process's
/// stdout/stderr. With [`OutputMode::Prefixed`] both streams are piped and
/// forwarded line by line through the sink of whoever owns the task.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    output: OutputMode,
}

impl ProcessRunner {
    pub fn new(output: OutputMode) -> Self {
        Self { output }
    }

    fn start(
        &self,
        command: &str,
        sink: &Arc<dyn LogSink>,
    ) -> Result<(Child, Vec<JoinHandle<()>>), ExecError> {
        let (program, args) = split_command(command)?;

        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null());

        match self.output {
            OutputMode::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputMode::Prefixed => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let mut forwarders = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            forwarders.push(forward_lines(stdout, Arc::clone(sink), false));
        }
        if let Some(stderr) = child.stderr.take() {
            forwarders.push(forward_lines(stderr, Arc::clone(sink), true));
        }

        Ok((child, forwarders))
    }
}

impl TaskRunner for ProcessRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
        sink: &'a Arc<dyn LogSink>,
    ) -> Pin<Box<dyn Future<Output = Result<(), ExecError>> + Send + 'a>> {
        Box::pin(async move {
            let (mut child, forwarders) = self.start(command, sink)?;

            let status = child.wait().await.map_err(ExecError::Wait)?;

            // Drain what the child wrote before the caller logs `end:`.
            let deadline = tokio::time::Instant::now() + OUTPUT_DRAIN_GRACE;
            for mut handle in forwarders {
                if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
                    debug!(cmd = %command, "output still open after exit; detaching forwarder");
                    handle.abort();
                }
            }

            debug!(
                cmd = %command,
                exit_code = status.code().unwrap_or(-1),
                success = status.success(),
                "task process exited"
            );

            if status.success() {
                Ok(())
            } else {
                Err(ExecError::Exit(status))
            }
        })
    }

    fn spawn(&self, command: &str, sink: &Arc<dyn LogSink>) -> Result<(), ExecError> {
        let (mut child, _forwarders) = self.start(command, sink)?;

        // Reap in the background so detached children do not linger as
        // zombies. Nobody waits on this task.
        let cmd = command.to_string();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!(
                    cmd = %cmd,
                    exit_code = status.code().unwrap_or(-1),
                    "detached process exited"
                ),
                Err(e) => debug!(cmd = %cmd, error = %e, "failed waiting for detached process"),
            }
        });

        Ok(())
    }
}

/// Forward every line of `reader` into `sink` until EOF.
fn forward_lines<R>(reader: R, sink: Arc<dyn LogSink>, stderr: bool) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if stderr {
                sink.error_line(&line);
            } else {
                sink.line(&line);
            }
        }
    })
}
