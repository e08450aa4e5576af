// src/engine/dispatcher.rs

//! The single consumer of the job channel.
//!
//! Jobs are handled strictly one at a time: a job's whole task list is
//! processed before the next job is received, so task execution of two jobs
//! never interleaves. Within a job, tasks run in declared order; a blocking
//! task finishes before the next one starts, a detached one is only started.
//! A failing task is logged and never stops the remaining tasks or the loop.

use std::sync::Arc;

use tracing::{debug, info};

use crate::context::Task;
use crate::errors::Result;
use crate::exec::TaskRunner;
use crate::sink::{LogSink, TracingSink};

use super::{Job, JobReceiver};

/// Counts of a task list run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Drains the job channel and runs each job's tasks through `R`.
pub struct Dispatcher<R: TaskRunner> {
    jobs: JobReceiver,
    runner: R,
}

impl<R: TaskRunner> std::fmt::Debug for Dispatcher<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl<R: TaskRunner> Dispatcher<R> {
    pub fn new(jobs: JobReceiver, runner: R) -> Self {
        Self { jobs, runner }
    }

    /// Main loop.
    ///
    /// Only returns once every `JobSender` has been dropped, which does not
    /// happen while a watcher is running.
    pub async fn run(mut self) -> Result<()> {
        info!("dispatcher started");

        while let Some(job) = self.jobs.recv().await {
            self.handle_job(job).await;
        }

        info!("job channel closed; dispatcher exiting");
        Ok(())
    }

    async fn handle_job(&self, job: Job) {
        let watcher = &job.watcher;
        debug!(watcher = %watcher.name(), message = %job.message, "dispatching job");

        watcher.log(&job.message);
        let summary = execute_tasks(&self.runner, watcher.tasks(), watcher.sink()).await;

        debug!(
            watcher = %watcher.name(),
            succeeded = summary.succeeded,
            failed = summary.failed,
            "job finished"
        );
    }
}

/// Run `tasks` in order, writing status lines to `sink`.
///
/// Lines, per task:
/// - blocking: `execute: <cmd>` then `end: <cmd>` or `An error occurred: <err>`
/// - detached: `execute(nowait): <cmd>` then `end(nowait): <cmd>` once the
///   process started, or `An error occurred: <err>`
pub async fn execute_tasks<R>(runner: &R, tasks: &[Task], sink: &Arc<dyn LogSink>) -> ExecSummary
where
    R: TaskRunner + ?Sized,
{
    let mut summary = ExecSummary::default();

    for task in tasks {
        let command = task.command.as_str();

        let result = if task.detached {
            sink.line(&format!("execute(nowait): {command}"));
            runner.spawn(command, sink)
        } else {
            sink.line(&format!("execute: {command}"));
            runner.run(command, sink).await
        };

        match result {
            Ok(()) => {
                summary.succeeded += 1;
                if task.detached {
                    sink.line(&format!("end(nowait): {command}"));
                } else {
                    sink.line(&format!("end: {command}"));
                }
            }
            Err(err) => {
                summary.failed += 1;
                debug!(cmd = %command, error = %err, "task failed");
                sink.line(&format!("An error occurred: {err}"));
            }
        }
    }

    summary
}

/// Run the init tasks once, with no owning watcher.
///
/// Status lines go through the default logger ([`TracingSink`]).
pub async fn run_init_tasks<R>(runner: &R, tasks: &[Task]) -> ExecSummary
where
    R: TaskRunner + ?Sized,
{
    if tasks.is_empty() {
        return ExecSummary::default();
    }

    info!(count = tasks.len(), "running init tasks");
    let sink: Arc<dyn LogSink> = Arc::new(TracingSink);
    let summary = execute_tasks(runner, tasks, &sink).await;
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "init tasks finished"
    );
    summary
}
