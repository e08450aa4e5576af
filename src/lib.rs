// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod sink;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate};
use crate::context::{Context, Task};
use crate::engine::{job_channel, run_init_tasks, Dispatcher};
use crate::errors::Result;
use crate::exec::{ProcessRunner, TaskRunner};
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::launch_watchers;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (the only fatal error path)
/// - context construction
/// - init tasks, watchers and the dispatcher, via [`run_context`]
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path(&std::env::current_dir()?)?,
    };
    info!(config = ?config_path, "loading config");

    let cfg = load_and_validate(&config_path)?;
    let root = config_root_dir(&config_path);
    let ctx = Context::from_config(&cfg, &root, args.interval)?;

    if args.dry_run {
        print_dry_run(&config_path, &ctx);
        return Ok(());
    }

    let runner = ProcessRunner::new(ctx.settings().output);
    run_context(ctx, runner, Arc::new(RealFileSystem)).await
}

/// Bring-up order for a built context:
///
/// 1. init tasks, sequentially, with no watcher attached
/// 2. one detection loop per watcher, all sharing one bounded job channel
/// 3. the dispatcher, draining that channel until Ctrl-C
pub async fn run_context<R>(ctx: Context, runner: R, fs: Arc<dyn FileSystem>) -> Result<()>
where
    R: TaskRunner + 'static,
{
    run_init_tasks(&runner, ctx.init_tasks()).await;

    let (jobs_tx, jobs_rx) = job_channel(ctx.settings().job_capacity);
    let _watchers = launch_watchers(&ctx, &jobs_tx, fs)?;
    // Only watcher loops hold senders from here on.
    drop(jobs_tx);

    let dispatcher = Dispatcher::new(jobs_rx, runner);

    tokio::select! {
        res = dispatcher.run() => res,
        _ = shutdown_signal() => {
            info!("shutdown requested; exiting");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Figure out the directory relative watcher paths are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "configs/watchjob.yml"),
///   we use that directory.
/// - If it's just a bare filename like "watchjob.yml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn describe_task(task: &Task) -> String {
    if task.detached {
        format!("{} (nowait)", task.command)
    } else {
        task.command.clone()
    }
}

/// Simple dry-run output: settings, init tasks and watchers.
fn print_dry_run(config_path: &Path, ctx: &Context) {
    let settings = ctx.settings();

    println!("watchjob dry-run");
    println!("  config = {}", config_path.display());
    println!("  interval_ms = {}", settings.interval.as_millis());
    println!("  job_capacity = {}", settings.job_capacity);
    println!("  output = {:?}", settings.output);
    println!();

    println!("init tasks ({}):", ctx.init_tasks().len());
    for task in ctx.init_tasks() {
        println!("  - {}", describe_task(task));
    }
    println!();

    println!("watchers ({}):", ctx.watchers().len());
    for watcher in ctx.watchers() {
        let target = watcher.target();
        println!("  - {}", watcher.name());
        println!("      directory: {}", target.directory.display());
        println!("      watch: {:?}", target.watch);
        if !target.exclude.is_empty() {
            println!("      exclude: {:?}", target.exclude);
        }
        println!("      detect: {:?}", target.detect);
        if target.use_hash {
            println!("      use_hash: true");
        }
        println!("      interval_ms: {}", watcher.interval().as_millis());
        println!("      tasks:");
        for task in watcher.tasks() {
            println!("        - {}", describe_task(task));
        }
    }

    debug!("dry-run complete (no execution)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_root_prefers_config_parent() {
        assert_eq!(
            config_root_dir(Path::new("configs/watchjob.yml")),
            PathBuf::from("configs")
        );
        assert_eq!(
            config_root_dir(Path::new("watchjob.yml")),
            std::env::current_dir().unwrap()
        );
    }

    #[test]
    fn nowait_tasks_are_marked_in_dry_run() {
        assert_eq!(describe_task(&Task::blocking("make")), "make");
        assert_eq!(describe_task(&Task::detached("serve")), "serve (nowait)");
    }
}
