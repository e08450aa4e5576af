// src/watch/watcher.rs

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::context::{Context, Watcher};
use crate::engine::{Job, JobSender};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::watch::detector::{detector_for, ChangeDetector};

/// Spawn the detection loop of one watcher.
///
/// Every `watcher.interval()` the detector is asked whether the target
/// changed; a change becomes exactly one [`Job`] on `jobs`. While the channel
/// is full the send waits, and so does the loop: changes made meanwhile are
/// picked up, coalesced, by the next check.
///
/// Detection errors are logged and the loop keeps going. The loop only ends
/// if the dispatcher is gone (channel closed) or the detector panics.
pub fn spawn_watcher(
    watcher: Arc<Watcher>,
    detector: Box<dyn ChangeDetector>,
    jobs: JobSender,
) -> JoinHandle<()> {
    tokio::spawn(watch_loop(watcher, detector, jobs))
}

async fn watch_loop(watcher: Arc<Watcher>, mut detector: Box<dyn ChangeDetector>, jobs: JobSender) {
    info!(
        watcher = %watcher.name(),
        target = %watcher.target(),
        interval_ms = watcher.interval().as_millis() as u64,
        "watcher started"
    );

    let mut ticker = interval(watcher.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failing = false;

    loop {
        ticker.tick().await;

        // Scanning touches the filesystem; keep it off the async workers.
        let (returned, outcome) = match tokio::task::spawn_blocking(move || {
            let outcome = detector.check();
            (detector, outcome)
        })
        .await
        {
            Ok(pair) => pair,
            Err(e) => {
                error!(watcher = %watcher.name(), error = %e, "change detector panicked; watcher stopped");
                return;
            }
        };
        detector = returned;

        match outcome {
            Ok(None) => {
                if failing {
                    info!(watcher = %watcher.name(), "change detection recovered");
                    failing = false;
                }
            }
            Ok(Some(message)) => {
                failing = false;
                debug!(watcher = %watcher.name(), %message, "change detected; queueing job");

                let job = Job::new(Arc::clone(&watcher), message);
                if let Err(e) = jobs.send(job).await {
                    warn!(watcher = %watcher.name(), error = %e, "watcher stopped");
                    return;
                }
            }
            Err(e) => {
                let detail = format!("{e:#}");
                if failing {
                    debug!(watcher = %watcher.name(), error = %detail, "change detection still failing");
                } else {
                    warn!(watcher = %watcher.name(), error = %detail, "change detection failed");
                    failing = true;
                }
            }
        }
    }
}

/// Start one loop per configured watcher, all sharing `jobs`.
pub fn launch_watchers(
    ctx: &Context,
    jobs: &JobSender,
    fs: Arc<dyn FileSystem>,
) -> Result<Vec<JoinHandle<()>>> {
    let mut handles = Vec::with_capacity(ctx.watchers().len());

    for watcher in ctx.watchers() {
        let detector = detector_for(watcher.target(), Arc::clone(&fs))?;
        handles.push(spawn_watcher(Arc::clone(watcher), detector, jobs.clone()));
    }

    info!(count = handles.len(), "watchers launched");
    Ok(handles)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use anyhow::anyhow;
    use tokio::time::timeout;

    use super::*;
    use crate::context::WatchTarget;
    use crate::engine::job_channel;
    use crate::sink::MemorySink;

    /// Replays a fixed script of check results, then reports no change.
    struct Scripted(VecDeque<anyhow::Result<Option<String>>>);

    impl ChangeDetector for Scripted {
        fn check(&mut self) -> anyhow::Result<Option<String>> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    fn watcher(name: &str) -> Arc<Watcher> {
        Arc::new(Watcher::new(
            name,
            WatchTarget::directory("."),
            Duration::from_millis(5),
            Vec::new(),
            Arc::new(MemorySink::new()),
        ))
    }

    #[tokio::test]
    async fn errors_do_not_stop_the_loop() {
        let (tx, mut rx) = job_channel(4);
        let script = Scripted(VecDeque::from(vec![
            Err(anyhow!("permission denied")),
            Ok(None),
            Err(anyhow!("gone")),
            Ok(Some("detected change: modified a.txt".to_string())),
        ]));

        let handle = spawn_watcher(watcher("w"), Box::new(script), tx);

        let job = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("job expected")
            .expect("channel open");
        assert_eq!(job.message, "detected change: modified a.txt");
        assert_eq!(job.watcher.name(), "w");
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn loop_ends_when_dispatcher_is_gone() {
        let (tx, rx) = job_channel(1);
        drop(rx);
        let script = Scripted(VecDeque::from(vec![Ok(Some("x".to_string()))]));

        let handle = spawn_watcher(watcher("w"), Box::new(script), tx);
        timeout(Duration::from_secs(2), handle)
            .await
            .expect("watcher should stop")
            .unwrap();
    }
}
