// src/watch/native.rs

//! OS-notification change detection via `notify`.
//!
//! The notify callback runs on notify's own thread and only forwards events
//! into a channel. Each [`ChangeDetector::check`] drains whatever arrived
//! since the previous tick and reports it as a single change.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::context::WatchTarget;
use crate::watch::detector::ChangeDetector;
use crate::watch::patterns::{relative_path, TargetMatcher};

pub struct NotifyDetector {
    // Dropping the watcher ends the subscription.
    _inner: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    root: PathBuf,
    matcher: TargetMatcher,
}

impl std::fmt::Debug for NotifyDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyDetector")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl NotifyDetector {
    pub fn new(target: &WatchTarget) -> Result<Self> {
        let matcher = TargetMatcher::from_target(target)?;

        // Canonicalize so paths reported by notify share the prefix.
        let root = target
            .directory
            .canonicalize()
            .with_context(|| format!("resolving watch directory {:?}", target.directory))?;

        let (tx, rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                // Receiver gone means the detector was dropped.
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_context(|| format!("watching {:?}", root))?;

        info!("filesystem notifications enabled on {:?}", root);

        Ok(Self {
            _inner: watcher,
            events: rx,
            root,
            matcher,
        })
    }
}

impl ChangeDetector for NotifyDetector {
    fn check(&mut self) -> Result<Option<String>> {
        let mut changed = BTreeSet::new();
        let mut first_error = None;

        while let Ok(res) = self.events.try_recv() {
            match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_)) {
                        continue;
                    }
                    for path in event.paths {
                        if let Some(rel) = relative_path(&self.root, &path) {
                            if self.matcher.matches(&rel) {
                                changed.insert(rel);
                            }
                        }
                    }
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(first) = changed.iter().next() {
            debug!(root = ?self.root, files = changed.len(), "notify reported changes");
            let mut msg = format!("detected change: {first}");
            if changed.len() > 1 {
                msg.push_str(&format!(" (and {} more)", changed.len() - 1));
            }
            return Ok(Some(msg));
        }

        match first_error {
            Some(e) => Err(anyhow::Error::new(e).context("file watch error")),
            None => Ok(None),
        }
    }
}
