// src/watch/poll.rs

//! Polling change detection.
//!
//! Each check walks the watcher's directory and compares every matching
//! file's `(mtime, len)` against the previous scan. The first successful
//! scan only records a baseline. With `use_hash`, a file whose metadata
//! changed only counts as modified if its content hash changed too.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::context::WatchTarget;
use crate::fs::{FileStat, FileSystem};
use crate::watch::detector::ChangeDetector;
use crate::watch::hash::compute_file_hash;
use crate::watch::patterns::{collect_matching_files, relative_path, TargetMatcher};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    stat: FileStat,
    hash: Option<String>,
}

type Snapshot = BTreeMap<PathBuf, Entry>;

/// One file-level difference between two scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
}

impl Change {
    fn verb(&self) -> &'static str {
        match self {
            Change::Created(_) => "created",
            Change::Modified(_) => "modified",
            Change::Removed(_) => "removed",
        }
    }

    fn path(&self) -> &Path {
        match self {
            Change::Created(p) | Change::Modified(p) | Change::Removed(p) => p,
        }
    }
}

#[derive(Debug)]
pub struct PollDetector {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    matcher: TargetMatcher,
    use_hash: bool,
    baseline: Option<Snapshot>,
}

impl PollDetector {
    pub fn new(target: &WatchTarget, fs: Arc<dyn FileSystem>) -> Result<Self> {
        Ok(Self {
            fs,
            root: target.directory.clone(),
            matcher: TargetMatcher::from_target(target)?,
            use_hash: target.use_hash,
            baseline: None,
        })
    }

    /// Whether a baseline scan has succeeded yet.
    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    fn scan(&self) -> Result<Snapshot> {
        if !self.fs.is_dir(&self.root) {
            anyhow::bail!("watch directory {:?} does not exist or is not a directory", self.root);
        }

        let files = collect_matching_files(self.fs.as_ref(), &self.root, &self.matcher)
            .with_context(|| format!("scanning {:?}", self.root))?;

        let mut snapshot = Snapshot::new();
        for path in files {
            let stat = self.fs.stat(&path)?;
            let hash = if self.use_hash {
                Some(self.hash_if_needed(&path, &stat)?)
            } else {
                None
            };
            snapshot.insert(path, Entry { stat, hash });
        }
        Ok(snapshot)
    }

    /// Reuse the previous hash when metadata is unchanged.
    fn hash_if_needed(&self, path: &Path, stat: &FileStat) -> Result<String> {
        if let Some(prev) = self.baseline.as_ref().and_then(|b| b.get(path)) {
            if prev.stat == *stat {
                if let Some(hash) = &prev.hash {
                    return Ok(hash.clone());
                }
            }
        }
        compute_file_hash(self.fs.as_ref(), path)
    }

    fn diff(&self, prev: &Snapshot, current: &Snapshot) -> Vec<Change> {
        let mut changes = Vec::new();

        for (path, entry) in current {
            match prev.get(path) {
                None => changes.push(Change::Created(path.clone())),
                Some(old) => {
                    let modified = if self.use_hash {
                        old.hash != entry.hash
                    } else {
                        old.stat != entry.stat
                    };
                    if modified {
                        changes.push(Change::Modified(path.clone()));
                    }
                }
            }
        }

        for path in prev.keys() {
            if !current.contains_key(path) {
                changes.push(Change::Removed(path.clone()));
            }
        }

        changes
    }

    fn describe(&self, changes: &[Change]) -> String {
        let first = &changes[0];
        let shown = relative_path(&self.root, first.path())
            .unwrap_or_else(|| first.path().display().to_string());
        let mut msg = format!("detected change: {} {}", first.verb(), shown);
        if changes.len() > 1 {
            msg.push_str(&format!(" (and {} more)", changes.len() - 1));
        }
        msg
    }
}

impl ChangeDetector for PollDetector {
    fn check(&mut self) -> Result<Option<String>> {
        let current = self.scan()?;

        let Some(prev) = self.baseline.take() else {
            debug!(root = ?self.root, files = current.len(), "recorded baseline snapshot");
            self.baseline = Some(current);
            return Ok(None);
        };

        let changes = self.diff(&prev, &current);
        self.baseline = Some(current);

        if changes.is_empty() {
            return Ok(None);
        }

        debug!(root = ?self.root, changes = changes.len(), "poll detected changes");
        Ok(Some(self.describe(&changes)))
    }
}
