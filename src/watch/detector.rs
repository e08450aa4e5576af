// src/watch/detector.rs

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::context::WatchTarget;
use crate::fs::FileSystem;
use crate::types::DetectMode;
use crate::watch::native::NotifyDetector;
use crate::watch::poll::PollDetector;

/// Decides, once per interval, whether a watcher's target changed.
///
/// `Ok(Some(message))` means "changed" and carries a human-readable
/// description that becomes the job message. `Err` is a detection error:
/// the watcher logs it and tries again on the next tick.
pub trait ChangeDetector: Send {
    fn check(&mut self) -> Result<Option<String>>;
}

/// Build the detector configured for `target`.
///
/// A notify detector that cannot be set up (e.g. the directory does not
/// exist yet) falls back to polling, which tolerates a missing directory.
pub fn detector_for(
    target: &WatchTarget,
    fs: Arc<dyn FileSystem>,
) -> Result<Box<dyn ChangeDetector>> {
    match target.detect {
        DetectMode::Poll => Ok(Box::new(PollDetector::new(target, fs)?)),
        DetectMode::Notify => match NotifyDetector::new(target) {
            Ok(d) => Ok(Box::new(d)),
            Err(e) => {
                warn!(
                    directory = ?target.directory,
                    error = %e,
                    "cannot subscribe to filesystem notifications; falling back to polling"
                );
                Ok(Box::new(PollDetector::new(target, fs)?))
            }
        },
    }
}
