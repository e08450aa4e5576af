// src/watch/mod.rs

//! Change detection and the per-watcher loops.
//!
//! This module is responsible for:
//! - Compiling `watch` / `exclude` glob patterns per watcher.
//! - Deciding whether a target changed, either by polling file metadata
//!   ([`poll`]) or through OS notifications ([`native`]).
//! - Running one independent loop per watcher that turns a detected change
//!   into a [`crate::engine::Job`] on the shared channel ([`watcher`]).
//!
//! It does not run tasks; that is the dispatcher's job.

pub mod detector;
pub mod hash;
pub mod native;
pub mod patterns;
pub mod poll;
pub mod watcher;

pub use detector::{detector_for, ChangeDetector};
pub use hash::compute_file_hash;
pub use patterns::{collect_matching_files, TargetMatcher};
pub use poll::PollDetector;
pub use watcher::{launch_watchers, spawn_watcher};
