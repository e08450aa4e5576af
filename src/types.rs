use serde::Deserialize;

/// How a watcher decides that its target changed.
///
/// - `Poll`: walk the target directory every interval and compare file
///   metadata against the previous scan (default).
/// - `Notify`: subscribe to OS change notifications and report whatever
///   arrived since the previous interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DetectMode {
    #[default]
    Poll,
    Notify,
}

/// Where the stdout/stderr of executed commands goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Children write straight to this process's stdout/stderr.
    #[default]
    Inherit,
    /// Children are piped and each line is routed through the owning
    /// log sink, so it carries the watcher prefix.
    Prefixed,
}
