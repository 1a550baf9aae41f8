use log::Level;
use std::path::PathBuf;
use thiserror::Error;

use super::options::EngineConfig;
use crate::stats;

/// Substrings of an attempt error that earn one retry with another client.
const ACCESS_MARKERS: [&str; 4] = ["403", "Forbidden", "Sign in", "confirm your age"];

/// Private-video errors also mention signing in.
const PRIVATE_MARKER: &str = "Private video";

/// Substrings of an engine error record that mark a skipped entry.
const SKIP_MARKERS: [&str; 7] = [
    "[youtube]",
    "This video",
    "Private",
    "Members only",
    "No video formats",
    "HTTP Error 403",
    "Sign in",
];

pub fn is_access_restricted(message: &str) -> bool {
    !message.contains(PRIVATE_MARKER) && ACCESS_MARKERS.iter().any(|marker| message.contains(marker))
}

pub fn is_skip_message(message: &str) -> bool {
    SKIP_MARKERS.iter().any(|marker| message.contains(marker))
}

/// An error record about one entry that the engine skipped past. These do
/// not fail an attempt on their own.
pub fn is_item_failure(message: &str) -> bool {
    is_skip_message(message) && !is_access_restricted(message) && stats::item_id(message).is_some()
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Cancelled by user")]
    Cancelled,
    #[error("{0}")]
    Failed(String),
    #[error("failed to start the download engine: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Returned from a hook to make the engine abandon the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl From<Cancelled> for EngineError {
    fn from(_: Cancelled) -> Self {
        EngineError::Cancelled
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressStatus {
    Downloading { percent: f32, speed: String, eta: String },
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineProgress {
    pub status: ProgressStatus,
    pub title: String,
    pub filename: Option<PathBuf>,
}

/// Callbacks the engine makes while an attempt runs.
pub trait EngineHooks {
    fn on_progress(&mut self, progress: EngineProgress) -> Result<(), Cancelled>;

    fn on_log(&mut self, level: Level, message: &str);
}

/// External media engine. `download` blocks until the attempt ends.
pub trait Engine: Send + Sync {
    fn download(
        &self,
        url: &str,
        config: &EngineConfig,
        hooks: &mut dyn EngineHooks,
    ) -> Result<(), EngineError>;

    /// Directory of the transcoder the engine should use, if one is installed.
    fn transcoder(&self) -> Option<PathBuf>;
}
