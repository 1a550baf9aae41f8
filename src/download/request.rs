use std::path::PathBuf;

use crate::config;
use crate::models::{Browser, DownloadFormat};

pub const MIN_HEIGHT: u32 = 144;
pub const MAX_HEIGHT: u32 = 2160;

/// Everything one worker run needs. Cloned into the worker thread and never
/// changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub url: String,
    pub format: DownloadFormat,
    pub root: PathBuf,
    pub max_height: u32,
    pub cookies_file: Option<PathBuf>,
    pub cookies_browser: Option<Browser>,
    pub ignore_archive: bool,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, format: DownloadFormat, root: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into().trim().to_string(),
            format,
            root: root.into(),
            max_height: config::DEFAULT_MAX_HEIGHT,
            cookies_file: None,
            cookies_browser: None,
            ignore_archive: false,
        }
    }

    pub fn max_height(mut self, height: u32) -> Self {
        self.max_height = height;
        self
    }

    pub fn ignore_archive(mut self, ignore: bool) -> Self {
        self.ignore_archive = ignore;
        self
    }

    pub fn cookies(mut self, file: Option<PathBuf>, browser: Option<Browser>) -> Self {
        self.cookies_file = file;
        self.cookies_browser = browser;
        self
    }

    /// Requested height clamped to the supported range.
    pub fn height_bound(&self) -> u32 {
        self.max_height.clamp(MIN_HEIGHT, MAX_HEIGHT)
    }

    pub fn archive_path(&self) -> PathBuf {
        config::archive_path(&self.root)
    }

    /// Same request with archive skipping forced on, used by resume.
    pub fn resumed(&self) -> Self {
        Self {
            ignore_archive: false,
            ..self.clone()
        }
    }
}
