use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;

use crate::config::Settings;
use crate::download::DownloadRequest;
use crate::stats::RunStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadFormat {
    /// Video merged into an MP4 container.
    #[default]
    MP4,
    /// Best audio transcoded to MP3.
    MP3,
}

/// Browsers the engine can read cookies from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Brave,
    Firefox,
    Chrome,
    Edge,
}

impl Browser {
    pub const ALL: [Browser; 4] = [Browser::Brave, Browser::Firefox, Browser::Chrome, Browser::Edge];

    pub fn as_str(self) -> &'static str {
        match self {
            Browser::Brave => "brave",
            Browser::Firefox => "firefox",
            Browser::Chrome => "chrome",
            Browser::Edge => "edge",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Active,
    Success,
    Error,
}

impl EntryStatus {
    pub fn glyph(self) -> &'static str {
        match self {
            EntryStatus::Active => "▶",
            EntryStatus::Success => "✓",
            EntryStatus::Error => "✗",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub text: String,
    pub status: EntryStatus,
    pub percent: Option<f32>,
}

impl HistoryEntry {
    pub fn new(text: impl Into<String>, status: EntryStatus) -> Self {
        Self {
            text: text.into(),
            status,
            percent: None,
        }
    }

    pub fn label(&self) -> String {
        match self.percent {
            Some(percent) if self.status == EntryStatus::Active => {
                format!("{} {} ({:.0}%)", self.status.glyph(), self.text, percent)
            }
            _ => format!("{} {}", self.status.glyph(), self.text),
        }
    }
}

/// Operations list, newest entry first. Row 0 is the run in progress.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn push_front(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
    }

    pub fn update_active(&mut self, title: &str, percent: f32) {
        if let Some(first) = self.entries.first_mut() {
            if !title.is_empty() {
                first.text = title.to_string();
            }
            first.status = EntryStatus::Active;
            first.percent = Some(percent);
        }
    }

    /// Saved files go just under the active row.
    pub fn insert_file(&mut self, file_name: impl Into<String>) {
        let at = usize::from(!self.entries.is_empty());
        self.entries
            .insert(at, HistoryEntry::new(file_name, EntryStatus::Success));
    }

    /// Re-files the active row at the top with its final status.
    pub fn finish_active(&mut self, status: EntryStatus) {
        if self.entries.is_empty() {
            return;
        }
        let mut entry = self.entries.remove(0);
        entry.status = status;
        entry.percent = None;
        self.entries.insert(0, entry);
    }
}

pub const MAX_SKIPPED_SHOWN: usize = 10;

pub struct AppState {
    pub url: String,
    pub format: DownloadFormat,
    pub max_height: u32,
    pub download_dir: String,
    pub ignore_archive: bool,
    pub cookies_path: Option<PathBuf>,
    pub cookies_browser: Option<Browser>,
    pub is_downloading: bool,
    pub stop_requested: bool,
    pub progress: f32,
    pub status: String,
    pub download_speed: String,
    pub eta: String,
    pub last_error: Option<String>,
    pub history: History,
    pub skipped: VecDeque<String>,
    pub stats: RunStats,
    pub last_request: Option<DownloadRequest>,
    pub error_report: Option<ErrorReport>,
    pub summary: Option<String>,
    pub browser_picker_open: bool,
}

/// Contents of the dismissable failure dialog.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: String,
    pub log_tail: String,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            url: String::new(),
            format: DownloadFormat::default(),
            max_height: settings.max_height,
            download_dir: settings.default_root.to_string_lossy().to_string(),
            ignore_archive: false,
            cookies_path: None,
            cookies_browser: None,
            is_downloading: false,
            stop_requested: false,
            progress: 0.0,
            status: String::new(),
            download_speed: String::new(),
            eta: String::new(),
            last_error: None,
            history: History::default(),
            skipped: VecDeque::new(),
            stats: RunStats::default(),
            last_request: None,
            error_report: None,
            summary: None,
            browser_picker_open: false,
        }
    }

    pub fn push_skipped(&mut self, reason: String) {
        self.skipped.push_front(reason);
        self.skipped.truncate(MAX_SKIPPED_SHOWN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_row_shows_percent() {
        let mut history = History::default();
        history.push_front(HistoryEntry::new("https://youtu.be/abc123", EntryStatus::Active));
        history.update_active("Some title", 42.4);
        assert_eq!(history.entries()[0].label(), "▶ Some title (42%)");
    }

    #[test]
    fn files_land_under_active_row() {
        let mut history = History::default();
        history.push_front(HistoryEntry::new("older", EntryStatus::Success));
        history.push_front(HistoryEntry::new("run", EntryStatus::Active));
        history.insert_file("001 - Video - a.mp4");
        history.insert_file("002 - Video - b.mp4");

        let labels: Vec<String> = history.entries().iter().map(HistoryEntry::label).collect();
        assert_eq!(
            labels,
            vec!["▶ run", "✓ 002 - Video - b.mp4", "✓ 001 - Video - a.mp4", "✓ older"]
        );
    }

    #[test]
    fn finishing_drops_percent() {
        let mut history = History::default();
        history.push_front(HistoryEntry::new("run", EntryStatus::Active));
        history.update_active("", 55.0);
        history.finish_active(EntryStatus::Error);
        assert_eq!(history.entries()[0].label(), "✗ run");
    }

    #[test]
    fn skipped_list_is_capped() {
        let mut state = AppState::new(&Settings::default());
        for i in 0..15 {
            state.push_skipped(format!("reason {}", i));
        }
        assert_eq!(state.skipped.len(), MAX_SKIPPED_SHOWN);
        assert_eq!(state.skipped.front().map(String::as_str), Some("reason 14"));
        assert_eq!(state.skipped.back().map(String::as_str), Some("reason 5"));
    }
}
